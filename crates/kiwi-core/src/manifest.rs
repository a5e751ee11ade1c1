//! `kiwi.yml`: where to deploy, as whom, and what.
//!
//! ```yaml
//! name: kiwi
//! environments:
//!   testnet:
//!     rpc_api_url: https://data-seed-prebsc-1-s1.binance.org:8545/
//!     chain_id: 97
//!     secret_key_env: KIWI_SECRET_KEY
//!     gas_limit: 1219695
//!     gas_price_gwei: 10
//! deployments:
//!   crowdsale:
//!     artifact: contracts/Crowdsale.json
//!     constructor_args: ["0xac1b...", "0x11d6...", 1]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::Address;
use error_stack::{Report, ResultExt};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::codec::conversion::{gwei_to_wei, string_to_address};
use crate::codec::transaction::TransactionType;
use crate::constants::{
    DEFAULT_ENVIRONMENT, DEFAULT_RECEIPT_TIMEOUT_SECS, DEFAULT_SECRET_KEY_ENV, ENVIRONMENT_ENV,
};
use crate::contract::TransactionSettings;
use crate::errors::{ConfigError, EvmError, EvmResult};
use crate::signers::SecretSource;

#[derive(Clone, Debug, Deserialize)]
pub struct KiwiManifest {
    pub name: String,
    #[serde(default)]
    pub environments: IndexMap<String, EnvironmentConfig>,
    #[serde(default)]
    pub deployments: IndexMap<String, DeploymentConfig>,
    #[serde(skip)]
    pub location: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EnvironmentConfig {
    pub rpc_api_url: String,
    pub chain_id: Option<u64>,
    /// When set, the secret key must belong to this address
    pub sender: Option<String>,
    #[serde(default = "default_secret_key_env")]
    pub secret_key_env: String,
    pub gas_limit: Option<u64>,
    pub gas_price_gwei: Option<u64>,
    #[serde(default)]
    pub tx_type: TransactionType,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeploymentConfig {
    pub artifact: String,
    /// Large integers must be quoted, YAML numbers are limited to 64 bits
    #[serde(default)]
    pub constructor_args: Vec<JsonValue>,
}

fn default_secret_key_env() -> String {
    DEFAULT_SECRET_KEY_ENV.to_string()
}

fn default_receipt_timeout_secs() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_SECS
}

impl KiwiManifest {
    pub fn from_yaml(content: &str) -> EvmResult<Self> {
        serde_yml::from_str(content).map_err(|e| {
            Report::new(EvmError::Config(ConfigError::ParseFailed(format!(
                "kiwi.yml file malformatted: {}",
                e
            ))))
        })
    }

    pub fn from_path(path: &Path) -> EvmResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Report::new(EvmError::Config(ConfigError::FileNotFound(format!(
                "{}: {}",
                path.display(),
                e
            ))))
        })?;
        let mut manifest = Self::from_yaml(&content)
            .attach_printable(format!("Reading manifest {}", path.display()))?;
        manifest.location = Some(path.to_path_buf());
        Ok(manifest)
    }

    fn base_dir(&self) -> PathBuf {
        self.location
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Loads `.env` next to the manifest, falling back to the usual lookup
    /// from the current directory. Variables already set are kept.
    pub fn load_dotenv(&self) {
        let local = self.base_dir().join(".env");
        if local.is_file() {
            let _ = dotenvy::from_path(&local);
        } else {
            let _ = dotenvy::dotenv();
        }
    }

    /// `selector`, else `$KIWI_ENV`, else the only environment, else `default`
    pub fn select_environment(
        &self,
        selector: Option<&str>,
    ) -> EvmResult<(String, &EnvironmentConfig)> {
        let from_env = std::env::var(ENVIRONMENT_ENV).ok();
        self.select_environment_with(selector, from_env.as_deref())
    }

    fn select_environment_with(
        &self,
        selector: Option<&str>,
        from_env: Option<&str>,
    ) -> EvmResult<(String, &EnvironmentConfig)> {
        let name = match (selector, from_env) {
            (Some(name), _) => name.to_string(),
            (None, Some(name)) if !name.is_empty() => name.to_string(),
            _ if self.environments.len() == 1 => {
                self.environments.keys().next().cloned().unwrap_or_default()
            }
            _ => DEFAULT_ENVIRONMENT.to_string(),
        };
        let config = self.environments.get(&name).ok_or_else(|| {
            let known: Vec<&str> = self.environments.keys().map(String::as_str).collect();
            Report::new(EvmError::Config(ConfigError::MissingField(format!(
                "environments.{}",
                name
            ))))
            .attach_printable(format!("environment '{}' unknown from manifest", name))
            .attach_printable(format!("Available environments: {}", known.join(", ")))
        })?;
        Ok((name, config))
    }

    /// The named deployment, or the first one listed
    pub fn get_deployment(&self, name: Option<&str>) -> EvmResult<(String, &DeploymentConfig)> {
        let found = match name {
            Some(name) => self.deployments.get_key_value(name),
            None => self.deployments.first(),
        };
        found.map(|(k, v)| (k.clone(), v)).ok_or_else(|| {
            Report::new(EvmError::Config(ConfigError::MissingField(format!(
                "deployments.{}",
                name.unwrap_or("<first>")
            ))))
        })
    }

    /// Artifact paths are relative to the manifest
    pub fn artifact_path(&self, deployment: &DeploymentConfig) -> PathBuf {
        let path = Path::new(&deployment.artifact);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }
}

impl EnvironmentConfig {
    pub fn secret_source(&self) -> SecretSource {
        SecretSource::Env(self.secret_key_env.clone())
    }

    pub fn expected_sender(&self) -> EvmResult<Option<Address>> {
        self.sender
            .as_deref()
            .map(|sender| string_to_address(sender).attach_printable("Reading 'sender'"))
            .transpose()
    }

    pub fn transaction_settings(&self) -> EvmResult<TransactionSettings> {
        let gas_price = self
            .gas_price_gwei
            .map(|gwei| gwei_to_wei("gas_price_gwei", gwei))
            .transpose()?;
        let (gas_price, max_fee_per_gas) = match self.tx_type.effective() {
            TransactionType::Legacy => (gas_price, None),
            _ => (None, gas_price),
        };
        Ok(TransactionSettings {
            tx_type: self.tx_type,
            chain_id: self.chain_id,
            gas_limit: self.gas_limit,
            gas_price,
            max_fee_per_gas,
            max_priority_fee_per_gas: None,
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
        })
    }
}
