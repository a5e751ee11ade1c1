use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use error_stack::{Report, ResultExt};

use crate::errors::{CodecError, ConfigError, EvmError, EvmResult};

/// ABI and creation bytecode of a compiled contract
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// The compiled output layouts we know how to read:
/// ape / ethPM (`deploymentBytecode.bytecode`), Foundry (`bytecode.object`)
/// and Hardhat or hand-written files (`bytecode` as a hex string).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompiledOutputJson {
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: Option<BytecodeJson>,
    deployment_bytecode: Option<EthPmBytecodeJson>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeJson {
    Hex(String),
    Foundry { object: String },
}

#[derive(Clone, Debug, Deserialize)]
struct EthPmBytecodeJson {
    bytecode: String,
}

impl ContractArtifact {
    pub fn from_json(fallback_name: &str, json: &str) -> EvmResult<Self> {
        let output: CompiledOutputJson = serde_json::from_str(json)
            .map_err(|e| Report::new(EvmError::Codec(CodecError::InvalidArtifact(e.to_string()))))
            .attach_printable(format!("Parsing compiled output of {}", fallback_name))?;

        let bytecode_hex = match (&output.deployment_bytecode, &output.bytecode) {
            (Some(ethpm), _) => ethpm.bytecode.as_str(),
            (None, Some(BytecodeJson::Hex(hex))) => hex.as_str(),
            (None, Some(BytecodeJson::Foundry { object })) => object.as_str(),
            (None, None) => {
                return Err(Report::new(EvmError::Codec(CodecError::InvalidArtifact(format!(
                    "{} has no creation bytecode",
                    fallback_name
                )))))
            }
        };

        let bytecode = alloy::hex::decode(bytecode_hex.trim())
            .map_err(|e| Report::new(EvmError::Codec(CodecError::InvalidHex(e.to_string()))))
            .attach_printable(format!(
                "Decoding creation bytecode of {} (unlinked libraries are not supported)",
                fallback_name
            ))?;
        if bytecode.is_empty() {
            return Err(Report::new(EvmError::Codec(CodecError::InvalidArtifact(format!(
                "{} has empty creation bytecode (abstract contract or interface?)",
                fallback_name
            )))));
        }

        Ok(Self {
            name: output.contract_name.unwrap_or_else(|| fallback_name.to_string()),
            abi: output.abi,
            bytecode: bytecode.into(),
        })
    }

    pub fn from_file(path: &Path) -> EvmResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Report::new(EvmError::Config(ConfigError::FileNotFound(format!(
                "{}: {}",
                path.display(),
                e
            ))))
        })?;
        let fallback_name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("contract");
        Self::from_json(fallback_name, &json)
    }

    /// Loads `<dir>/<contract_name>.json`
    pub fn load(dir: &Path, contract_name: &str) -> EvmResult<Self> {
        let mut path = PathBuf::from(dir);
        path.push(format!("{}.json", contract_name));
        Self::from_file(&path)
    }
}
