use std::path::PathBuf;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, U256};
use error_stack::{Report, ResultExt};
use kiwi_core::codec::ContractArtifact;
use kiwi_core::permit::{permit_domain, sign_permit, Permit};
use kiwi_core::{ContractHandle, EvmResult, EvmRpc};
use tokio::sync::{Mutex, OnceCell};

use crate::accounts::{anvil_accounts, TestAccount};
use crate::anvil::{AnvilInstance, ANVIL_ACCOUNTS};
use crate::{address, uint, HarnessError, HarnessResult};

/// Directory holding `Token.json`, `Crowdsale.json`, `Roulette.json` and `Sport.json`
pub const ARTIFACTS_DIR_ENV: &str = "KIWI_ARTIFACTS_DIR";
/// Use an already running node instead of spawning anvil
pub const RPC_URL_ENV: &str = "KIWI_TEST_RPC_URL";

const TOKEN_TX_FEE: u64 = 1;
const TOKEN_BURN_FEE: u64 = 1;
const CROWDSALE_RATE: u64 = 1;

static SESSION: OnceCell<KiwiSession> = OnceCell::const_new();

/// Contracts deployed once per test binary.
///
/// Only plain data is shared: every test builds its own [EvmRpc] through
/// [KiwiSession::isolate], since each `#[tokio::test]` runs its own runtime.
#[derive(Debug)]
pub struct KiwiSession {
    pub url: String,
    pub chain_id: u64,
    pub accounts: Vec<TestAccount>,
    pub owner: TestAccount,
    pub receiver: TestAccount,
    pub feeaddress: TestAccount,
    pub wallet: TestAccount,
    pub token: ContractHandle,
    pub crowdsale: ContractHandle,
    pub roulette: ContractHandle,
    pub sport: ContractHandle,
    snapshot: Mutex<U256>,
    // statics are never dropped, so a spawned node lives as long as the test process
    _node: Option<AnvilInstance>,
}

/// The shared session, deploying the fixture graph on first use
pub async fn session() -> HarnessResult<&'static KiwiSession> {
    SESSION.get_or_try_init(KiwiSession::start).await
}

pub fn artifacts_dir() -> PathBuf {
    match std::env::var(ARTIFACTS_DIR_ENV) {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../contracts/.build"),
    }
}

impl KiwiSession {
    async fn start() -> HarnessResult<Self> {
        let (node, url) = match std::env::var(RPC_URL_ENV) {
            Ok(url) => (None, url),
            Err(_) => {
                let node = AnvilInstance::spawn()?;
                let url = node.url.clone();
                (Some(node), url)
            }
        };

        let rpc = EvmRpc::connect(&url).await.change_context(HarnessError::Node(url.clone()))?;
        let chain_id = rpc.get_chain_id().await.change_context(HarnessError::Node(url.clone()))?;
        let accounts =
            anvil_accounts(ANVIL_ACCOUNTS).change_context(HarnessError::Node(url.clone()))?;
        let owner = accounts[0].clone();
        let receiver = accounts[1].clone();
        let feeaddress = accounts[2].clone();
        let wallet = accounts[5].clone();

        let token = deploy(
            &rpc,
            &owner,
            "Token",
            &[uint(TOKEN_TX_FEE), uint(TOKEN_BURN_FEE), address(feeaddress.address)],
        )
        .await?;
        let crowdsale = deploy(
            &rpc,
            &owner,
            "Crowdsale",
            &[address(token.address), address(wallet.address), uint(CROWDSALE_RATE)],
        )
        .await?;
        let roulette = deploy(&rpc, &wallet, "Roulette", &[address(token.address)]).await?;
        let sport = deploy(&rpc, &wallet, "Sport", &[address(token.address)]).await?;

        let snapshot = rpc.snapshot().await.change_context(HarnessError::Node(url.clone()))?;

        Ok(Self {
            url,
            chain_id,
            accounts,
            owner,
            receiver,
            feeaddress,
            wallet,
            token,
            crowdsale,
            roulette,
            sport,
            snapshot: Mutex::new(snapshot),
            _node: node,
        })
    }

    /// Rewinds the chain to the state right after deployment and returns a
    /// client for the calling test.
    pub async fn isolate(&self) -> HarnessResult<EvmRpc> {
        let rpc = self.rpc()?;
        let mut snapshot = self.snapshot.lock().await;
        let restored = rpc
            .revert_to(*snapshot)
            .await
            .change_context(HarnessError::Snapshot(*snapshot))?;
        if !restored {
            return Err(Report::new(HarnessError::Snapshot(*snapshot)));
        }
        // evm_revert consumes the snapshot
        *snapshot = rpc.snapshot().await.change_context(HarnessError::Node(self.url.clone()))?;
        Ok(rpc)
    }

    pub fn rpc(&self) -> HarnessResult<EvmRpc> {
        EvmRpc::new(&self.url).change_context(HarnessError::Node(self.url.clone()))
    }

    pub fn account(&self, index: usize) -> &TestAccount {
        &self.accounts[index]
    }

    /// Signs a token permit from `owner` using the owner's current nonce
    pub async fn sign_permit(
        &self,
        rpc: &EvmRpc,
        owner: &TestAccount,
        spender: Address,
        value: U256,
        deadline: U256,
    ) -> EvmResult<Bytes> {
        let nonce = call_uint(rpc, &self.token, "nonces", &[address(owner.address)]).await?;
        let permit = Permit { owner: owner.address, spender, value, nonce, deadline };
        sign_permit(&permit, &permit_domain(self.chain_id, self.token.address), &owner.secret_key)
    }

    /// A permit deadline `seconds` after the pending block
    pub async fn deadline_in(&self, rpc: &EvmRpc, seconds: u64) -> EvmResult<U256> {
        Ok(U256::from(rpc.pending_timestamp().await? + seconds))
    }
}

async fn deploy(
    rpc: &EvmRpc,
    from: &TestAccount,
    contract_name: &str,
    args: &[DynSolValue],
) -> HarnessResult<ContractHandle> {
    let artifact = ContractArtifact::load(&artifacts_dir(), contract_name)
        .change_context(HarnessError::Artifact(contract_name.to_string()))?;
    let deployer = from
        .deployer(rpc.clone())
        .change_context(HarnessError::Deployment(contract_name.to_string()))?;
    let (contract, _) = deployer
        .deploy(&artifact, args)
        .await
        .change_context(HarnessError::Deployment(contract_name.to_string()))?;
    Ok(contract)
}

pub async fn call_uint(
    rpc: &EvmRpc,
    contract: &ContractHandle,
    method: &str,
    args: &[DynSolValue],
) -> EvmResult<U256> {
    let value = contract.call_one(rpc, method, args).await?;
    value.as_uint().map(|(v, _)| v).ok_or_else(|| unexpected_output(contract, method, &value))
}

pub async fn call_address(
    rpc: &EvmRpc,
    contract: &ContractHandle,
    method: &str,
    args: &[DynSolValue],
) -> EvmResult<Address> {
    let value = contract.call_one(rpc, method, args).await?;
    value.as_address().ok_or_else(|| unexpected_output(contract, method, &value))
}

pub async fn call_bool(
    rpc: &EvmRpc,
    contract: &ContractHandle,
    method: &str,
    args: &[DynSolValue],
) -> EvmResult<bool> {
    let value = contract.call_one(rpc, method, args).await?;
    value.as_bool().ok_or_else(|| unexpected_output(contract, method, &value))
}

pub async fn call_string(
    rpc: &EvmRpc,
    contract: &ContractHandle,
    method: &str,
    args: &[DynSolValue],
) -> EvmResult<String> {
    let value = contract.call_one(rpc, method, args).await?;
    value.as_str().map(str::to_string).ok_or_else(|| unexpected_output(contract, method, &value))
}

fn unexpected_output(
    contract: &ContractHandle,
    method: &str,
    value: &DynSolValue,
) -> Report<kiwi_core::EvmError> {
    Report::new(kiwi_core::EvmError::Codec(kiwi_core::errors::CodecError::AbiDecodingFailed(
        format!("{}.{} returned {:?}", contract.name, method, value),
    )))
}
