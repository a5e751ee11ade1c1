use alloy::primitives::Address;
use error_stack::ResultExt;
use kiwi_core::signers::{mnemonic_to_secret_key, secret_key_to_address, SecretKey, SecretSource};
use kiwi_core::{Deployer, EvmResult, EvmRpc};

/// Mnemonic anvil and hardhat fund by default. Only ever holds test ether.
pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// A funded account of the local node
#[derive(Clone, Debug)]
pub struct TestAccount {
    pub index: u32,
    pub address: Address,
    pub secret_key: SecretKey,
}

impl TestAccount {
    pub fn from_mnemonic(mnemonic: &str, index: u32) -> EvmResult<Self> {
        let secret_key = mnemonic_to_secret_key(mnemonic, index)
            .attach_printable(format!("Deriving test account {}", index))?;
        let address = secret_key_to_address(&secret_key)?;
        Ok(Self { index, address, secret_key })
    }

    /// The `index`-th account anvil funds at startup
    pub fn anvil(index: u32) -> EvmResult<Self> {
        Self::from_mnemonic(TEST_MNEMONIC, index)
    }

    pub fn secret_source(&self) -> SecretSource {
        SecretSource::Literal(alloy::hex::encode_prefixed(self.secret_key.as_bytes()))
    }

    /// A deployer sending from this account
    pub fn deployer(&self, rpc: EvmRpc) -> EvmResult<Deployer> {
        Deployer::new(rpc, self.secret_source())
    }
}

pub fn anvil_accounts(count: u32) -> EvmResult<Vec<TestAccount>> {
    (0..count).map(TestAccount::anvil).collect()
}
