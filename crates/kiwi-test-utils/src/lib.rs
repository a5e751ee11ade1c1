//! Test harness for the KIWI contracts: a throwaway anvil node, the
//! deployed fixture graph shared by a test binary, and assertions on
//! reverts and decoded events.

pub mod accounts;
pub mod anvil;
pub mod assertions;
pub mod events;
pub mod fixtures;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};

pub use accounts::{TestAccount, TEST_MNEMONIC};
pub use anvil::AnvilInstance;
pub use assertions::{assert_reverts, assert_reverts_with, FeeSchedule};
pub use events::assert_event;
pub use fixtures::{session, KiwiSession};

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("anvil is not installed; install Foundry to run the integration suites")]
    AnvilNotFound,
    #[error("failed to start anvil: {0}")]
    SpawnFailed(String),
    #[error("anvil did not accept connections on port {0}")]
    NotReady(u16),
    #[error("node at {0} is unusable")]
    Node(String),
    #[error("could not load artifact {0}")]
    Artifact(String),
    #[error("deployment of {0} failed")]
    Deployment(String),
    #[error("snapshot {0} could not be restored")]
    Snapshot(U256),
}

pub type HarnessResult<T> = Result<T, error_stack::Report<HarnessError>>;

pub fn uint(value: u64) -> DynSolValue {
    DynSolValue::Uint(U256::from(value), 256)
}

pub fn address(value: Address) -> DynSolValue {
    DynSolValue::Address(value)
}
