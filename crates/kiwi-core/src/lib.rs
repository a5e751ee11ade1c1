#[macro_use]
extern crate serde_derive;

pub mod codec;
pub mod constants;
pub mod contract;
#[macro_use]
pub mod errors;
pub mod manifest;
pub mod permit;
pub mod rpc;
pub mod signers;

pub use contract::{ContractHandle, Deployer, TransactionSettings};
pub use errors::{EvmError, EvmResult};
pub use rpc::{EvmRpc, Receipt};
