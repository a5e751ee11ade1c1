mod deployer;
mod handle;

pub use deployer::{Deployer, TransactionSettings};
pub use handle::ContractHandle;
