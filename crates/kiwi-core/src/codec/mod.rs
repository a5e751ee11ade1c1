pub mod abi;
pub mod artifacts;
pub mod conversion;
pub mod crypto;
pub mod display;
pub mod transaction;

#[cfg(test)]
mod tests;

pub use abi::{abi_decode_logs, encode_function_call, value_to_abi_constructor_args, DecodedEvent};
pub use artifacts::ContractArtifact;
pub use conversion::string_to_address;
pub use display::format_transaction_for_display;
pub use transaction::{CommonTransactionFields, TransactionType};
