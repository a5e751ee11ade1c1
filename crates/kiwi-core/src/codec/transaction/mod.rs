pub mod builder;
pub mod cost;
pub mod eip1559;
pub mod legacy;
pub mod types;

pub use builder::{
    build_call, build_deployment, default_priority_fee, fill_transaction_fields,
    max_fee_from_base_fee,
};
pub use cost::{set_gas_limit, transaction_cost};
pub use types::{CommonTransactionFields, FeeFields, FilledTransactionFields, TransactionType};
