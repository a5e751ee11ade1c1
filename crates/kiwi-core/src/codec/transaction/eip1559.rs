use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;

use super::types::FilledTransactionFields;

pub fn build_unsigned_eip1559_transaction(
    fields: &FilledTransactionFields,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    to: Option<Address>,
    input: Bytes,
) -> TransactionRequest {
    let mut tx = TransactionRequest::default()
        .with_from(fields.from)
        .with_value(fields.value)
        .with_nonce(fields.nonce)
        .with_chain_id(fields.chain_id)
        .with_gas_limit(fields.gas_limit)
        .with_max_fee_per_gas(max_fee_per_gas)
        .with_max_priority_fee_per_gas(max_priority_fee_per_gas);

    match to {
        Some(to) => {
            tx = tx.with_to(to);
            if !input.is_empty() {
                tx = tx.with_input(input);
            }
        }
        None => tx = tx.with_deploy_code(input),
    }
    tx
}
