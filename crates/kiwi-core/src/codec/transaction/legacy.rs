use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;

use super::types::FilledTransactionFields;

/// Legacy (`gasPrice`) request. `to == None` means contract creation and
/// `input` then holds the init code.
pub fn build_unsigned_legacy_transaction(
    fields: &FilledTransactionFields,
    gas_price: u128,
    to: Option<Address>,
    input: Bytes,
) -> TransactionRequest {
    let mut tx = TransactionRequest::default()
        .with_from(fields.from)
        .with_value(fields.value)
        .with_nonce(fields.nonce)
        .with_chain_id(fields.chain_id)
        .with_gas_limit(fields.gas_limit)
        .with_gas_price(gas_price);

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
