use crate::codec::transaction::{build_call, transaction_cost, CommonTransactionFields};
use crate::errors::{EvmError, TransactionError};
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;

#[test]
fn test_legacy_cost_includes_value() {
    let fields = CommonTransactionFields {
        from: Some(Address::ZERO),
        nonce: Some(0),
        chain_id: Some(97),
        value: U256::from(1_000_000_000_000_000u64),
        gas_limit: Some(1_219_695),
        gas_price: Some(10_000_000_000),
        ..Default::default()
    };
    let tx = build_call(Address::ZERO, Bytes::new(), &fields).unwrap();
    let (wei, formatted) = transaction_cost(&tx).unwrap();
    assert_eq!(wei, 1_219_695u128 * 10_000_000_000 + 1_000_000_000_000_000);
    assert_eq!(formatted, "0.013196950000000000");
}

#[test]
fn test_cost_needs_gas_fields() {
    let err = transaction_cost(&TransactionRequest::default()).unwrap_err();
    assert!(matches!(
        err.current_context(),
        EvmError::Transaction(TransactionError::MissingField("gas_limit"))
    ));
}
