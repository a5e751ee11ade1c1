use alloy::hex;
use alloy::primitives::utils::format_units;
use alloy::primitives::TxKind;
use alloy::rpc::types::TransactionRequest;
use serde_json::{json, Map, Value as JsonValue};

/// Summary of an unsigned request, printed before it is signed
pub fn format_transaction_for_display(tx: &TransactionRequest) -> JsonValue {
    let mut res = Map::new();
    let kind = match tx.to {
        Some(TxKind::Call(address)) => format!("to:{}", address),
        Some(TxKind::Create) | None => "create".to_string(),
    };
    res.insert("kind".into(), json!(kind));
    if let Some(from) = tx.from {
        res.insert("from".into(), json!(from.to_string()));
    }
    if let Some(nonce) = tx.nonce {
        res.insert("nonce".into(), json!(nonce));
    }
    if let Some(gas) = tx.gas {
        res.insert("gas_limit".into(), json!(gas));
    }
    if let Some(chain_id) = tx.chain_id {
        res.insert("chain_id".into(), json!(chain_id));
    }
    let value = tx.value.unwrap_or_default();
    let value = format_units(value, "ether").unwrap_or_else(|_| value.to_string());
    res.insert("value".into(), json!(value));

    if let Some(gas_price) = tx.gas_price {
        res.insert("type".into(), json!("legacy"));
        res.insert("gas_price".into(), json!(gas_price.to_string()));
    } else {
        res.insert("type".into(), json!("EIP-1559"));
        if let Some(max_fee) = tx.max_fee_per_gas {
            res.insert("max_fee_per_gas".into(), json!(max_fee.to_string()));
        }
        if let Some(priority) = tx.max_priority_fee_per_gas {
            res.insert("max_priority_fee_per_gas".into(), json!(priority.to_string()));
        }
    }

    let input = tx.input.input().map(|bytes| bytes.len()).unwrap_or(0);
    res.insert("input_bytes".into(), json!(input));
    if let Some(input) = tx.input.input().filter(|bytes| bytes.len() >= 4) {
        if tx.to != Some(TxKind::Create) {
            res.insert("selector".into(), json!(format!("0x{}", hex::encode(&input[..4]))));
        }
    }
    JsonValue::Object(res)
}
