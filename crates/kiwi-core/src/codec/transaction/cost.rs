use crate::constants::GAS_LIMIT_BUFFER_PERCENT;
use crate::errors::{CodecError, EvmError, EvmResult, TransactionError};
use crate::rpc::EvmRpc;

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use alloy::rpc::types::TransactionRequest;
use error_stack::{Report, ResultExt};

/// An explicit `gas_limit` is used as is. Otherwise the node estimates the
/// request and a buffer is added on top. When the estimate fails because the
/// call would revert, the revert (with its reason, if any) is returned.
pub async fn set_gas_limit(
    rpc: &EvmRpc,
    mut tx: TransactionRequest,
    gas_limit: Option<u64>,
) -> EvmResult<TransactionRequest> {
    if let Some(gas_limit) = gas_limit {
        tx.gas = Some(gas_limit);
        return Ok(tx);
    }

    let estimate = match rpc.estimate_gas(&tx).await {
        Ok(estimate) => estimate,
        Err(estimate_err) => {
            if estimate_err.current_context().is_revert() {
                return Err(estimate_err.attach_printable("Gas estimation failed"));
            }
            // some nodes only report the revert reason through eth_call
            return match rpc.call(&tx).await {
                Err(call_err) if call_err.current_context().is_revert() => {
                    Err(call_err.attach_printable("Gas estimation failed"))
                }
                Ok(res) => Err(estimate_err
                    .attach_printable(format!("Simulation result: 0x{}", alloy::hex::encode(res)))
                    .attach_printable("Gas estimation failed")),
                Err(e) => Err(estimate_err
                    .attach_printable(format!("Failed to simulate transaction: {}", e))
                    .attach_printable("Gas estimation failed")),
            };
        }
    };

    let buffered_gas =
        estimate.saturating_mul(100 + GAS_LIMIT_BUFFER_PERCENT).saturating_div(100);
    tx.gas = Some(buffered_gas);
    Ok(tx)
}

/// Upper bound of what the sender pays: gas limit times the (max) gas price,
/// plus the transferred value. Returned in wei and formatted in ether.
pub fn transaction_cost(tx: &TransactionRequest) -> EvmResult<(u128, String)> {
    let gas_limit = tx.gas.ok_or_else(|| {
        Report::new(EvmError::Transaction(TransactionError::MissingField("gas_limit")))
    })?;
    let gas_price = tx.gas_price.or(tx.max_fee_per_gas).ok_or_else(|| {
        Report::new(EvmError::Transaction(TransactionError::MissingField("gas_price")))
    })?;
    let value = tx.value.unwrap_or_default();

    let total_cost = U256::from(gas_price)
        .saturating_mul(U256::from(gas_limit))
        .saturating_add(value);

    let cost_string = format_units(total_cost, "ether")
        .map_err(|e| {
            Report::new(EvmError::Codec(CodecError::InvalidType {
                expected: "wei amount".to_string(),
                received: e.to_string(),
            }))
        })
        .attach_printable("Formatting transaction cost")?;

    Ok((total_cost.saturating_to::<u128>(), cost_string))
}
