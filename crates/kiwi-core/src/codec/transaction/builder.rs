use super::cost::set_gas_limit;
use super::eip1559::build_unsigned_eip1559_transaction;
use super::legacy::build_unsigned_legacy_transaction;
use super::types::{CommonTransactionFields, FeeFields, TransactionType};

use crate::codec::abi::encode_constructor_args;
use crate::constants::DEFAULT_PRIORITY_FEE_PER_GAS;
use crate::errors::{CodecError, EvmError, EvmResult, TransactionContext, TransactionError};
use crate::rpc::EvmRpc;

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::Constructor;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use error_stack::{Report, ResultExt};

/// Builds a contract creation request: `bytecode ‖ abi.encode(constructor_args)`.
pub fn build_deployment(
    bytecode: &[u8],
    constructor: Option<&Constructor>,
    constructor_args: &[DynSolValue],
    fields: &CommonTransactionFields,
) -> EvmResult<TransactionRequest> {
    if bytecode.is_empty() {
        return Err(Report::new(EvmError::Codec(CodecError::InvalidArtifact(
            "creation bytecode is empty".to_string(),
        ))));
    }
    let encoded_args = encode_constructor_args(constructor, constructor_args)?;

    let mut init_code = Vec::with_capacity(bytecode.len() + encoded_args.len());
    init_code.extend_from_slice(bytecode);
    init_code.extend_from_slice(&encoded_args);

    build_unsigned_transaction(None, init_code.into(), fields)
        .attach_printable("Building deployment transaction")
}

/// Builds a call to `contract_address` carrying already encoded `input`.
/// The transferred value comes from `fields.value`.
pub fn build_call(
    contract_address: Address,
    input: Bytes,
    fields: &CommonTransactionFields,
) -> EvmResult<TransactionRequest> {
    build_unsigned_transaction(Some(contract_address), input, fields)
        .attach_printable(format!("Building call to {}", contract_address))
}

fn build_unsigned_transaction(
    to: Option<Address>,
    input: Bytes,
    fields: &CommonTransactionFields,
) -> EvmResult<TransactionRequest> {
    let tx_context = TransactionContext {
        tx_hash: None,
        from: fields.from,
        to,
        value: Some(fields.value.saturating_to::<u128>()),
        gas_limit: fields.gas_limit,
        chain_id: fields.chain_id,
    };
    let filled = fields.require_filled().attach(tx_context)?;

    let tx = match filled.fees {
        FeeFields::Legacy { gas_price } => {
            build_unsigned_legacy_transaction(&filled, gas_price, to, input)
        }
        FeeFields::Eip1559 { max_fee_per_gas, max_priority_fee_per_gas } => {
            build_unsigned_eip1559_transaction(
                &filled,
                max_fee_per_gas,
                max_priority_fee_per_gas,
                to,
                input,
            )
        }
    };
    Ok(tx)
}

/// `2 * base_fee + priority_fee`, leaving room for the base fee to double
pub fn max_fee_from_base_fee(base_fee: u128, priority_fee: u128) -> EvmResult<u128> {
    base_fee.checked_mul(2).and_then(|fee| fee.checked_add(priority_fee)).ok_or_else(|| {
        Report::new(EvmError::Transaction(TransactionError::InvalidFees(format!(
            "max fee overflows for base fee {} and priority fee {}",
            base_fee, priority_fee
        ))))
    })
}

/// The default priority fee, capped at `max_fee`
pub fn default_priority_fee(max_fee: u128) -> u128 {
    DEFAULT_PRIORITY_FEE_PER_GAS.min(max_fee)
}

/// Returns a copy of `fields` with nonce, chain id, fees and gas limit
/// fetched from the node where they were not set explicitly.
pub async fn fill_transaction_fields(
    rpc: &EvmRpc,
    fields: &CommonTransactionFields,
    to: Option<Address>,
    input: &Bytes,
) -> EvmResult<CommonTransactionFields> {
    let mut filled = fields.clone();
    let from = fields.from.ok_or_else(|| {
        Report::new(EvmError::Transaction(TransactionError::MissingField("from")))
    })?;

    if fields.tx_type == TransactionType::Eip4844 {
        return Err(Report::new(EvmError::Transaction(TransactionError::InvalidType(
            "Transaction type EIP-4844 not yet supported".to_string(),
        ))));
    }

    if filled.nonce.is_none() {
        filled.nonce = Some(
            rpc.get_nonce(&from)
                .await
                .attach_printable(format!("Fetching nonce for address {}", from))?,
        );
    }
    if filled.chain_id.is_none() {
        filled.chain_id = Some(rpc.get_chain_id().await?);
    }

    match fields.tx_type.effective() {
        TransactionType::Eip1559 => {
            let max_fee = match fields.max_fee_per_gas {
                Some(max_fee) => max_fee,
                None => {
                    let base_fee = rpc
                        .get_base_fee_per_gas()
                        .await
                        .attach_printable("Fetching current base fee")?;
                    max_fee_from_base_fee(
                        base_fee,
                        fields.max_priority_fee_per_gas.unwrap_or(DEFAULT_PRIORITY_FEE_PER_GAS),
                    )?
                }
            };
            filled.max_fee_per_gas = Some(max_fee);
            filled.max_priority_fee_per_gas = Some(
                fields.max_priority_fee_per_gas.unwrap_or_else(|| default_priority_fee(max_fee)),
            );
        }
        _ => {
            if filled.gas_price.is_none() {
                filled.gas_price = Some(
                    rpc.get_gas_price()
                        .await
                        .attach_printable("Fetching current gas price from network")?,
                );
            }
        }
    }

    // the estimate runs against the otherwise complete request
    if filled.gas_limit.is_none() {
        let mut draft = TransactionRequest::default()
            .with_from(from)
            .with_value(filled.value);
        draft = match to {
            Some(to) => draft.with_to(to).with_input(input.clone()),
            None => draft.with_deploy_code(input.clone()),
        };
        let draft = set_gas_limit(rpc, draft, None).await?;
        filled.gas_limit = draft.gas;
    }

    Ok(filled)
}
