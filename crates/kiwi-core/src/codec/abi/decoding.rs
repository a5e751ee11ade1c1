use alloy::dyn_abi::{DynSolValue, EventExt, FunctionExt};
use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use error_stack::{Report, ResultExt};

use crate::errors::{CodecError, EvmError, EvmResult};

/// A log decoded against a named ABI event. Fields keep the ABI declaration
/// order, indexed and non-indexed inputs merged.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    pub address: Address,
    pub fields: Vec<(String, DynSolValue)>,
}

impl DecodedEvent {
    pub fn get(&self, field: &str) -> Option<&DynSolValue> {
        self.fields.iter().find(|(name, _)| name == field).map(|(_, value)| value)
    }

    pub fn address_field(&self, field: &str) -> Option<Address> {
        self.get(field).and_then(|v| v.as_address())
    }

    pub fn uint_field(&self, field: &str) -> Option<U256> {
        self.get(field).and_then(|v| v.as_uint()).map(|(value, _)| value)
    }

    pub fn bool_field(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(|v| v.as_bool())
    }
}

pub fn find_event<'a>(abi: &'a JsonAbi, event_name: &str) -> EvmResult<&'a Event> {
    abi.event(event_name).and_then(|events| events.first()).ok_or_else(|| {
        let available: Vec<String> = abi.events.keys().cloned().collect();
        Report::new(EvmError::Codec(CodecError::EventNotFound { name: event_name.to_string() }))
            .attach_printable(format!("Available events: {}", available.join(", ")))
    })
}

/// Decodes every log whose first topic is the selector of `event_name`, in log order.
/// Logs of other events are skipped.
pub fn abi_decode_logs(abi: &JsonAbi, event_name: &str, logs: &[Log]) -> EvmResult<Vec<DecodedEvent>> {
    let event = find_event(abi, event_name)?;
    let selector = event.selector();

    logs.iter()
        .filter(|log| log.topics().first() == Some(&selector))
        .map(|log| {
            decode_log(event, log).attach_printable(format!(
                "Decoding event '{}' at address {}",
                event.name,
                log.address()
            ))
        })
        .collect()
}

fn decode_log(event: &Event, log: &Log) -> EvmResult<DecodedEvent> {
    let decoded = event
        .decode_log(log.data())
        .map_err(|e| Report::new(EvmError::Codec(CodecError::AbiDecodingFailed(e.to_string()))))?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    let mut fields = Vec::with_capacity(event.inputs.len());
    for input in event.inputs.iter() {
        let value = if input.indexed { indexed.next() } else { body.next() };
        let value = value.ok_or_else(|| {
            Report::new(EvmError::Codec(CodecError::AbiDecodingFailed(format!(
                "missing value for event parameter '{}'",
                input.name
            ))))
        })?;
        fields.push((input.name.clone(), value));
    }

    Ok(DecodedEvent { name: event.name.clone(), address: log.address(), fields })
}

/// Decodes the return data of a call to `function_name`.
pub fn abi_decode_function_output(
    abi: &JsonAbi,
    function_name: &str,
    arg_count: usize,
    output: &[u8],
) -> EvmResult<Vec<DynSolValue>> {
    let function = super::encoding::find_function(abi, function_name, arg_count)?;
    function
        .abi_decode_output(output)
        .map_err(|e| Report::new(EvmError::Codec(CodecError::AbiDecodingFailed(e.to_string()))))
        .attach_printable(format!("Decoding output of '{}'", function.signature()))
}
