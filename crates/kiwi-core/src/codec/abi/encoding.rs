use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::{Constructor, Function, JsonAbi, Param};
use alloy::primitives::Bytes;
use error_stack::{Report, ResultExt};
use serde_json::Value as JsonValue;

use crate::errors::{CodecError, EvmError, EvmResult};

/// Finds `function_name` in the ABI, preferring the overload taking `arg_count` inputs.
pub fn find_function<'a>(
    abi: &'a JsonAbi,
    function_name: &str,
    arg_count: usize,
) -> EvmResult<&'a Function> {
    let Some(overloads) = abi.function(function_name) else {
        let available_functions: Vec<String> = abi.functions.keys().cloned().collect();
        let mut error = Report::new(EvmError::Codec(CodecError::FunctionNotFound {
            name: function_name.to_string(),
        }));
        if !available_functions.is_empty() {
            error = error.attach_printable(format!(
                "Available functions: {}",
                available_functions.join(", ")
            ));
            for available in &available_functions {
                if available.to_lowercase() == function_name.to_lowercase() {
                    error = error
                        .attach_printable(format!("Did you mean '{}'? (case-sensitive)", available));
                }
            }
        }
        return Err(error);
    };

    overloads
        .iter()
        .find(|f| f.inputs.len() == arg_count)
        .or_else(|| overloads.first())
        .ok_or_else(|| {
            Report::new(EvmError::Codec(CodecError::FunctionNotFound {
                name: function_name.to_string(),
            }))
        })
}

/// ABI-encodes a call (selector ‖ arguments) to `function_name`.
pub fn encode_function_call(
    abi: &JsonAbi,
    function_name: &str,
    args: &[DynSolValue],
) -> EvmResult<Bytes> {
    let function = find_function(abi, function_name, args.len())?;
    check_arguments(&function.inputs, args)
        .attach_printable(format!("Encoding arguments for function '{}'", function.signature()))?;
    let encoded = function
        .abi_encode_input(args)
        .map_err(|e| Report::new(EvmError::Codec(CodecError::AbiEncodingFailed(e.to_string()))))
        .attach_printable(format!("Encoding call to '{}'", function.signature()))?;
    Ok(encoded.into())
}

/// ABI-encodes constructor arguments, without the creation bytecode.
pub fn encode_constructor_args(
    constructor: Option<&Constructor>,
    args: &[DynSolValue],
) -> EvmResult<Vec<u8>> {
    let Some(constructor) = constructor else {
        if args.is_empty() {
            return Ok(vec![]);
        }
        return Err(Report::new(EvmError::Codec(CodecError::ConstructorNotFound(args.len()))));
    };
    check_arguments(&constructor.inputs, args).attach_printable("Encoding constructor arguments")?;
    constructor
        .abi_encode_input(args)
        .map_err(|e| Report::new(EvmError::Codec(CodecError::AbiEncodingFailed(e.to_string()))))
        .attach_printable("Encoding constructor arguments")
}

fn check_arguments(params: &[Param], args: &[DynSolValue]) -> EvmResult<()> {
    if params.len() != args.len() {
        let mut error = Report::new(EvmError::Codec(CodecError::ArgumentCountMismatch {
            expected: params.len(),
            got: args.len(),
        }));
        error = error.attach_printable("Expected arguments:");
        for (i, param) in params.iter().enumerate() {
            let status = if i < args.len() { "✓" } else { "✗ missing" };
            error = error.attach_printable(format!(
                "  [{}] {}: {} {}",
                i,
                if param.name.is_empty() { "arg" } else { &param.name },
                param.ty,
                status
            ));
        }
        return Err(error);
    }
    for (i, (param, arg)) in params.iter().zip(args).enumerate() {
        let ty = resolve_param(param)?;
        if !ty.matches(arg) {
            return Err(Report::new(EvmError::Codec(CodecError::InvalidType {
                expected: param.ty.clone(),
                received: format!("{:?}", arg),
            })))
            .attach_printable(format!("Argument #{} ({})", i + 1, param.name));
        }
    }
    Ok(())
}

fn resolve_param(param: &Param) -> EvmResult<DynSolType> {
    param.resolve().map_err(|e| {
        Report::new(EvmError::Codec(CodecError::TypeSpecifierParseFailed(format!(
            "{}: {}",
            param.ty, e
        ))))
    })
}

/// Converts manifest literals into ABI values for the constructor.
pub fn value_to_abi_constructor_args(
    values: &[JsonValue],
    constructor: Option<&Constructor>,
) -> EvmResult<Vec<DynSolValue>> {
    let inputs = constructor.map(|c| c.inputs.as_slice()).unwrap_or_default();
    if values.len() != inputs.len() {
        return Err(Report::new(EvmError::Codec(CodecError::ArgumentCountMismatch {
            expected: inputs.len(),
            got: values.len(),
        })))
        .attach_printable(format!("Constructor expects {} arguments", inputs.len()));
    }
    value_to_abi_params(values, inputs).attach_printable("Encoding constructor arguments")
}

pub fn value_to_abi_params(values: &[JsonValue], params: &[Param]) -> EvmResult<Vec<DynSolValue>> {
    let mut sol_values = vec![];
    for (i, (value, param)) in values.iter().zip(params).enumerate() {
        let sol_value = value_to_abi_param(value, param)
            .attach_printable(format!("Encoding parameter #{} ({})", i + 1, param.name))?;
        sol_values.push(sol_value);
    }
    Ok(sol_values)
}

pub fn value_to_abi_param(value: &JsonValue, param: &Param) -> EvmResult<DynSolValue> {
    let ty = resolve_param(param)?;
    json_to_sol_value(value, &ty)
        .attach_printable(format!("Converting {} to ABI type {}", value, param.ty))
}

/// Strings go through the type's own string coercion, so `"1"`, `"0xab.."`
/// and `"true"` all work. Large integers must be given as strings.
pub fn json_to_sol_value(value: &JsonValue, ty: &DynSolType) -> EvmResult<DynSolValue> {
    let invalid = |received: &str| {
        Report::new(EvmError::Codec(CodecError::InvalidType {
            expected: ty.to_string(),
            received: received.to_string(),
        }))
    };

    match (value, ty) {
        (JsonValue::String(s), _) => ty.coerce_str(s).map_err(|e| {
            let error = match ty {
                DynSolType::Address => CodecError::InvalidAddress(format!("{}: {}", s, e)),
                _ => CodecError::InvalidType { expected: ty.to_string(), received: s.clone() },
            };
            Report::new(EvmError::Codec(error))
        }),
        (JsonValue::Number(n), DynSolType::Uint(_) | DynSolType::Int(_)) => {
            ty.coerce_str(&n.to_string()).map_err(|_| invalid(&n.to_string()))
        }
        (JsonValue::Bool(b), DynSolType::Bool) => Ok(DynSolValue::Bool(*b)),
        (JsonValue::Array(values), DynSolType::Array(inner)) => values
            .iter()
            .map(|v| json_to_sol_value(v, inner))
            .collect::<EvmResult<Vec<_>>>()
            .map(DynSolValue::Array),
        (JsonValue::Array(values), DynSolType::FixedArray(inner, len)) => {
            if values.len() != *len {
                return Err(Report::new(EvmError::Codec(CodecError::ArgumentCountMismatch {
                    expected: *len,
                    got: values.len(),
                })));
            }
            values
                .iter()
                .map(|v| json_to_sol_value(v, inner))
                .collect::<EvmResult<Vec<_>>>()
                .map(DynSolValue::FixedArray)
        }
        (JsonValue::Array(values), DynSolType::Tuple(types)) => {
            if values.len() != types.len() {
                return Err(Report::new(EvmError::Codec(CodecError::ArgumentCountMismatch {
                    expected: types.len(),
                    got: values.len(),
                })));
            }
            values
                .iter()
                .zip(types)
                .map(|(v, t)| json_to_sol_value(v, t))
                .collect::<EvmResult<Vec<_>>>()
                .map(DynSolValue::Tuple)
        }
        (JsonValue::Null, _) => Err(invalid("null")),
        (other, _) => Err(invalid(&other.to_string())),
    }
}
