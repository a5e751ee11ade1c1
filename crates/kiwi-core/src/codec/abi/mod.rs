// ABI encoding and decoding module

pub mod decoding;
pub mod encoding;

pub use decoding::{abi_decode_function_output, abi_decode_logs, find_event, DecodedEvent};
pub use encoding::{
    encode_constructor_args, encode_function_call, find_function, json_to_sol_value,
    value_to_abi_constructor_args, value_to_abi_param, value_to_abi_params,
};
