use alloy::hex::FromHex;
use alloy::primitives::Address;
use error_stack::{Report, ResultExt};

use crate::constants::GWEI;
use crate::errors::{CodecError, ConfigError, EvmError, EvmResult};

/// Parses an address with or without `0x`. A 32-byte word (an address
/// left-padded by ABI encoding) is accepted and trimmed to its last 20 bytes.
pub fn string_to_address(address_str: &str) -> EvmResult<Address> {
    let trimmed = address_str.trim();
    let mut hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if hex.len() == 64 {
        let (padding, address) = hex.split_at(24);
        if padding.chars().any(|c| c != '0') {
            return Err(Report::new(EvmError::Codec(CodecError::InvalidAddress(format!(
                "32-byte value {} is not a padded address",
                address_str
            )))));
        }
        hex = address;
    }

    Address::from_hex(hex)
        .map_err(|e| {
            Report::new(EvmError::Codec(CodecError::InvalidAddress(format!("{}: {}", hex, e))))
        })
        .attach_printable(format!("Parsing address: {}", address_str))
}

/// Converts a gwei amount from configuration to wei
pub fn gwei_to_wei(field: &str, gwei: u64) -> EvmResult<u128> {
    (gwei as u128).checked_mul(GWEI).ok_or_else(|| {
        Report::new(EvmError::Config(ConfigError::InvalidValue {
            field: field.to_string(),
            value: format!("{} gwei overflows", gwei),
        }))
    })
}
