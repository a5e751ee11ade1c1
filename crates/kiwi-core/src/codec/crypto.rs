use alloy::signers::k256::ecdsa::SigningKey;
use alloy_signer_local::{coins_bip39::English, LocalSigner, MnemonicBuilder};
use error_stack::{Report, ResultExt};

use crate::constants::DEFAULT_DERIVATION_PATH_PREFIX;
use crate::errors::{EvmError, EvmResult, SignerError};

pub type SecretKeySigner = LocalSigner<SigningKey>;

/// Derives the signer at `m/44'/60'/0'/0/{index}`
pub fn mnemonic_to_secret_key_signer(mnemonic: &str, index: u32) -> EvmResult<SecretKeySigner> {
    let derivation_path = format!("{}/{}", DEFAULT_DERIVATION_PATH_PREFIX, index);
    MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .derivation_path(&derivation_path)
        .map_err(|e| Report::new(EvmError::Signer(SignerError::InvalidMnemonic(e.to_string()))))?
        .build()
        .map_err(|e| Report::new(EvmError::Signer(SignerError::InvalidMnemonic(e.to_string()))))
        .attach_printable(format!("Deriving account {}", derivation_path))
}

pub fn secret_key_to_secret_key_signer(secret_key: &[u8]) -> EvmResult<SecretKeySigner> {
    let signing_key = SigningKey::from_slice(secret_key).map_err(|e| {
        Report::new(EvmError::Signer(SignerError::InvalidSecretKey(format!(
            "failed to generate signing key from secret key: {e}"
        ))))
    })?;
    Ok(SecretKeySigner::from_signing_key(signing_key))
}
