use std::fmt;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::rpc::types::TransactionRequest;
use error_stack::{Report, ResultExt};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::codec::crypto::{mnemonic_to_secret_key_signer, secret_key_to_secret_key_signer};
use crate::errors::{EvmError, EvmResult, SignerError, TransactionContext, TransactionError};

/// A 32-byte secp256k1 secret key. Never printed, wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Accepts 64 hex characters, with or without `0x`
    pub fn from_hex(value: &str) -> EvmResult<Self> {
        let value = value.trim();
        let bytes = Zeroizing::new(alloy::hex::decode(value).map_err(|_| {
            Report::new(EvmError::Signer(SignerError::InvalidSecretKey(
                "secret key is not valid hex".to_string(),
            )))
        })?);
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> EvmResult<Self> {
        if bytes.len() != 32 {
            return Err(Report::new(EvmError::Signer(SignerError::InvalidSecretKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )))));
        }
        let mut key = Self([0u8; 32]);
        key.0.copy_from_slice(bytes);
        // rejects zero and out-of-range scalars
        secret_key_to_secret_key_signer(&key.0)?;
        Ok(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Where a secret key comes from. Literals are meant for local test chains
/// and are wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretSource {
    Env(String),
    Literal(String),
}

impl SecretSource {
    pub fn resolve(&self) -> EvmResult<SecretKey> {
        match self {
            SecretSource::Env(var) => {
                let value = Zeroizing::new(std::env::var(var).map_err(|_| {
                    Report::new(EvmError::Signer(SignerError::MissingSecret(format!(
                        "environment variable {} is not set",
                        var
                    ))))
                })?);
                SecretKey::from_hex(&value)
                    .attach_printable(format!("Reading secret key from {}", var))
            }
            SecretSource::Literal(value) => SecretKey::from_hex(value),
        }
    }
}

impl Zeroize for SecretSource {
    fn zeroize(&mut self) {
        if let SecretSource::Literal(value) = self {
            value.zeroize();
        }
    }
}

impl Drop for SecretSource {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretSource {}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretSource::Env(var) => write!(f, "Env({})", var),
            SecretSource::Literal(_) => f.write_str("Literal(<redacted>)"),
        }
    }
}

/// An EIP-2718 encoded, signed transaction ready for `eth_sendRawTransaction`
#[derive(Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub tx_hash: B256,
}

pub fn secret_key_to_address(secret_key: &SecretKey) -> EvmResult<Address> {
    Ok(secret_key_to_secret_key_signer(secret_key.as_bytes())?.address())
}

pub fn mnemonic_to_secret_key(mnemonic: &str, index: u32) -> EvmResult<SecretKey> {
    let signer = mnemonic_to_secret_key_signer(mnemonic, index)?;
    let mut field_bytes = signer.to_field_bytes();
    let secret_key = SecretKey::from_slice(field_bytes.as_slice());
    field_bytes.as_mut_slice().zeroize();
    secret_key
}

/// Signs `tx` with `secret_key`. The request's `from`, if set, must be the
/// key's address. Signatures are deterministic (RFC 6979).
pub async fn sign_transaction(
    tx: TransactionRequest,
    secret_key: &SecretKey,
) -> EvmResult<SignedTransaction> {
    let tx_context = TransactionContext {
        from: tx.from,
        to: tx.to.and_then(|kind| kind.to().copied()),
        gas_limit: tx.gas,
        chain_id: tx.chain_id,
        ..Default::default()
    };

    let signer = secret_key_to_secret_key_signer(secret_key.as_bytes())?;
    if let Some(from) = tx.from {
        if from != signer.address() {
            return Err(Report::new(EvmError::Signer(SignerError::SigningFailed(format!(
                "transaction sender {} does not match signer {}",
                from,
                signer.address()
            )))))
            .attach(tx_context);
        }
    }
    let wallet = EthereumWallet::from(signer);

    let envelope = tx
        .build(&wallet)
        .await
        .map_err(|e| {
            Report::new(EvmError::Transaction(TransactionError::EnvelopeFailed(e.to_string())))
        })
        .attach(tx_context)?;

    Ok(SignedTransaction {
        raw: envelope.encoded_2718().into(),
        tx_hash: *envelope.tx_hash(),
    })
}
