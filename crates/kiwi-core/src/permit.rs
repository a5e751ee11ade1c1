//! EIP-712 `Permit` approvals for the KIWI token.
//!
//! The owner signs off-chain; anyone may then submit
//! `permit(owner, spender, value, deadline, signature)` to the token.

use std::borrow::Cow;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::signers::SignerSync;
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use error_stack::Report;

use crate::codec::crypto::secret_key_to_secret_key_signer;
use crate::constants::{PERMIT_DOMAIN_NAME, PERMIT_DOMAIN_VERSION};
use crate::errors::{EvmError, EvmResult, SignerError};
use crate::signers::SecretKey;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}

/// Domain the token verifies permits against
pub fn permit_domain(chain_id: u64, token: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(PERMIT_DOMAIN_NAME)),
        Some(Cow::Borrowed(PERMIT_DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(token),
        None,
    )
}

pub fn permit_signing_hash(permit: &Permit, domain: &Eip712Domain) -> B256 {
    permit.eip712_signing_hash(domain)
}

/// Signs the permit, returning the 65-byte `r ‖ s ‖ v` form with `v` in {27, 28}.
pub fn sign_permit(
    permit: &Permit,
    domain: &Eip712Domain,
    secret_key: &SecretKey,
) -> EvmResult<Bytes> {
    let signer = secret_key_to_secret_key_signer(secret_key.as_bytes())?;
    if signer.address() != permit.owner {
        return Err(Report::new(EvmError::Signer(SignerError::SigningFailed(format!(
            "permit owner {} is not the signing account {}",
            permit.owner,
            signer.address()
        )))));
    }
    let hash = permit_signing_hash(permit, domain);
    let signature = signer
        .sign_hash_sync(&hash)
        .map_err(|e| Report::new(EvmError::Signer(SignerError::SigningFailed(e.to_string()))))?;
    Ok(Bytes::from(signature.as_bytes().to_vec()))
}
