//! Authorization of actions: either the principal calls directly, or anyone
//! relays a message the principal signed.

use paychan_core::types::{Address, Nonce};
use paychan_crypto::{Signature, SignedMessage};

use crate::error::{Result, SettlementError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// The caller is the principal.
    Direct,
    /// The caller relays the principal's signature.
    Signed(Signature),
}

impl From<Signature> for Authorization {
    fn from(signature: Signature) -> Self {
        Self::Signed(signature)
    }
}

/// Check that `principal` authorized `message`, directly or by signature.
pub fn authorize<M: SignedMessage>(
    caller: &Address,
    principal: &Address,
    message: &M,
    authorization: &Authorization,
    action: &'static str,
) -> Result<()> {
    match authorization {
        Authorization::Direct if caller == principal => Ok(()),
        Authorization::Direct => Err(SettlementError::Unauthorized(format!(
            "{action}: caller {caller} is not {principal}"
        ))),
        Authorization::Signed(signature) => require_signature(message, signature, principal, action),
    }
}

/// Check that `signature` over `message` recovers to `principal`.
pub fn require_signature<M: SignedMessage>(
    message: &M,
    signature: &Signature,
    principal: &Address,
    action: &'static str,
) -> Result<()> {
    match message.signer(signature.as_bytes()) {
        Some(signer) if signer == *principal => Ok(()),
        Some(signer) => Err(SettlementError::Unauthorized(format!(
            "{action}: signed by {signer}, expected {principal}"
        ))),
        None => Err(SettlementError::Unauthorized(format!(
            "{action}: signature does not recover"
        ))),
    }
}

/// Fail unless `nonce` is strictly greater than `last`.
pub fn ensure_fresh_nonce(last: Nonce, nonce: Nonce) -> Result<()> {
    if nonce <= last {
        return Err(SettlementError::StaleNonce {
            last,
            provided: nonce,
        });
    }
    Ok(())
}

/// Record `nonce` as used. Fails on a replay.
pub fn consume_nonce(last: &mut Nonce, nonce: Nonce) -> Result<()> {
    ensure_fresh_nonce(*last, nonce)?;
    *last = nonce;
    Ok(())
}
