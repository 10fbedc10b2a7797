use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use paychan_core::types::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::CryptoError;
use crate::hashing::Hash;
use crate::keys::{public_key_to_address, KeyPair};

/// Length of an encoded signature: `r ‖ s ‖ v`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Half the secp256k1 group order. Signatures with a larger `s` are malleable
/// twins of a canonical signature and are refused.
const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Offset added to the recovery id in the encoded `v` byte.
const V_OFFSET: u8 = 27;

/// Recoverable secp256k1 signature (65 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Create from raw bytes. Only the length is checked here; validity is
    /// decided by [`recover`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Encode as `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Decode from hex string (with or without `0x`).
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(stripped)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Address that produced this signature over `digest`, if any.
    pub fn recover(&self, digest: &Hash) -> Option<Address> {
        recover(digest, &self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Sign a 32-byte digest. Always produces a low-`s` signature with `v ∈ {27, 28}`.
pub fn sign_digest(digest: &Hash, keypair: &KeyPair) -> Result<Signature, CryptoError> {
    let (sig, recid) = keypair
        .signing_key()
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    let (sig, recid) = match sig.normalize_s() {
        Some(low) => (low, RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced())),
        None => (sig, recid),
    };

    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recid.to_byte() + V_OFFSET;
    Ok(Signature(out))
}

/// Recover the signing address of `digest` from an encoded signature.
///
/// Returns `None` for a wrong length, a high `s`, a `v` outside `{27, 28}`,
/// or any signature that does not recover to a curve point.
pub fn recover(digest: &Hash, signature: &[u8]) -> Option<Address> {
    if signature.len() != SIGNATURE_LENGTH {
        return None;
    }

    let s: &[u8] = &signature[32..64];
    if s > &HALF_ORDER[..] {
        tracing::debug!("rejected signature with high s");
        return None;
    }

    let v = signature[64];
    if v != V_OFFSET && v != V_OFFSET + 1 {
        tracing::debug!(v, "rejected signature with unsupported recovery id");
        return None;
    }

    let sig = EcdsaSignature::from_slice(&signature[..64]).ok()?;
    let recid = RecoveryId::from_byte(v - V_OFFSET)?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid).ok()?;
    Some(public_key_to_address(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::keccak256;

    #[test]
    fn test_sign_recover_roundtrip() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"promise");
        let sig = sign_digest(&digest, &kp).unwrap();
        assert_eq!(recover(&digest, sig.as_bytes()), Some(kp.address()));
        assert_eq!(sig.recover(&digest), Some(kp.address()));
    }

    #[test]
    fn test_recover_other_digest_yields_other_address() {
        let kp = KeyPair::generate();
        let sig = sign_digest(&keccak256(b"a"), &kp).unwrap();
        assert_ne!(recover(&keccak256(b"b"), sig.as_bytes()), Some(kp.address()));
    }

    #[test]
    fn test_signature_is_canonical() {
        let kp = KeyPair::from_bytes(&[42u8; 32]).unwrap();
        for i in 0..16u8 {
            let sig = sign_digest(&keccak256(&[i]), &kp).unwrap();
            assert!(sig.0[64] == 27 || sig.0[64] == 28);
            assert!(&sig.0[32..64] <= &HALF_ORDER[..]);
        }
    }

    #[test]
    fn test_wrong_length_is_not_an_error() {
        let digest = keccak256(b"x");
        assert_eq!(recover(&digest, &[0u8; 64]), None);
        assert_eq!(recover(&digest, &[0u8; 66]), None);
    }

    #[test]
    fn test_high_s_rejected() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"malleable");
        let mut bytes = sign_digest(&digest, &kp).unwrap().0;
        // n - 1 is a valid scalar far above n/2
        let high_s =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140").unwrap();
        bytes[32..64].copy_from_slice(&high_s);
        assert_eq!(recover(&digest, &bytes), None);
    }

    #[test]
    fn test_non_canonical_v_rejected() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"v");
        let mut bytes = sign_digest(&digest, &kp).unwrap().0;
        let v = bytes[64];
        bytes[64] = v - 27;
        assert_eq!(recover(&digest, &bytes), None);
        bytes[64] = 29;
        assert_eq!(recover(&digest, &bytes), None);
    }

    #[test]
    fn test_hex_roundtrip() {
        let kp = KeyPair::generate();
        let sig = sign_digest(&keccak256(b"hex"), &kp).unwrap();
        let hex_str = sig.to_hex();
        assert_eq!(hex_str.len(), 2 + 130);
        assert_eq!(Signature::from_hex(&hex_str).unwrap(), sig);
    }

    #[test]
    fn test_from_bytes_invalid_length() {
        assert!(Signature::from_bytes(&[0u8; 32]).is_err());
    }
}
