/// Cryptographic errors.
///
/// A signature that fails to recover is not one of these: recovery reports
/// `None` so callers treat it as an authorization failure.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("signing failed: {0}")]
    Signing(String),
}
