use paychan_core::types::{Address, Amount};
use sha3::{Digest, Keccak256};

/// Keccak-256 digest (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using Keccak-256.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Tightly packed encoder: fields are concatenated without length prefixes
/// or padding, except that integers are widened to 32-byte big-endian words.
#[derive(Debug, Default, Clone)]
pub struct Packed {
    buf: Vec<u8>,
}

impl Packed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a UTF-8 tag verbatim.
    pub fn tag(mut self, tag: &str) -> Self {
        self.buf.extend_from_slice(tag.as_bytes());
        self
    }

    /// Append a 20-byte address.
    pub fn address(mut self, address: &Address) -> Self {
        self.buf.extend_from_slice(address.as_bytes());
        self
    }

    /// Append a 32-byte word.
    pub fn word(mut self, word: &[u8; 32]) -> Self {
        self.buf.extend_from_slice(word);
        self
    }

    /// Append an amount as a `uint256`.
    pub fn amount(mut self, value: Amount) -> Self {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&value.to_be_bytes());
        self.buf.extend_from_slice(&word);
        self
    }

    /// Append a 64-bit integer (nonce, block height) as a `uint256`.
    pub fn uint(self, value: u64) -> Self {
        self.amount(value as Amount)
    }

    /// Append raw bytes.
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Keccak-256 of the packed bytes.
    pub fn hash(&self) -> Hash {
        keccak256(&self.buf)
    }
}
