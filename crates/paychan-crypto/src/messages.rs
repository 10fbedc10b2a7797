//! Signed-message schemas. Each message is a fixed field order, packed and
//! hashed with Keccak-256; the digest is what gets signed.

use paychan_core::types::{Address, Amount, BlockNumber, ChannelId, Nonce};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::hashing::{keccak256, Hash, Packed};
use crate::keys::KeyPair;
use crate::signing::{recover, sign_digest, Signature};

pub const BALANCE_UPDATE_PREFIX: &str = "Update channel balance";
pub const LOAN_RETURN_PREFIX: &str = "Loan return request";
pub const EXIT_PREFIX: &str = "Exit request:";
pub const FUNDS_DESTINATION_PREFIX: &str = "Set funds destination:";

/// A message that can be signed and whose signer can be recovered.
pub trait SignedMessage {
    /// Digest of the packed message fields.
    fn digest(&self) -> Hash;

    fn sign(&self, keypair: &KeyPair) -> Result<Signature, CryptoError> {
        sign_digest(&self.digest(), keypair)
    }

    /// Signer of `signature` over this message, if it recovers.
    fn signer(&self, signature: &[u8]) -> Option<Address> {
        recover(&self.digest(), signature)
    }
}

/// Identity registration authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub registry: Address,
    pub accountant: Address,
    pub loan: Amount,
    pub transactor_fee: Amount,
    pub beneficiary: Address,
}

impl SignedMessage for Registration {
    fn digest(&self) -> Hash {
        Packed::new()
            .address(&self.registry)
            .address(&self.accountant)
            .amount(self.loan)
            .amount(self.transactor_fee)
            .address(&self.beneficiary)
            .hash()
    }
}

/// Payment promise. `amount` is cumulative: the total ever promised on the
/// channel, not an increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    /// Channel the promise is drawn on, as a 32-byte word.
    pub channel_id: [u8; 32],
    pub amount: Amount,
    pub fee: Amount,
    pub hashlock: Hash,
}

impl Promise {
    /// Build a promise committing to `lock`; the signed field is `keccak256(lock)`.
    pub fn new(channel_id: [u8; 32], amount: Amount, fee: Amount, lock: &[u8; 32]) -> Self {
        Self {
            channel_id,
            amount,
            fee,
            hashlock: hashlock(lock),
        }
    }
}

impl SignedMessage for Promise {
    fn digest(&self) -> Hash {
        Packed::new()
            .word(&self.channel_id)
            .amount(self.amount)
            .amount(self.fee)
            .word(&self.hashlock)
            .hash()
    }
}

/// Hashlock commitment of a lock preimage.
pub fn hashlock(lock: &[u8; 32]) -> Hash {
    keccak256(lock)
}

/// Channel balance update authorized by the accountant operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub channel_id: ChannelId,
    pub nonce: Nonce,
    pub new_balance: Amount,
}

impl SignedMessage for BalanceUpdate {
    fn digest(&self) -> Hash {
        Packed::new()
            .tag(BALANCE_UPDATE_PREFIX)
            .word(self.channel_id.as_bytes())
            .uint(self.nonce)
            .amount(self.new_balance)
            .hash()
    }
}

/// Loan decrease requested by the channel party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReturn {
    pub channel_id: ChannelId,
    pub amount: Amount,
    pub nonce: Nonce,
}

impl SignedMessage for LoanReturn {
    fn digest(&self) -> Hash {
        Packed::new()
            .tag(LOAN_RETURN_PREFIX)
            .word(self.channel_id.as_bytes())
            .amount(self.amount)
            .uint(self.nonce)
            .hash()
    }
}

/// Payout address change requested by the channel party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryChange {
    pub channel_id: ChannelId,
    pub beneficiary: Address,
    pub nonce: Nonce,
}

impl SignedMessage for BeneficiaryChange {
    fn digest(&self) -> Hash {
        Packed::new()
            .word(self.channel_id.as_bytes())
            .address(&self.beneficiary)
            .uint(self.nonce)
            .hash()
    }
}

/// Channel exit request signed by the channel operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRequest {
    pub channel: Address,
    pub beneficiary: Address,
    pub valid_until: BlockNumber,
}

impl SignedMessage for ExitRequest {
    fn digest(&self) -> Hash {
        Packed::new()
            .tag(EXIT_PREFIX)
            .address(&self.channel)
            .address(&self.beneficiary)
            .uint(self.valid_until)
            .hash()
    }
}

/// Recovered-funds destination change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsDestinationChange {
    pub destination: Address,
    pub nonce: Nonce,
}

impl SignedMessage for FundsDestinationChange {
    fn digest(&self) -> Hash {
        Packed::new()
            .tag(FUNDS_DESTINATION_PREFIX)
            .address(&self.destination)
            .uint(self.nonce)
            .hash()
    }
}
