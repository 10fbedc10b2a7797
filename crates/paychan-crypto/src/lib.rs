pub mod create2;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod messages;
pub mod signing;

pub use create2::{accountant_salt, channel_salt, create2_address, proxy_code, proxy_code_hash};
pub use error::CryptoError;
pub use hashing::{keccak256, Hash, Packed};
pub use keys::{public_key_to_address, KeyPair};
pub use messages::{
    hashlock, BalanceUpdate, BeneficiaryChange, ExitRequest, FundsDestinationChange, LoanReturn,
    Promise, Registration, SignedMessage,
};
pub use signing::{recover, sign_digest, Signature, SIGNATURE_LENGTH};
