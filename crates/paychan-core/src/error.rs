use crate::state_machine::AccountantStatus;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AccountantStatus,
        to: AccountantStatus,
    },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid channel id: {0}")]
    InvalidChannelId(String),

    #[error("caller {caller} is not the owner")]
    NotOwner { caller: String },

    #[error("zero address is not allowed for {0}")]
    ZeroAddress(&'static str),

    #[error("config key {key} expects a {expected} value")]
    ConfigTypeMismatch {
        key: &'static str,
        expected: &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
