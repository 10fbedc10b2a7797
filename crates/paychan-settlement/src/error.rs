use paychan_core::config_store::ConfigKey;
use paychan_core::types::{Address, Amount, BlockNumber, ChannelId, Nonce};
use paychan_core::{CoreError, LedgerError};

/// Settlement-layer errors. Every error aborts the whole operation; the
/// runtime restores the state it had before the call.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("stale nonce {provided}: must exceed {last}")]
    StaleNonce { last: Nonce, provided: Nonce },

    #[error("nothing to settle: promised {promised}, already settled {settled}")]
    NothingToSettle { promised: Amount, settled: Amount },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("channel not opened: {0}")]
    ChannelNotOpened(ChannelId),

    #[error("channel already opened: {0}")]
    ChannelAlreadyOpened(ChannelId),

    #[error("timelock active until block {until}")]
    TimelockActive { until: BlockNumber },

    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: Amount, required: Amount },

    #[error("loan {requested} exceeds limit {limit}")]
    LoanLimitExceeded { requested: Amount, limit: Amount },

    #[error("fee {fee} exceeds maximum {max}")]
    FeeTooHigh { fee: u16, max: u16 },

    #[error("zero address: {0}")]
    ZeroAddress(&'static str),

    #[error("zero amount: {0}")]
    ZeroAmount(&'static str),

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("not initialized")]
    NotInitialized,

    #[error("nothing deployed at {0}")]
    NotDeployed(Address),

    #[error("already deployed at {0}")]
    AlreadyDeployed(Address),

    #[error("implementation not registered: {0}")]
    ImplementationNotFound(Address),

    #[error("missing configuration value: {0}")]
    MissingConfig(ConfigKey),

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, SettlementError>;
