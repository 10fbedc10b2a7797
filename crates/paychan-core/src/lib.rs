pub mod capability;
pub mod config;
pub mod config_store;
pub mod error;
pub mod ledger;
pub mod state_machine;
pub mod types;

pub use capability::{FundsRecoverable, LedgerBound, Owned};
pub use config::{DeploymentConfig, ProtocolConfig, MAX_ACCOUNTANT_FEE};
pub use config_store::{ConfigKey, ConfigStore, ConfigValue};
pub use error::CoreError;
pub use ledger::{LedgerError, ValueLedger};
pub use state_machine::{AccountantEvent, AccountantStateMachine, AccountantStatus, ChannelPhase};
pub use types::{Address, Amount, BlockNumber, ChannelId, Nonce};
