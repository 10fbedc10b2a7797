//! Paychan settlement engine
//!
//! Consumer channels, the accountant (hub) that settles promises against
//! them, the registry that deploys both at deterministic addresses, and the
//! runtime that executes every operation atomically over a value ledger.

pub mod accountant;
pub mod adapters;
pub mod auth;
pub mod channel;
pub mod context;
pub mod error;
pub mod events;
pub mod implementations;
pub mod registry;
pub mod runtime;
pub mod traits;
pub mod types;

pub use accountant::AccountantImplementation;
pub use adapters::InMemoryLedger;
pub use auth::Authorization;
pub use channel::ChannelImplementation;
pub use error::SettlementError;
pub use events::Event;
pub use implementations::ImplementationRegistry;
pub use registry::{IdentityRegistration, RegistryState};
pub use runtime::{Deployed, Runtime};
pub use traits::{AccountantInit, AccountantLogic, ChannelInit, ChannelLogic};
pub use types::{
    calculate_fee, channel_id, AccountantFee, AccountantState, BalanceUpdate, ChannelAccount,
    ChannelState, EmergencyResolution, SettledPromise,
};
