//! Typed, owner-gated key/value configuration store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::capability::Owned;
use crate::error::CoreError;
use crate::types::{Address, Amount};

/// Keys known to the store. Each key has a fixed value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfigKey {
    /// Implementation new channel instances are deployed against.
    ChannelImplementation,
    /// Implementation new accountant instances are deployed against.
    AccountantImplementation,
    /// Exchange target handed to channels.
    DexAddress,
    /// Informational: default per-channel loan cap suggested to new hubs.
    SuggestedMaxLoan,
}

/// Kind of value a key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Address,
    Amount,
}

impl ConfigKey {
    /// The schema: which kind of value this key accepts.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::ChannelImplementation | Self::AccountantImplementation | Self::DexAddress => {
                ValueKind::Address
            }
            Self::SuggestedMaxLoan => ValueKind::Amount,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ChannelImplementation => "channel_implementation",
            Self::AccountantImplementation => "accountant_implementation",
            Self::DexAddress => "dex_address",
            Self::SuggestedMaxLoan => "suggested_max_loan",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigValue {
    Address(Address),
    Amount(Amount),
}

impl ConfigValue {
    fn kind(&self) -> ValueKind {
        match self {
            Self::Address(_) => ValueKind::Address,
            Self::Amount(_) => ValueKind::Amount,
        }
    }
}

/// Owner-gated typed store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigStore {
    owner: Address,
    values: BTreeMap<ConfigKey, ConfigValue>,
}

impl ConfigStore {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            values: BTreeMap::new(),
        }
    }

    /// Write a value. Only the owner may write, and the value must match the key's schema.
    pub fn set(
        &mut self,
        caller: &Address,
        key: ConfigKey,
        value: ConfigValue,
    ) -> Result<(), CoreError> {
        self.ensure_owner(caller)?;
        if value.kind() != key.kind() {
            let expected = match key.kind() {
                ValueKind::Address => "address",
                ValueKind::Amount => "amount",
            };
            return Err(CoreError::ConfigTypeMismatch {
                key: key.name(),
                expected,
            });
        }
        tracing::debug!(key = %key, value = ?value, "config value set");
        self.values.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: ConfigKey) -> Option<ConfigValue> {
        self.values.get(&key).copied()
    }

    /// Typed getter for address-valued keys.
    pub fn address(&self, key: ConfigKey) -> Option<Address> {
        match self.values.get(&key) {
            Some(ConfigValue::Address(a)) => Some(*a),
            _ => None,
        }
    }

    /// Typed getter for amount-valued keys.
    pub fn amount(&self, key: ConfigKey) -> Option<Amount> {
        match self.values.get(&key) {
            Some(ConfigValue::Amount(v)) => Some(*v),
            _ => None,
        }
    }
}

impl Owned for ConfigStore {
    fn owner(&self) -> Address {
        self.owner
    }

    fn set_owner_unchecked(&mut self, owner: Address) {
        self.owner = owner;
    }
}
