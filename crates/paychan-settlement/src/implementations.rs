use std::collections::HashMap;
use std::sync::Arc;

use paychan_core::config::DeploymentConfig;
use paychan_core::types::Address;

use crate::accountant::AccountantImplementation;
use crate::channel::ChannelImplementation;
use crate::error::{Result, SettlementError};
use crate::traits::{AccountantLogic, ChannelLogic};

/// Logic shared by proxy instances, keyed by implementation address.
///
/// A deployed instance records the implementation address it was created
/// against; every call is dispatched through this table.
#[derive(Clone, Default)]
pub struct ImplementationRegistry {
    channels: HashMap<Address, Arc<dyn ChannelLogic>>,
    accountants: HashMap<Address, Arc<dyn AccountantLogic>>,
}

impl ImplementationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the stock logic at the configured implementation addresses.
    pub fn with_defaults(deployment: &DeploymentConfig) -> Self {
        let mut registry = Self::new();
        registry.register_channel(deployment.channel_implementation, Arc::new(ChannelImplementation));
        registry.register_accountant(
            deployment.accountant_implementation,
            Arc::new(AccountantImplementation),
        );
        registry
    }

    pub fn register_channel(&mut self, address: Address, logic: Arc<dyn ChannelLogic>) {
        tracing::info!(implementation = %address, "registering channel implementation");
        self.channels.insert(address, logic);
    }

    pub fn register_accountant(&mut self, address: Address, logic: Arc<dyn AccountantLogic>) {
        tracing::info!(implementation = %address, "registering accountant implementation");
        self.accountants.insert(address, logic);
    }

    pub fn unregister_channel(&mut self, address: &Address) -> Option<Arc<dyn ChannelLogic>> {
        self.channels.remove(address)
    }

    pub fn unregister_accountant(&mut self, address: &Address) -> Option<Arc<dyn AccountantLogic>> {
        self.accountants.remove(address)
    }

    pub fn channel(&self, address: &Address) -> Result<Arc<dyn ChannelLogic>> {
        self.channels
            .get(address)
            .cloned()
            .ok_or(SettlementError::ImplementationNotFound(*address))
    }

    pub fn accountant(&self, address: &Address) -> Result<Arc<dyn AccountantLogic>> {
        self.accountants
            .get(address)
            .cloned()
            .ok_or(SettlementError::ImplementationNotFound(*address))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn accountant_count(&self) -> usize {
        self.accountants.len()
    }
}
