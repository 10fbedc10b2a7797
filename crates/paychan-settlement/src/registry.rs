//! Deterministic deployment registry: derives instance addresses, deploys
//! channels and accountants there, and wires new identities to a hub.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use paychan_core::config::ProtocolConfig;
use paychan_core::config_store::{ConfigKey, ConfigStore, ConfigValue};
use paychan_core::ledger::ValueLedger;
use paychan_core::types::{Address, Amount, ChannelId};
use paychan_core::{LedgerBound, Owned};
use paychan_crypto::{
    accountant_salt, channel_salt, create2_address, proxy_code, proxy_code_hash, Registration,
    Signature, SignedMessage,
};

use crate::error::{Result, SettlementError};
use crate::events::Event;
use crate::runtime::Scope;
use crate::traits::{AccountantInit, ChannelInit};
use crate::types::channel_id;

/// Registry bookkeeping. Ownership lives in the config store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryState {
    address: Address,
    ledger: Address,
    registration_fee: Amount,
    minimal_accountant_stake: Amount,
    config: ConfigStore,
    identities: BTreeSet<Address>,
    accountants: BTreeSet<Address>,
}

/// Result of an identity registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRegistration {
    pub identity: Address,
    pub channel: Address,
    /// The identity's record id on the hub.
    pub channel_id: ChannelId,
    /// Whether this was the identity's first registration with any hub.
    pub first_registration: bool,
}

impl RegistryState {
    pub fn new(config: &ProtocolConfig) -> Result<Self> {
        let deployment = &config.deployment;
        if deployment.registry.is_zero() {
            return Err(SettlementError::ZeroAddress("registry"));
        }
        if deployment.registry_owner.is_zero() {
            return Err(SettlementError::ZeroAddress("registry owner"));
        }
        if deployment.ledger.is_zero() {
            return Err(SettlementError::ZeroAddress("ledger"));
        }

        let owner = deployment.registry_owner;
        let mut store = ConfigStore::new(owner);
        store.set(
            &owner,
            ConfigKey::ChannelImplementation,
            ConfigValue::Address(deployment.channel_implementation),
        )?;
        store.set(
            &owner,
            ConfigKey::AccountantImplementation,
            ConfigValue::Address(deployment.accountant_implementation),
        )?;
        store.set(&owner, ConfigKey::DexAddress, ConfigValue::Address(deployment.dex))?;

        Ok(Self {
            address: deployment.registry,
            ledger: deployment.ledger,
            registration_fee: Amount::from(config.registration_fee),
            minimal_accountant_stake: Amount::from(config.minimal_accountant_stake),
            config: store,
            identities: BTreeSet::new(),
            accountants: BTreeSet::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn registration_fee(&self) -> Amount {
        self.registration_fee
    }

    pub fn minimal_accountant_stake(&self) -> Amount {
        self.minimal_accountant_stake
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config
    }

    pub fn channel_implementation(&self) -> Result<Address> {
        self.implementation(ConfigKey::ChannelImplementation)
    }

    pub fn accountant_implementation(&self) -> Result<Address> {
        self.implementation(ConfigKey::AccountantImplementation)
    }

    fn implementation(&self, key: ConfigKey) -> Result<Address> {
        self.config
            .address(key)
            .filter(|a| !a.is_zero())
            .ok_or(SettlementError::MissingConfig(key))
    }

    pub fn dex(&self) -> Address {
        self.config
            .address(ConfigKey::DexAddress)
            .unwrap_or(Address::ZERO)
    }

    /// Where `identity`'s channel with `accountant` is (or will be) deployed.
    pub fn channel_address(&self, identity: &Address, accountant: &Address) -> Result<Address> {
        let code_hash = proxy_code_hash(&self.channel_implementation()?);
        Ok(create2_address(
            &self.address,
            &channel_salt(identity, accountant),
            &code_hash,
        ))
    }

    /// Where `operator`'s accountant is (or will be) deployed.
    pub fn accountant_address(&self, operator: &Address) -> Result<Address> {
        let code_hash = proxy_code_hash(&self.accountant_implementation()?);
        Ok(create2_address(&self.address, &accountant_salt(operator), &code_hash))
    }

    /// Proxy bytecode new channels are deployed with.
    pub fn proxy_code(&self) -> Result<Vec<u8>> {
        Ok(proxy_code(&self.channel_implementation()?))
    }

    pub fn is_registered(&self, identity: &Address) -> bool {
        self.identities.contains(identity)
    }

    pub fn is_accountant(&self, accountant: &Address) -> bool {
        self.accountants.contains(accountant)
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    pub fn set_registration_fee(&mut self, caller: &Address, fee: Amount) -> Result<()> {
        self.ensure_owner(caller)?;
        tracing::info!(fee, "registration fee changed");
        self.registration_fee = fee;
        Ok(())
    }

    pub fn set_minimal_accountant_stake(&mut self, caller: &Address, stake: Amount) -> Result<()> {
        self.ensure_owner(caller)?;
        tracing::info!(stake, "minimal accountant stake changed");
        self.minimal_accountant_stake = stake;
        Ok(())
    }

    /// Owner-only config write; switching an implementation affects instances deployed afterwards.
    pub fn set_config(&mut self, caller: &Address, key: ConfigKey, value: ConfigValue) -> Result<()> {
        self.config.set(caller, key, value)?;
        Ok(())
    }
}

impl Owned for RegistryState {
    fn owner(&self) -> Address {
        self.config.owner()
    }

    fn set_owner_unchecked(&mut self, owner: Address) {
        self.config.set_owner_unchecked(owner);
    }
}

impl LedgerBound for RegistryState {
    fn ledger_id(&self) -> Address {
        self.ledger
    }
}

impl<L: ValueLedger> Scope<'_, L> {
    /// Deploy and initialize `operator`'s accountant, funding it with `stake`
    /// pulled from the caller.
    pub(crate) fn register_accountant(
        &mut self,
        caller: Address,
        operator: Address,
        stake: Amount,
        fee: u16,
        max_loan: Amount,
    ) -> Result<Address> {
        if operator.is_zero() {
            return Err(SettlementError::ZeroAddress("accountant operator"));
        }
        let minimal = self.world.registry.minimal_accountant_stake;
        if stake < minimal {
            return Err(SettlementError::InsufficientFunds {
                available: stake,
                required: minimal,
            });
        }
        let implementation = self.world.registry.accountant_implementation()?;
        let accountant = self.world.registry.accountant_address(&operator)?;
        if self.world.registry.is_accountant(&accountant) {
            return Err(SettlementError::AlreadyDeployed(accountant));
        }

        self.deploy_accountant(accountant, implementation)?;

        let registry = self.world.registry.address;
        self.world
            .ledger
            .transfer_from(registry, caller, accountant, stake)?;

        let init = AccountantInit {
            ledger: self.world.registry.ledger,
            operator,
            fee,
            max_loan,
        };
        self.call_accountant(registry, accountant, |logic, ctx, state| {
            logic.initialize(ctx, state, init)
        })?;

        self.world.registry.accountants.insert(accountant);
        tracing::info!(accountant = %accountant, operator = %operator, stake, "accountant registered");
        self.emit(Event::RegisteredAccountant {
            accountant,
            operator,
        });
        Ok(accountant)
    }

    /// Register the identity that signed `signature` with `accountant`:
    /// deploy its channel, collect the registration fee out of the funds
    /// already sent to the channel address, open the hub-side record with
    /// `loan` and pay `transactor_fee` to the caller.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn register_identity(
        &mut self,
        caller: Address,
        accountant: Address,
        loan: Amount,
        transactor_fee: Amount,
        beneficiary: Address,
        signature: &Signature,
    ) -> Result<IdentityRegistration> {
        let registry = self.world.registry.address;
        let hub_operator = match self.world.accountants.get(&accountant) {
            Some(hub) if self.world.registry.is_accountant(&accountant) && hub.state.is_active() => {
                hub.state.operator
            }
            _ => {
                return Err(SettlementError::InvalidState(format!(
                    "{accountant} is not an active accountant"
                )))
            }
        };

        let message = Registration {
            registry,
            accountant,
            loan,
            transactor_fee,
            beneficiary,
        };
        let identity = message.signer(signature.as_bytes()).ok_or_else(|| {
            SettlementError::Unauthorized("registration signature does not recover".into())
        })?;

        let channel = self.world.registry.channel_address(&identity, &accountant)?;
        let total = self
            .world
            .registry
            .registration_fee
            .checked_add(loan)
            .and_then(|t| t.checked_add(transactor_fee))
            .ok_or(SettlementError::Overflow("registration total"))?;
        let prefunded = self.world.ledger.balance_of(&channel);
        if prefunded < total {
            return Err(SettlementError::InsufficientFunds {
                available: prefunded,
                required: total,
            });
        }

        let implementation = self.world.registry.channel_implementation()?;
        self.deploy_channel(channel, implementation)?;

        let init = ChannelInit {
            ledger: self.world.registry.ledger,
            dex: self.world.registry.dex(),
            identity,
            accountant,
            accountant_operator: hub_operator,
            fee: total,
        };
        self.call_channel(registry, channel, |logic, ctx, state| {
            logic.initialize(ctx, state, init)
        })?;

        self.world.ledger.approve(registry, accountant, loan)?;
        let id = self.call_accountant(registry, accountant, |logic, ctx, state| {
            logic.open_channel(ctx, state, identity, beneficiary, loan)
        })?;
        debug_assert_eq!(id, channel_id(&identity, &accountant));

        if transactor_fee > 0 {
            self.world.ledger.transfer(registry, caller, transactor_fee)?;
        }

        let first_registration = self.world.registry.identities.insert(identity);
        if first_registration {
            self.emit(Event::RegisteredIdentity {
                identity,
                accountant,
            });
        }
        self.emit(Event::ChannelDeployed {
            identity,
            accountant,
            channel,
        });
        tracing::info!(identity = %identity, accountant = %accountant, channel = %channel, loan, "identity registered");

        Ok(IdentityRegistration {
            identity,
            channel,
            channel_id: id,
            first_registration,
        })
    }

    /// Send the registry's collected fees to `beneficiary`. Owner only.
    pub(crate) fn transfer_collected_fee_to(
        &mut self,
        caller: Address,
        beneficiary: Address,
    ) -> Result<Amount> {
        self.world.registry.ensure_owner(&caller)?;
        if beneficiary.is_zero() {
            return Err(SettlementError::ZeroAddress("fee beneficiary"));
        }
        let registry = self.world.registry.address;
        let collected = self.world.ledger.balance_of(&registry);
        if collected > 0 {
            self.world.ledger.transfer(registry, beneficiary, collected)?;
        }
        tracing::info!(beneficiary = %beneficiary, amount = collected, "collected fees transferred");
        Ok(collected)
    }
}
