//! Execution environment for the protocol.
//!
//! The runtime owns every deployed instance, the registry, the ledger and the
//! block counter. Each public operation runs atomically: the world is
//! snapshotted first and restored if the operation fails anywhere, including
//! inside a nested call into another instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use paychan_core::config::ProtocolConfig;
use paychan_core::config_store::{ConfigKey, ConfigValue};
use paychan_core::ledger::ValueLedger;
use paychan_core::state_machine::{AccountantStatus, ChannelPhase};
use paychan_core::types::{Address, Amount, BlockNumber, ChannelId, Nonce};
use paychan_core::Owned;
use paychan_crypto::Signature;

use crate::adapters::InMemoryLedger;
use crate::auth::Authorization;
use crate::context::CallContext;
use crate::error::{Result, SettlementError};
use crate::events::Event;
use crate::implementations::ImplementationRegistry;
use crate::registry::{IdentityRegistration, RegistryState};
use crate::traits::{AccountantLogic, ChannelLogic};
use crate::types::{
    channel_id, AccountantFee, AccountantState, BalanceUpdate, ChannelAccount, ChannelState,
    EmergencyResolution, SettledPromise,
};

/// A proxy instance: the implementation it forwards to, and its own state.
#[derive(Debug, Clone)]
pub struct Deployed<S> {
    pub implementation: Address,
    pub state: S,
}

/// All mutable protocol state. Cloning it must produce an independent copy.
#[derive(Debug, Clone)]
pub(crate) struct World<L> {
    pub(crate) block: BlockNumber,
    pub(crate) ledger: L,
    pub(crate) registry: RegistryState,
    pub(crate) channels: BTreeMap<Address, Deployed<ChannelState>>,
    pub(crate) accountants: BTreeMap<Address, Deployed<AccountantState>>,
    pub(crate) events: Vec<Event>,
}

/// Mutable view of the world for the duration of one operation.
pub(crate) struct Scope<'r, L> {
    pub(crate) config: &'r ProtocolConfig,
    pub(crate) implementations: &'r ImplementationRegistry,
    pub(crate) world: &'r mut World<L>,
}

impl<L: ValueLedger> Scope<'_, L> {
    pub(crate) fn call_channel<T>(
        &mut self,
        caller: Address,
        channel: Address,
        f: impl FnOnce(&dyn ChannelLogic, &mut CallContext<'_>, &mut ChannelState) -> Result<T>,
    ) -> Result<T> {
        let World {
            block,
            ledger,
            channels,
            events,
            ..
        } = &mut *self.world;
        let instance = channels
            .get_mut(&channel)
            .ok_or(SettlementError::NotDeployed(channel))?;
        let logic = self.implementations.channel(&instance.implementation)?;
        let mut ctx = CallContext::new(caller, channel, *block, self.config, &*ledger, events);
        f(logic.as_ref(), &mut ctx, &mut instance.state)
    }

    pub(crate) fn call_accountant<T>(
        &mut self,
        caller: Address,
        accountant: Address,
        f: impl FnOnce(&dyn AccountantLogic, &mut CallContext<'_>, &mut AccountantState) -> Result<T>,
    ) -> Result<T> {
        let World {
            block,
            ledger,
            accountants,
            events,
            ..
        } = &mut *self.world;
        let instance = accountants
            .get_mut(&accountant)
            .ok_or(SettlementError::NotDeployed(accountant))?;
        let logic = self.implementations.accountant(&instance.implementation)?;
        let mut ctx = CallContext::new(caller, accountant, *block, self.config, &*ledger, events);
        f(logic.as_ref(), &mut ctx, &mut instance.state)
    }

    pub(crate) fn deploy_channel(&mut self, address: Address, implementation: Address) -> Result<()> {
        if self.world.channels.contains_key(&address) {
            return Err(SettlementError::AlreadyDeployed(address));
        }
        self.implementations.channel(&implementation)?;
        self.world.channels.insert(
            address,
            Deployed {
                implementation,
                state: ChannelState::default(),
            },
        );
        tracing::debug!(channel = %address, implementation = %implementation, "channel deployed");
        Ok(())
    }

    pub(crate) fn deploy_accountant(
        &mut self,
        address: Address,
        implementation: Address,
    ) -> Result<()> {
        if self.world.accountants.contains_key(&address) {
            return Err(SettlementError::AlreadyDeployed(address));
        }
        self.implementations.accountant(&implementation)?;
        self.world.accountants.insert(
            address,
            Deployed {
                implementation,
                state: AccountantState::default(),
            },
        );
        tracing::debug!(accountant = %address, implementation = %implementation, "accountant deployed");
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: Event) {
        tracing::debug!(event = ?event, "event");
        self.world.events.push(event);
    }
}

/// The protocol runtime.
pub struct Runtime<L = InMemoryLedger> {
    config: ProtocolConfig,
    implementations: ImplementationRegistry,
    world: World<L>,
}

impl Runtime<InMemoryLedger> {
    /// Runtime over a fresh in-memory ledger.
    pub fn new(config: ProtocolConfig) -> Result<Self> {
        Self::with_ledger(config, InMemoryLedger::new())
    }

    /// Credit `amount` to `to` on the in-memory ledger.
    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<()> {
        self.world.ledger.mint(to, amount)?;
        Ok(())
    }
}

impl<L: ValueLedger + Clone> Runtime<L> {
    /// Runtime over a caller-supplied ledger, with the stock implementations registered.
    pub fn with_ledger(config: ProtocolConfig, ledger: L) -> Result<Self> {
        config.validate()?;
        let registry = RegistryState::new(&config)?;
        let implementations = ImplementationRegistry::with_defaults(&config.deployment);
        tracing::info!(
            registry = %registry.address(),
            owner = %registry.owner(),
            "runtime started"
        );
        Ok(Self {
            config,
            implementations,
            world: World {
                block: 1,
                ledger,
                registry,
                channels: BTreeMap::new(),
                accountants: BTreeMap::new(),
                events: Vec::new(),
            },
        })
    }

    fn atomically<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Scope<'_, L>) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self.world.clone();
        let mut scope = Scope {
            config: &self.config,
            implementations: &self.implementations,
            world: &mut self.world,
        };
        match f(&mut scope) {
            Ok(value) => {
                self.check_invariants();
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(operation, error = %err, block = snapshot.block, "operation reverted");
                self.world = snapshot;
                Err(err)
            }
        }
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.world
                .accountants
                .values()
                .all(|hub| hub.state.accounting_consistent()),
            "accountant aggregates diverged from channel records"
        );
    }

    // ---- Environment ----

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.world.ledger
    }

    /// Current block height.
    pub fn block_number(&self) -> BlockNumber {
        self.world.block
    }

    /// Move the clock forward by `blocks` and return the new height.
    pub fn advance_blocks(&mut self, blocks: BlockNumber) -> BlockNumber {
        self.world.block = self.world.block.saturating_add(blocks);
        tracing::debug!(block = self.world.block, "block advanced");
        self.world.block
    }

    /// Events recorded so far, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.world.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.world.events)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.world.ledger.balance_of(account)
    }

    /// Let `spender` pull up to `amount` from `owner`.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<()> {
        self.atomically("ledger.approve", |scope| {
            scope.world.ledger.approve(owner, spender, amount)?;
            Ok(())
        })
    }

    /// Move `amount` from `from` to `to` on the ledger.
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        self.atomically("ledger.transfer", |scope| {
            scope.world.ledger.transfer(from, to, amount)?;
            Ok(())
        })
    }

    /// Make `logic` available at `address` for instances deployed against it.
    pub fn register_channel_implementation(&mut self, address: Address, logic: Arc<dyn ChannelLogic>) {
        self.implementations.register_channel(address, logic);
    }

    /// Make `logic` available at `address` for hubs deployed against it.
    pub fn register_accountant_implementation(
        &mut self,
        address: Address,
        logic: Arc<dyn AccountantLogic>,
    ) {
        self.implementations.register_accountant(address, logic);
    }

    // ---- Registry ----

    pub fn registry(&self) -> &RegistryState {
        &self.world.registry
    }

    /// Deterministic address of the channel for `identity` on `accountant`.
    pub fn channel_address(&self, identity: &Address, accountant: &Address) -> Result<Address> {
        self.world.registry.channel_address(identity, accountant)
    }

    /// Deterministic address of the hub run by `operator`.
    pub fn accountant_address(&self, operator: &Address) -> Result<Address> {
        self.world.registry.accountant_address(operator)
    }

    /// Proxy bytecode that channel addresses are derived from.
    pub fn proxy_code(&self) -> Result<Vec<u8>> {
        self.world.registry.proxy_code()
    }

    /// Whether `identity` has a channel through the registry.
    pub fn is_registered(&self, identity: &Address) -> bool {
        self.world.registry.is_registered(identity)
    }

    /// Whether a hub is deployed at `accountant`.
    pub fn is_accountant(&self, accountant: &Address) -> bool {
        self.world.registry.is_accountant(accountant)
    }

    /// Whether `accountant` is a hub currently accepting new channels.
    pub fn is_active_accountant(&self, accountant: &Address) -> bool {
        self.is_accountant(accountant)
            && self
                .accountant(accountant)
                .is_some_and(|hub| hub.is_active())
    }

    /// Deploy and initialize a hub for `operator`, staked with `stake` pulled from `caller`.
    pub fn register_accountant(
        &mut self,
        caller: Address,
        operator: Address,
        stake: Amount,
        fee: u16,
        max_loan: Amount,
    ) -> Result<Address> {
        self.atomically("registry.register_accountant", |scope| {
            scope.register_accountant(caller, operator, stake, fee, max_loan)
        })
    }

    /// Register an identity with a hub.
    ///
    /// The channel address must already hold the registration fee, the loan
    /// and the transactor fee. The identity is recovered from `signature`.
    pub fn register_identity(
        &mut self,
        caller: Address,
        accountant: Address,
        loan: Amount,
        transactor_fee: Amount,
        beneficiary: Address,
        signature: &Signature,
    ) -> Result<IdentityRegistration> {
        self.atomically("registry.register_identity", |scope| {
            scope.register_identity(caller, accountant, loan, transactor_fee, beneficiary, signature)
        })
    }

    /// Owner-only.
    pub fn change_registration_fee(&mut self, caller: Address, fee: Amount) -> Result<()> {
        self.atomically("registry.change_registration_fee", |scope| {
            scope.world.registry.set_registration_fee(&caller, fee)
        })
    }

    /// Owner-only.
    pub fn change_minimal_accountant_stake(&mut self, caller: Address, stake: Amount) -> Result<()> {
        self.atomically("registry.change_minimal_accountant_stake", |scope| {
            scope.world.registry.set_minimal_accountant_stake(&caller, stake)
        })
    }

    /// Pay the collected registration fees to `beneficiary`. Owner-only.
    pub fn transfer_collected_fee_to(&mut self, caller: Address, beneficiary: Address) -> Result<Amount> {
        self.atomically("registry.transfer_collected_fee_to", |scope| {
            scope.transfer_collected_fee_to(caller, beneficiary)
        })
    }

    /// Owner-only registry configuration write (implementations, dex).
    pub fn set_registry_config(
        &mut self,
        caller: Address,
        key: ConfigKey,
        value: ConfigValue,
    ) -> Result<()> {
        self.atomically("registry.set_config", |scope| {
            scope.world.registry.set_config(&caller, key, value)
        })
    }

    pub fn transfer_registry_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.atomically("registry.transfer_ownership", |scope| {
            scope.world.registry.transfer_ownership(&caller, new_owner)?;
            Ok(())
        })
    }

    // ---- Channels ----

    pub fn channel(&self, channel: &Address) -> Option<&ChannelState> {
        self.world.channels.get(channel).map(|d| &d.state)
    }

    /// Phase of the channel at `channel`; Uninitialized when nothing is deployed there.
    pub fn channel_phase(&self, channel: &Address) -> ChannelPhase {
        let custody = self.balance_of(channel);
        self.channel(channel)
            .map(|state| state.phase(custody))
            .unwrap_or(ChannelPhase::Uninitialized)
    }

    /// Settle an identity-signed promise against its channel, paying the hub.
    /// The amount is clamped to what the channel holds.
    pub fn settle_channel_promise(
        &mut self,
        caller: Address,
        channel: Address,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise> {
        self.atomically("channel.settle_promise", |scope| {
            scope.call_channel(caller, channel, |logic, ctx, state| {
                logic.settle_promise(ctx, state, amount, transactor_fee, lock, signature)
            })
        })
    }

    /// Arm the exit timelock on `channel`, sending everything to `beneficiary` once it expires.
    pub fn request_exit(
        &mut self,
        caller: Address,
        channel: Address,
        beneficiary: Address,
        valid_until: BlockNumber,
        authorization: &Authorization,
    ) -> Result<BlockNumber> {
        self.atomically("channel.request_exit", |scope| {
            scope.call_channel(caller, channel, |logic, ctx, state| {
                logic.request_exit(ctx, state, beneficiary, valid_until, authorization)
            })
        })
    }

    /// Sweep the channel to its exit beneficiary after the timelock. Returns the amount swept.
    pub fn finalize_exit(&mut self, caller: Address, channel: Address) -> Result<Amount> {
        self.atomically("channel.finalize_exit", |scope| {
            scope.call_channel(caller, channel, |logic, ctx, state| {
                logic.finalize_exit(ctx, state)
            })
        })
    }

    /// Change where recovered funds of `channel` are sent.
    pub fn set_channel_funds_destination(
        &mut self,
        caller: Address,
        channel: Address,
        destination: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()> {
        self.atomically("channel.set_funds_destination", |scope| {
            scope.call_channel(caller, channel, |logic, ctx, state| {
                logic.set_funds_destination_by_cheque(ctx, state, destination, nonce, authorization)
            })
        })
    }

    // ---- Accountants ----

    /// Full state of the hub at `accountant`, if one is deployed.
    pub fn accountant(&self, accountant: &Address) -> Option<&AccountantState> {
        self.world.accountants.get(accountant).map(|d| &d.state)
    }

    fn hub(&self, accountant: &Address) -> Result<&AccountantState> {
        self.accountant(accountant)
            .ok_or(SettlementError::NotDeployed(*accountant))
    }

    /// Id of `party`'s record on `accountant`.
    pub fn get_channel_id(&self, accountant: &Address, party: &Address) -> ChannelId {
        channel_id(party, accountant)
    }

    pub fn channel_account(&self, accountant: &Address, id: &ChannelId) -> Option<&ChannelAccount> {
        self.accountant(accountant).and_then(|hub| hub.channel(id))
    }

    pub fn accountant_status(&self, accountant: &Address) -> Result<AccountantStatus> {
        Ok(self.hub(accountant)?.status)
    }

    pub fn accountant_operator(&self, accountant: &Address) -> Result<Address> {
        Ok(self.hub(accountant)?.operator)
    }

    pub fn accountant_stake(&self, accountant: &Address) -> Result<Amount> {
        Ok(self.hub(accountant)?.stake)
    }

    /// `max(locked, total_loan) + max(stake, penalty)` for the hub.
    pub fn minimal_expected_balance(&self, accountant: &Address) -> Result<Amount> {
        Ok(self.hub(accountant)?.minimal_expected_balance())
    }

    /// Custody above the minimal expected balance.
    pub fn available_balance(&self, accountant: &Address) -> Result<Amount> {
        Ok(self.hub(accountant)?.available_balance(self.balance_of(accountant)))
    }

    /// Fee schedule in force at the current block.
    pub fn active_fee(&self, accountant: &Address) -> Result<AccountantFee> {
        Ok(self.hub(accountant)?.active_fee(self.world.block))
    }

    /// Hub fee charged on settling `amount` at the current block.
    pub fn calculate_accountant_fee(&self, accountant: &Address, amount: Amount) -> Result<Amount> {
        Ok(self
            .hub(accountant)?
            .calculate_accountant_fee(amount, self.world.block))
    }

    /// Open a record on the hub for `party`, pulling `loan` from `caller`. Registry-only.
    pub fn open_channel(
        &mut self,
        caller: Address,
        accountant: Address,
        party: Address,
        beneficiary: Address,
        loan: Amount,
    ) -> Result<ChannelId> {
        self.atomically("accountant.open_channel", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.open_channel(ctx, state, party, beneficiary, loan)
            })
        })
    }

    /// Settle a cumulative promise signed by the hub operator.
    ///
    /// Pays the difference to the already settled amount, clamped to the
    /// channel balance, minus hub and transactor fees.
    #[allow(clippy::too_many_arguments)]
    pub fn settle_promise(
        &mut self,
        caller: Address,
        accountant: Address,
        channel_id: ChannelId,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise> {
        self.atomically("accountant.settle_promise", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.settle_promise(ctx, state, channel_id, amount, transactor_fee, lock, signature)
            })
        })
    }

    /// Settle, then refill the channel balance up to its loan when the hub is not closed.
    #[allow(clippy::too_many_arguments)]
    pub fn settle_and_rebalance(
        &mut self,
        caller: Address,
        accountant: Address,
        channel_id: ChannelId,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise> {
        self.atomically("accountant.settle_and_rebalance", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.settle_and_rebalance(
                    ctx,
                    state,
                    channel_id,
                    amount,
                    transactor_fee,
                    lock,
                    signature,
                )
            })
        })
    }

    /// Set a channel balance. Increases apply at once; decreases wait for the delay.
    pub fn update_channel_balance(
        &mut self,
        caller: Address,
        accountant: Address,
        channel_id: ChannelId,
        new_balance: Amount,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<BalanceUpdate> {
        self.atomically("accountant.update_channel_balance", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.update_channel_balance(ctx, state, channel_id, new_balance, nonce, authorization)
            })
        })
    }

    /// Refill a channel balance up to its loan.
    ///
    /// On a shortfall the hub enters punishment and the refill is capped to
    /// what custody allows. Returns the amount added.
    pub fn rebalance_channel(
        &mut self,
        caller: Address,
        accountant: Address,
        channel_id: ChannelId,
    ) -> Result<Amount> {
        self.atomically("accountant.rebalance_channel", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.rebalance_channel(ctx, state, channel_id)
            })
        })
    }

    /// Escrow `amount` more as loan on a channel, pulled from `caller`.
    /// Loan and balance both grow by exactly `amount`.
    pub fn increase_loan(
        &mut self,
        caller: Address,
        accountant: Address,
        channel_id: ChannelId,
        amount: Amount,
    ) -> Result<()> {
        self.atomically("accountant.increase_loan", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.increase_loan(ctx, state, channel_id, amount)
            })
        })
    }

    /// Return up to `amount` of loan to the channel beneficiary. Returns the amount paid.
    pub fn decrease_loan(
        &mut self,
        caller: Address,
        accountant: Address,
        channel_id: ChannelId,
        amount: Amount,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<Amount> {
        self.atomically("accountant.decrease_loan", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.decrease_loan(ctx, state, channel_id, amount, nonce, authorization)
            })
        })
    }

    /// Change where a channel's settlements are paid.
    pub fn set_beneficiary(
        &mut self,
        caller: Address,
        accountant: Address,
        channel_id: ChannelId,
        beneficiary: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()> {
        self.atomically("accountant.set_beneficiary", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.set_beneficiary(ctx, state, channel_id, beneficiary, nonce, authorization)
            })
        })
    }

    /// Stage a new hub fee. Returns the block it takes effect at.
    pub fn set_accountant_fee(
        &mut self,
        caller: Address,
        accountant: Address,
        fee: u16,
    ) -> Result<BlockNumber> {
        self.atomically("accountant.set_fee", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.set_fee(ctx, state, fee)
            })
        })
    }

    /// Raise the hub stake, using free custody before pulling from `caller`.
    pub fn increase_stake(
        &mut self,
        caller: Address,
        accountant: Address,
        additional: Amount,
    ) -> Result<()> {
        self.atomically("accountant.increase_stake", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.increase_stake(ctx, state, additional)
            })
        })
    }

    pub fn set_accountant_operator(
        &mut self,
        caller: Address,
        accountant: Address,
        operator: Address,
    ) -> Result<()> {
        self.atomically("accountant.set_operator", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.set_operator(ctx, state, operator)
            })
        })
    }

    /// Cap on loans for new and grown channels. Operator-only, Active hubs.
    pub fn set_max_loan(
        &mut self,
        caller: Address,
        accountant: Address,
        max_loan: Amount,
    ) -> Result<()> {
        self.atomically("accountant.set_max_loan", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.set_max_loan(ctx, state, max_loan)
            })
        })
    }

    /// Send available custody to `to`. Operator-only, Active hubs.
    pub fn withdraw(
        &mut self,
        caller: Address,
        accountant: Address,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<()> {
        self.atomically("accountant.withdraw", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.withdraw(ctx, state, beneficiary, amount)
            })
        })
    }

    pub fn pause_channel_opening(&mut self, caller: Address, accountant: Address) -> Result<()> {
        self.atomically("accountant.pause_channel_opening", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.pause_channel_opening(ctx, state)
            })
        })
    }

    pub fn resume_channel_opening(&mut self, caller: Address, accountant: Address) -> Result<()> {
        self.atomically("accountant.resume_channel_opening", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.resume_channel_opening(ctx, state)
            })
        })
    }

    /// Leave punishment: accrue the penalty and pull the shortfall from `caller`.
    pub fn resolve_emergency(
        &mut self,
        caller: Address,
        accountant: Address,
    ) -> Result<EmergencyResolution> {
        self.atomically("accountant.resolve_emergency", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.resolve_emergency(ctx, state)
            })
        })
    }

    /// Close the hub. Returns the block after which the stake can be reclaimed.
    pub fn close_accountant(&mut self, caller: Address, accountant: Address) -> Result<BlockNumber> {
        self.atomically("accountant.close", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| logic.close(ctx, state))
        })
    }

    /// Pay custody above the accrued penalty to `beneficiary`, once, after the closing timelock.
    pub fn get_stake_back(
        &mut self,
        caller: Address,
        accountant: Address,
        beneficiary: Address,
    ) -> Result<Amount> {
        self.atomically("accountant.get_stake_back", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.get_stake_back(ctx, state, beneficiary)
            })
        })
    }

    /// Change where recovered hub funds are sent.
    pub fn set_accountant_funds_destination(
        &mut self,
        caller: Address,
        accountant: Address,
        destination: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()> {
        self.atomically("accountant.set_funds_destination", |scope| {
            scope.call_accountant(caller, accountant, |logic, ctx, state| {
                logic.set_funds_destination_by_cheque(ctx, state, destination, nonce, authorization)
            })
        })
    }
}
