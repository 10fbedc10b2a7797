//! Accountant (hub): channel accounting, loans, fees, stake and the
//! punishment cycle.

use paychan_core::state_machine::{AccountantEvent, AccountantStateMachine, AccountantStatus};
use paychan_core::types::{Address, Amount, BlockNumber, ChannelId, Nonce};
use paychan_core::FundsRecoverable;
use paychan_crypto::{
    BalanceUpdate as BalanceUpdateMessage, BeneficiaryChange, FundsDestinationChange, LoanReturn,
    Promise, Signature,
};

use crate::auth::{authorize, consume_nonce, ensure_fresh_nonce, require_signature, Authorization};
use crate::context::CallContext;
use crate::error::{Result, SettlementError};
use crate::events::Event;
use crate::traits::{AccountantInit, AccountantLogic};
use crate::types::{
    channel_id, AccountantFee, AccountantState, BalanceUpdate, ChannelAccount,
    EmergencyResolution, SettledPromise,
};

/// The stock accountant logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountantImplementation;

fn ensure_operator(ctx: &CallContext<'_>, state: &AccountantState) -> Result<()> {
    if ctx.caller != state.operator {
        return Err(SettlementError::Unauthorized(format!(
            "caller {} is not the accountant operator",
            ctx.caller
        )));
    }
    Ok(())
}

fn ensure_status(state: &AccountantState, allowed: &[AccountantStatus]) -> Result<()> {
    if !allowed.contains(&state.status) {
        return Err(SettlementError::InvalidState(format!(
            "accountant is {}",
            state.status
        )));
    }
    Ok(())
}

fn ensure_not_closed(state: &AccountantState) -> Result<()> {
    if state.status == AccountantStatus::Closed {
        return Err(SettlementError::InvalidState("accountant is Closed".into()));
    }
    Ok(())
}

fn account<'s>(state: &'s AccountantState, id: &ChannelId) -> Result<&'s ChannelAccount> {
    state
        .channels
        .get(id)
        .ok_or(SettlementError::ChannelNotOpened(*id))
}

fn account_mut<'s>(state: &'s mut AccountantState, id: &ChannelId) -> Result<&'s mut ChannelAccount> {
    state
        .channels
        .get_mut(id)
        .ok_or(SettlementError::ChannelNotOpened(*id))
}

/// Move to Punishment. The activation block is only set on entry.
fn enter_punishment(ctx: &mut CallContext<'_>, state: &mut AccountantState) -> Result<()> {
    let previous = state.status;
    state.status = AccountantStateMachine::transition(previous, AccountantEvent::ShortfallDetected)?;
    if previous != AccountantStatus::Punishment {
        state.punishment.activation_block = ctx.block;
        tracing::warn!(
            accountant = %ctx.this,
            block = ctx.block,
            custody = ctx.custody(),
            required = state.minimal_expected_balance(),
            "accountant entered punishment"
        );
        ctx.emit(Event::PunishmentActivated {
            accountant: ctx.this,
            block: ctx.block,
        });
    }
    Ok(())
}

fn check_invariants(state: &AccountantState) {
    debug_assert!(
        state.accounting_consistent(),
        "accountant aggregates diverged from channel records"
    );
}

impl AccountantLogic for AccountantImplementation {
    fn initialize(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        init: AccountantInit,
    ) -> Result<()> {
        if state.initialized {
            return Err(SettlementError::AlreadyInitialized);
        }
        if init.operator.is_zero() {
            return Err(SettlementError::ZeroAddress("accountant operator"));
        }
        if init.ledger.is_zero() {
            return Err(SettlementError::ZeroAddress("ledger"));
        }
        if init.fee > ctx.config.max_fee {
            return Err(SettlementError::FeeTooHigh {
                fee: init.fee,
                max: ctx.config.max_fee,
            });
        }

        state.initialized = true;
        state.ledger = init.ledger;
        state.registry = ctx.caller;
        state.operator = init.operator;
        state.status = AccountantStatus::Active;
        state.max_loan = init.max_loan;
        state.last_fee = AccountantFee {
            value: init.fee,
            valid_from: ctx.block,
        };
        state.stake = ctx.custody();

        tracing::info!(
            accountant = %ctx.this,
            operator = %init.operator,
            stake = state.stake,
            fee = init.fee,
            "accountant initialized"
        );
        Ok(())
    }

    fn open_channel(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        party: Address,
        beneficiary: Address,
        loan: Amount,
    ) -> Result<ChannelId> {
        if ctx.caller != state.registry {
            return Err(SettlementError::Unauthorized(format!(
                "only the registry opens channels, not {}",
                ctx.caller
            )));
        }
        ensure_status(state, &[AccountantStatus::Active])?;
        if party.is_zero() {
            return Err(SettlementError::ZeroAddress("channel party"));
        }
        if beneficiary.is_zero() {
            return Err(SettlementError::ZeroAddress("beneficiary"));
        }
        if loan > state.max_loan {
            return Err(SettlementError::LoanLimitExceeded {
                requested: loan,
                limit: state.max_loan,
            });
        }
        let id = channel_id(&party, &ctx.this);
        if state.channels.contains_key(&id) {
            return Err(SettlementError::ChannelAlreadyOpened(id));
        }

        state.channels.insert(
            id,
            ChannelAccount {
                party,
                beneficiary,
                balance: loan,
                settled: 0,
                loan,
                last_used_nonce: 0,
                timelock: 0,
            },
        );
        state.locked_funds += loan;
        state.total_loan += loan;

        ctx.pull(ctx.caller, loan)?;

        tracing::info!(accountant = %ctx.this, channel_id = %id, loan, "channel opened");
        ctx.emit(Event::ChannelOpened {
            accountant: ctx.this,
            channel_id: id,
            initial_balance: loan,
        });
        check_invariants(state);
        Ok(id)
    }

    fn settle_promise(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise> {
        let promise = Promise::new(*channel_id.as_bytes(), amount, transactor_fee, lock);
        require_signature(&promise, signature, &state.operator, "accountant promise")?;

        let channel = account(state, &channel_id)?;
        let owed = amount
            .checked_sub(channel.settled)
            .filter(|owed| *owed > 0)
            .ok_or(SettlementError::NothingToSettle {
                promised: amount,
                settled: channel.settled,
            })?;

        // Clamp to what the channel may still settle
        let unpaid = owed.min(channel.balance);
        let accountant_fee = state.calculate_accountant_fee(unpaid, ctx.block);
        let fees = accountant_fee.saturating_add(transactor_fee);
        if unpaid == 0 || unpaid < fees {
            return Err(SettlementError::InsufficientFunds {
                available: unpaid,
                required: fees.max(1),
            });
        }
        let payout = unpaid - fees;
        let beneficiary = channel.beneficiary;

        let channel = account_mut(state, &channel_id)?;
        channel.settled += unpaid;
        channel.balance -= unpaid;
        let total_settled = channel.settled;
        state.locked_funds -= unpaid;

        ctx.pay(ctx.caller, transactor_fee)?;
        ctx.pay(beneficiary, payout)?;

        tracing::info!(
            accountant = %ctx.this,
            channel_id = %channel_id,
            amount = unpaid,
            accountant_fee,
            transactor_fee,
            "promise settled"
        );
        ctx.emit(Event::PromiseSettled {
            accountant: ctx.this,
            channel_id,
            beneficiary,
            amount: payout,
            total_settled,
        });
        check_invariants(state);

        Ok(SettledPromise {
            amount: unpaid,
            accountant_fee,
            transactor_fee,
            payout,
            total_settled,
        })
    }

    fn update_channel_balance(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        new_balance: Amount,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<BalanceUpdate> {
        ensure_status(state, &[AccountantStatus::Active, AccountantStatus::Paused])?;
        let channel = account(state, &channel_id)?;
        ensure_fresh_nonce(channel.last_used_nonce, nonce)?;
        let message = BalanceUpdateMessage {
            channel_id,
            nonce,
            new_balance,
        };
        authorize(&ctx.caller, &state.operator, &message, authorization, "balance update")?;

        if new_balance < channel.loan {
            return Err(SettlementError::InvalidState(format!(
                "balance {new_balance} below loan {}",
                channel.loan
            )));
        }
        let current = channel.balance;
        let armed = channel.timelock;

        if new_balance > current {
            let increase = new_balance - current;
            let available = state.available_balance(ctx.custody());
            if available < increase {
                return Err(SettlementError::InsufficientFunds {
                    available,
                    required: increase,
                });
            }
            let channel = account_mut(state, &channel_id)?;
            consume_nonce(&mut channel.last_used_nonce, nonce)?;
            channel.balance = new_balance;
            channel.timelock = 0;
            state.locked_funds += increase;
        } else if new_balance < current {
            if armed == 0 {
                let timelock = ctx.block.saturating_add(ctx.config.delay_blocks);
                let channel = account_mut(state, &channel_id)?;
                consume_nonce(&mut channel.last_used_nonce, nonce)?;
                channel.timelock = timelock;

                tracing::debug!(accountant = %ctx.this, channel_id = %channel_id, timelock, "balance decrease requested");
                ctx.emit(Event::ChannelBalanceDecreaseRequested {
                    accountant: ctx.this,
                    channel_id,
                    timelock,
                });
                return Ok(BalanceUpdate::DecreaseRequested { timelock });
            }
            if ctx.block < armed {
                return Err(SettlementError::TimelockActive { until: armed });
            }
            let channel = account_mut(state, &channel_id)?;
            consume_nonce(&mut channel.last_used_nonce, nonce)?;
            channel.balance = new_balance;
            channel.timelock = 0;
            state.locked_funds -= current - new_balance;
        } else {
            let channel = account_mut(state, &channel_id)?;
            consume_nonce(&mut channel.last_used_nonce, nonce)?;
        }

        tracing::info!(accountant = %ctx.this, channel_id = %channel_id, balance = new_balance, "channel balance updated");
        ctx.emit(Event::ChannelBalanceUpdated {
            accountant: ctx.this,
            channel_id,
            balance: new_balance,
        });
        check_invariants(state);
        Ok(BalanceUpdate::Applied {
            balance: new_balance,
        })
    }

    fn rebalance_channel(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
    ) -> Result<Amount> {
        ensure_not_closed(state)?;
        let channel = account(state, &channel_id)?;
        if channel.balance >= channel.loan {
            return Err(SettlementError::InvalidState(format!(
                "channel balance {} already covers loan {}",
                channel.balance, channel.loan
            )));
        }
        let wanted = channel.loan - channel.balance;

        let custody = ctx.custody();
        let required = state.required_balance(state.locked_funds + wanted, state.total_loan);
        let increase = if custody >= required {
            wanted
        } else {
            enter_punishment(ctx, state)?;
            let reserve = state.stake.max(state.punishment.amount);
            custody
                .saturating_sub(reserve)
                .saturating_sub(state.locked_funds)
                .min(wanted)
        };

        let channel = account_mut(state, &channel_id)?;
        channel.balance += increase;
        let balance = channel.balance;
        state.locked_funds += increase;

        tracing::debug!(accountant = %ctx.this, channel_id = %channel_id, increase, wanted, "channel rebalanced");
        ctx.emit(Event::ChannelBalanceUpdated {
            accountant: ctx.this,
            channel_id,
            balance,
        });
        check_invariants(state);
        Ok(increase)
    }

    fn increase_loan(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        amount: Amount,
    ) -> Result<()> {
        ensure_not_closed(state)?;
        if amount == 0 {
            return Err(SettlementError::ZeroAmount("loan increase"));
        }
        let channel = account(state, &channel_id)?;
        let new_loan = channel
            .loan
            .checked_add(amount)
            .ok_or(SettlementError::Overflow("loan"))?;
        if new_loan > state.max_loan {
            return Err(SettlementError::LoanLimitExceeded {
                requested: new_loan,
                limit: state.max_loan,
            });
        }
        let balance = channel
            .balance
            .checked_add(amount)
            .ok_or(SettlementError::Overflow("channel balance"))?;

        // Only the pulled amount is locked. A balance left below its loan by
        // earlier settlements is refilled through rebalance.
        let channel = account_mut(state, &channel_id)?;
        channel.loan = new_loan;
        channel.balance = balance;
        state.locked_funds += amount;
        state.total_loan += amount;

        ctx.pull(ctx.caller, amount)?;

        tracing::info!(accountant = %ctx.this, channel_id = %channel_id, loan = new_loan, "loan increased");
        ctx.emit(Event::NewLoan {
            accountant: ctx.this,
            channel_id,
            loan: new_loan,
        });
        ctx.emit(Event::ChannelBalanceUpdated {
            accountant: ctx.this,
            channel_id,
            balance,
        });
        check_invariants(state);
        Ok(())
    }

    fn decrease_loan(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        amount: Amount,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<Amount> {
        ensure_not_closed(state)?;
        if amount == 0 {
            return Err(SettlementError::ZeroAmount("loan decrease"));
        }
        let channel = account(state, &channel_id)?;
        ensure_fresh_nonce(channel.last_used_nonce, nonce)?;
        let message = LoanReturn {
            channel_id,
            amount,
            nonce,
        };
        authorize(&ctx.caller, &channel.party, &message, authorization, "loan return")?;
        if amount > channel.loan {
            return Err(SettlementError::InsufficientFunds {
                available: channel.loan,
                required: amount,
            });
        }

        // Obligations once the full amount is returned
        let remaining_loan = channel.loan - amount;
        let released = channel.balance.saturating_sub(remaining_loan);
        let required = state.required_balance(
            state.locked_funds - released,
            state.total_loan - amount,
        );
        let custody = ctx.custody();

        let paid = if custody >= required.saturating_add(amount) {
            amount
        } else {
            enter_punishment(ctx, state)?;
            custody.saturating_sub(required).min(amount)
        };

        let channel = account_mut(state, &channel_id)?;
        consume_nonce(&mut channel.last_used_nonce, nonce)?;
        let previous_balance = channel.balance;
        channel.loan -= paid;
        channel.balance = previous_balance.min(channel.loan);
        let balance = channel.balance;
        let beneficiary = channel.beneficiary;
        state.total_loan -= paid;
        state.locked_funds -= previous_balance - balance;

        ctx.pay(beneficiary, paid)?;

        tracing::info!(accountant = %ctx.this, channel_id = %channel_id, requested = amount, paid, "loan returned");
        ctx.emit(Event::LoanReturned {
            accountant: ctx.this,
            channel_id,
            amount: paid,
        });
        if balance != previous_balance {
            ctx.emit(Event::ChannelBalanceUpdated {
                accountant: ctx.this,
                channel_id,
                balance,
            });
        }
        check_invariants(state);
        Ok(paid)
    }

    fn set_beneficiary(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        beneficiary: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()> {
        if beneficiary.is_zero() {
            return Err(SettlementError::ZeroAddress("beneficiary"));
        }
        let channel = account(state, &channel_id)?;
        ensure_fresh_nonce(channel.last_used_nonce, nonce)?;
        let message = BeneficiaryChange {
            channel_id,
            beneficiary,
            nonce,
        };
        authorize(&ctx.caller, &channel.party, &message, authorization, "beneficiary change")?;

        let channel = account_mut(state, &channel_id)?;
        consume_nonce(&mut channel.last_used_nonce, nonce)?;
        channel.beneficiary = beneficiary;

        ctx.emit(Event::BeneficiaryChanged {
            accountant: ctx.this,
            channel_id,
            beneficiary,
        });
        Ok(())
    }

    fn set_fee(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        fee: u16,
    ) -> Result<BlockNumber> {
        ensure_operator(ctx, state)?;
        ensure_not_closed(state)?;
        if fee > ctx.config.max_fee {
            return Err(SettlementError::FeeTooHigh {
                fee,
                max: ctx.config.max_fee,
            });
        }
        if ctx.block < state.last_fee.valid_from {
            return Err(SettlementError::TimelockActive {
                until: state.last_fee.valid_from,
            });
        }

        let valid_from = ctx.block.saturating_add(ctx.config.delay_blocks);
        state.previous_fee = state.last_fee;
        state.last_fee = AccountantFee {
            value: fee,
            valid_from,
        };

        tracing::info!(accountant = %ctx.this, fee, valid_from, "accountant fee scheduled");
        ctx.emit(Event::FeeUpdated {
            accountant: ctx.this,
            fee,
            valid_from,
        });
        Ok(valid_from)
    }

    fn increase_stake(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        additional: Amount,
    ) -> Result<()> {
        ensure_operator(ctx, state)?;
        ensure_not_closed(state)?;
        if additional == 0 {
            return Err(SettlementError::ZeroAmount("stake increase"));
        }

        // Free custody counts towards the new stake; only the rest is pulled
        let available = state.available_balance(ctx.custody());
        let shortfall = additional.saturating_sub(available);
        state.stake = state
            .stake
            .checked_add(additional)
            .ok_or(SettlementError::Overflow("stake"))?;

        ctx.pull(ctx.caller, shortfall)?;

        tracing::info!(accountant = %ctx.this, stake = state.stake, pulled = shortfall, "stake increased");
        ctx.emit(Event::StakeIncreased {
            accountant: ctx.this,
            stake: state.stake,
        });
        Ok(())
    }

    fn set_operator(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        operator: Address,
    ) -> Result<()> {
        ensure_operator(ctx, state)?;
        ensure_not_closed(state)?;
        if operator.is_zero() {
            return Err(SettlementError::ZeroAddress("accountant operator"));
        }
        state.operator = operator;

        tracing::info!(accountant = %ctx.this, operator = %operator, "operator changed");
        ctx.emit(Event::OperatorChanged {
            accountant: ctx.this,
            operator,
        });
        Ok(())
    }

    fn set_max_loan(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        max_loan: Amount,
    ) -> Result<()> {
        ensure_operator(ctx, state)?;
        ensure_status(state, &[AccountantStatus::Active])?;
        state.max_loan = max_loan;

        ctx.emit(Event::MaxLoanUpdated {
            accountant: ctx.this,
            max_loan,
        });
        Ok(())
    }

    fn withdraw(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<()> {
        ensure_operator(ctx, state)?;
        ensure_status(state, &[AccountantStatus::Active])?;
        if beneficiary.is_zero() {
            return Err(SettlementError::ZeroAddress("withdrawal beneficiary"));
        }
        if amount == 0 {
            return Err(SettlementError::ZeroAmount("withdrawal"));
        }
        let available = state.available_balance(ctx.custody());
        if amount > available {
            return Err(SettlementError::InsufficientFunds {
                available,
                required: amount,
            });
        }

        ctx.pay(beneficiary, amount)?;

        tracing::info!(accountant = %ctx.this, beneficiary = %beneficiary, amount, "funds withdrawn");
        ctx.emit(Event::FundsWithdrawn {
            accountant: ctx.this,
            beneficiary,
            amount,
        });
        Ok(())
    }

    fn pause_channel_opening(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
    ) -> Result<()> {
        ensure_operator(ctx, state)?;
        state.status = AccountantStateMachine::transition(state.status, AccountantEvent::OpeningPaused)?;
        ctx.emit(Event::ChannelOpeningPaused {
            accountant: ctx.this,
        });
        Ok(())
    }

    fn resume_channel_opening(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
    ) -> Result<()> {
        ensure_operator(ctx, state)?;
        state.status =
            AccountantStateMachine::transition(state.status, AccountantEvent::OpeningResumed)?;
        ctx.emit(Event::ChannelOpeningResumed {
            accountant: ctx.this,
        });
        Ok(())
    }

    fn resolve_emergency(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
    ) -> Result<EmergencyResolution> {
        ensure_status(state, &[AccountantStatus::Punishment])?;

        let unit_penalty = (state.locked_funds.saturating_mul(Amount::from(ctx.config.punishment_bps)))
            .div_ceil(10_000);
        let blocks_passed = ctx.block.saturating_sub(state.punishment.activation_block);
        let units = blocks_passed
            .div_ceil(ctx.config.unit_blocks.max(1))
            .saturating_sub(1);
        let penalty = Amount::from(units).saturating_mul(unit_penalty);
        state.punishment.amount = state.punishment.amount.saturating_add(penalty);

        let topped_up = state.minimal_expected_balance().saturating_sub(ctx.custody());
        state.status =
            AccountantStateMachine::transition(state.status, AccountantEvent::EmergencyResolved)?;

        ctx.pull(ctx.caller, topped_up)?;

        tracing::info!(
            accountant = %ctx.this,
            penalty,
            units,
            topped_up,
            "punishment resolved"
        );
        ctx.emit(Event::PunishmentDeactivated {
            accountant: ctx.this,
            block: ctx.block,
            penalty,
        });
        Ok(EmergencyResolution { penalty, topped_up })
    }

    fn close(&self, ctx: &mut CallContext<'_>, state: &mut AccountantState) -> Result<BlockNumber> {
        ensure_operator(ctx, state)?;
        state.status = AccountantStateMachine::transition(state.status, AccountantEvent::Closed)?;
        state.closing_timelock = ctx.block.saturating_add(ctx.config.closing_delay_blocks);

        tracing::info!(accountant = %ctx.this, timelock = state.closing_timelock, "accountant closed");
        ctx.emit(Event::AccountantClosed {
            accountant: ctx.this,
            block: ctx.block,
            timelock: state.closing_timelock,
        });
        Ok(state.closing_timelock)
    }

    fn get_stake_back(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        beneficiary: Address,
    ) -> Result<Amount> {
        ensure_operator(ctx, state)?;
        ensure_status(state, &[AccountantStatus::Closed])?;
        if ctx.block <= state.closing_timelock {
            return Err(SettlementError::TimelockActive {
                until: state.closing_timelock,
            });
        }
        if state.stake_returned {
            return Err(SettlementError::InvalidState("stake already returned".into()));
        }
        if beneficiary.is_zero() {
            return Err(SettlementError::ZeroAddress("stake beneficiary"));
        }

        let amount = ctx.custody().saturating_sub(state.punishment.amount);
        state.stake_returned = true;

        ctx.pay(beneficiary, amount)?;

        tracing::info!(accountant = %ctx.this, beneficiary = %beneficiary, amount, "stake returned");
        ctx.emit(Event::StakeReturned {
            accountant: ctx.this,
            beneficiary,
            amount,
        });
        Ok(amount)
    }

    fn set_funds_destination_by_cheque(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        destination: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()> {
        if destination.is_zero() {
            return Err(SettlementError::ZeroAddress("funds destination"));
        }
        ensure_fresh_nonce(state.last_used_nonce, nonce)?;
        let change = FundsDestinationChange { destination, nonce };
        authorize(&ctx.caller, &state.operator, &change, authorization, "funds destination")?;
        consume_nonce(&mut state.last_used_nonce, nonce)?;

        let previous = state.funds_destination();
        state.set_funds_destination_unchecked(destination);
        ctx.emit(Event::DestinationChanged {
            instance: ctx.this,
            previous,
            destination,
        });
        Ok(())
    }
}
