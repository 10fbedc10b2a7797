//! Consumer channel: custodies an identity's funds and pays its hub against
//! signed cumulative promises.

use paychan_core::types::{Address, Amount, BlockNumber, Nonce};
use paychan_core::FundsRecoverable;
use paychan_crypto::{ExitRequest, FundsDestinationChange, Promise, Signature};

use crate::auth::{authorize, consume_nonce, ensure_fresh_nonce, require_signature, Authorization};
use crate::context::CallContext;
use crate::error::{Result, SettlementError};
use crate::events::Event;
use crate::traits::{ChannelInit, ChannelLogic};
use crate::types::{ChannelState, HubBinding, PendingExit, SettledPromise};

/// The stock channel logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelImplementation;

fn ensure_initialized(state: &ChannelState) -> Result<()> {
    if !state.initialized {
        return Err(SettlementError::NotInitialized);
    }
    Ok(())
}

impl ChannelLogic for ChannelImplementation {
    fn initialize(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut ChannelState,
        init: ChannelInit,
    ) -> Result<()> {
        if state.initialized {
            return Err(SettlementError::AlreadyInitialized);
        }
        if init.identity.is_zero() {
            return Err(SettlementError::ZeroAddress("channel identity"));
        }
        if init.accountant.is_zero() {
            return Err(SettlementError::ZeroAddress("accountant"));
        }
        if init.ledger.is_zero() {
            return Err(SettlementError::ZeroAddress("ledger"));
        }

        state.initialized = true;
        state.ledger = init.ledger;
        state.dex = init.dex;
        state.operator = init.identity;
        state.hub = HubBinding {
            operator: init.accountant_operator,
            contract: init.accountant,
            settled: 0,
        };

        ctx.pay(ctx.caller, init.fee)?;

        tracing::debug!(channel = %ctx.this, identity = %init.identity, fee = init.fee, "channel initialized");
        ctx.emit(Event::ChannelInitialized {
            channel: ctx.this,
            operator: init.identity,
            accountant: init.accountant,
        });
        Ok(())
    }

    fn settle_promise(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut ChannelState,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise> {
        ensure_initialized(state)?;

        let promise = Promise::new(ctx.this.to_word(), amount, transactor_fee, lock);
        require_signature(&promise, signature, &state.operator, "channel promise")?;

        let settled = state.hub.settled;
        let owed = amount
            .checked_sub(settled)
            .filter(|owed| *owed > 0)
            .ok_or(SettlementError::NothingToSettle {
                promised: amount,
                settled,
            })?;

        // Never pay out more than the channel holds
        let custody = ctx.custody();
        let unpaid = owed.min(custody);
        if unpaid == 0 || unpaid < transactor_fee {
            return Err(SettlementError::InsufficientFunds {
                available: unpaid,
                required: transactor_fee.max(1),
            });
        }

        state.hub.settled = settled + unpaid;
        let payout = unpaid - transactor_fee;

        ctx.pay(state.hub.contract, payout)?;
        ctx.pay(ctx.caller, transactor_fee)?;

        tracing::info!(
            channel = %ctx.this,
            amount = unpaid,
            total_settled = state.hub.settled,
            "channel promise settled"
        );
        ctx.emit(Event::ChannelPromiseSettled {
            channel: ctx.this,
            accountant: state.hub.contract,
            amount: unpaid,
            total_settled: state.hub.settled,
        });

        Ok(SettledPromise {
            amount: unpaid,
            accountant_fee: 0,
            transactor_fee,
            payout,
            total_settled: state.hub.settled,
        })
    }

    fn request_exit(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut ChannelState,
        beneficiary: Address,
        valid_until: BlockNumber,
        authorization: &Authorization,
    ) -> Result<BlockNumber> {
        ensure_initialized(state)?;
        if let Some(pending) = state.exit {
            return Err(SettlementError::InvalidState(format!(
                "exit already requested, finalizable at block {}",
                pending.timelock
            )));
        }
        if beneficiary.is_zero() {
            return Err(SettlementError::ZeroAddress("exit beneficiary"));
        }
        if valid_until < ctx.block {
            return Err(SettlementError::InvalidState(format!(
                "exit request expired at block {valid_until}"
            )));
        }
        let timelock = ctx.block.saturating_add(ctx.config.delay_blocks);
        // A request stays replayable until valid_until, so it must expire before the exit can finish
        if timelock <= valid_until {
            return Err(SettlementError::InvalidState(format!(
                "valid_until {valid_until} must be before the timelock {timelock}"
            )));
        }

        let request = ExitRequest {
            channel: ctx.this,
            beneficiary,
            valid_until,
        };
        authorize(&ctx.caller, &state.operator, &request, authorization, "exit request")?;

        state.exit = Some(PendingExit {
            timelock,
            beneficiary,
        });

        tracing::debug!(channel = %ctx.this, timelock, "exit requested");
        ctx.emit(Event::ExitRequested {
            channel: ctx.this,
            beneficiary,
            timelock,
        });
        Ok(timelock)
    }

    fn finalize_exit(&self, ctx: &mut CallContext<'_>, state: &mut ChannelState) -> Result<Amount> {
        let pending = state
            .exit
            .ok_or_else(|| SettlementError::InvalidState("no exit requested".into()))?;
        if ctx.block < pending.timelock {
            return Err(SettlementError::TimelockActive {
                until: pending.timelock,
            });
        }

        let amount = ctx.custody();
        state.exit = None;
        state.exited = true;

        ctx.pay(pending.beneficiary, amount)?;

        tracing::info!(channel = %ctx.this, beneficiary = %pending.beneficiary, amount, "exit finalized");
        ctx.emit(Event::ExitFinalized {
            channel: ctx.this,
            beneficiary: pending.beneficiary,
            amount,
        });
        Ok(amount)
    }

    fn set_funds_destination_by_cheque(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut ChannelState,
        destination: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()> {
        ensure_initialized(state)?;
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
