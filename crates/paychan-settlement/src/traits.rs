use paychan_core::state_machine::AccountantStatus;
use paychan_core::types::{Address, Amount, BlockNumber, ChannelId, Nonce};
use paychan_crypto::Signature;

use crate::auth::Authorization;
use crate::context::CallContext;
use crate::error::Result;
use crate::types::{
    AccountantState, BalanceUpdate, ChannelState, EmergencyResolution, SettledPromise,
};

/// Parameters a channel instance is initialized with.
#[derive(Debug, Clone, Copy)]
pub struct ChannelInit {
    pub ledger: Address,
    pub dex: Address,
    /// Identity controlling the channel.
    pub identity: Address,
    pub accountant: Address,
    pub accountant_operator: Address,
    /// Paid to the initializer out of the channel's custody.
    pub fee: Amount,
}

/// Parameters an accountant instance is initialized with.
#[derive(Debug, Clone, Copy)]
pub struct AccountantInit {
    pub ledger: Address,
    pub operator: Address,
    pub fee: u16,
    pub max_loan: Amount,
}

/// Consumer channel logic.
///
/// Implementations are stateless: every call receives the instance state it
/// operates on. Many instances share one implementation.
pub trait ChannelLogic: Send + Sync {
    /// One-time setup; pays `init.fee` to the caller.
    fn initialize(&self, ctx: &mut CallContext<'_>, state: &mut ChannelState, init: ChannelInit)
        -> Result<()>;

    /// Settle a cumulative promise signed by the channel operator. The newly
    /// owed value goes to the hub, the transactor fee to the caller.
    fn settle_promise(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut ChannelState,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise>;

    /// Start the exit timelock. Returns the block the exit can be finalized at.
    fn request_exit(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut ChannelState,
        beneficiary: Address,
        valid_until: BlockNumber,
        authorization: &Authorization,
    ) -> Result<BlockNumber>;

    /// Sweep all custody to the exit beneficiary once the timelock passed.
    fn finalize_exit(&self, ctx: &mut CallContext<'_>, state: &mut ChannelState) -> Result<Amount>;

    fn set_funds_destination_by_cheque(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut ChannelState,
        destination: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()>;
}

/// Accountant (hub) logic.
pub trait AccountantLogic: Send + Sync {
    fn initialize(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        init: AccountantInit,
    ) -> Result<()>;

    /// Open the hub-side record for `party`, pulling `loan` from the caller.
    fn open_channel(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        party: Address,
        beneficiary: Address,
        loan: Amount,
    ) -> Result<ChannelId>;

    /// Settle a cumulative promise signed by the hub operator.
    #[allow(clippy::too_many_arguments)]
    fn settle_promise(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise>;

    /// Settle, then restore the channel balance to its loan if it fell below.
    /// A closed hub settles without rebalancing.
    #[allow(clippy::too_many_arguments)]
    fn settle_and_rebalance(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        amount: Amount,
        transactor_fee: Amount,
        lock: &[u8; 32],
        signature: &Signature,
    ) -> Result<SettledPromise> {
        let settled =
            self.settle_promise(ctx, state, channel_id, amount, transactor_fee, lock, signature)?;
        let needs_rebalance = state.status != AccountantStatus::Closed
            && state
                .channel(&channel_id)
                .is_some_and(|c| c.balance < c.loan);
        if needs_rebalance {
            self.rebalance_channel(ctx, state, channel_id)?;
        }
        Ok(settled)
    }

    fn update_channel_balance(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        new_balance: Amount,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<BalanceUpdate>;

    /// Raise the balance back to the loan. Returns the increase applied.
    fn rebalance_channel(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
    ) -> Result<Amount>;

    fn increase_loan(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        amount: Amount,
    ) -> Result<()>;

    /// Return part of a loan to the channel beneficiary. Returns what was paid.
    fn decrease_loan(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        amount: Amount,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<Amount>;

    fn set_beneficiary(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        channel_id: ChannelId,
        beneficiary: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()>;

    /// Schedule a new fee. Returns the block it takes effect.
    fn set_fee(&self, ctx: &mut CallContext<'_>, state: &mut AccountantState, fee: u16)
        -> Result<BlockNumber>;

    fn increase_stake(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        additional: Amount,
    ) -> Result<()>;

    fn set_operator(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        operator: Address,
    ) -> Result<()>;

    fn set_max_loan(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        max_loan: Amount,
    ) -> Result<()>;

    fn withdraw(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<()>;

    fn pause_channel_opening(&self, ctx: &mut CallContext<'_>, state: &mut AccountantState)
        -> Result<()>;

    fn resume_channel_opening(&self, ctx: &mut CallContext<'_>, state: &mut AccountantState)
        -> Result<()>;

    /// Charge the accrued penalty, top up any shortfall from the caller and
    /// return to Active.
    fn resolve_emergency(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
    ) -> Result<EmergencyResolution>;

    /// Close the hub. Returns the block the stake can be reclaimed after.
    fn close(&self, ctx: &mut CallContext<'_>, state: &mut AccountantState) -> Result<BlockNumber>;

    fn get_stake_back(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        beneficiary: Address,
    ) -> Result<Amount>;

    fn set_funds_destination_by_cheque(
        &self,
        ctx: &mut CallContext<'_>,
        state: &mut AccountantState,
        destination: Address,
        nonce: Nonce,
        authorization: &Authorization,
    ) -> Result<()>;
}
