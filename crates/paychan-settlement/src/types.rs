use paychan_core::state_machine::{AccountantStatus, ChannelPhase};
use paychan_core::types::{Address, Amount, BlockNumber, ChannelId, Nonce};
use paychan_core::{FundsRecoverable, LedgerBound, Owned};
use paychan_crypto::Packed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hub-side channel identifier: `keccak256(party ‖ accountant)`.
pub fn channel_id(party: &Address, accountant: &Address) -> ChannelId {
    ChannelId(Packed::new().address(party).address(accountant).hash())
}

/// Fee in hundredths of a percent, `round_up(round_up(amount * fee / 100, 100) / 100)`.
pub fn calculate_fee(amount: Amount, fee: u16) -> Amount {
    let scaled = amount.saturating_mul(Amount::from(fee)) / 100;
    round_up(scaled, 100) / 100
}

/// Smallest multiple of `m` not below `a`.
fn round_up(a: Amount, m: Amount) -> Amount {
    a.div_ceil(m).saturating_mul(m)
}

/// One hub-side channel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    /// Identity that owns the channel.
    pub party: Address,
    /// Where settled promises are paid.
    pub beneficiary: Address,
    /// Currently settle-able value.
    pub balance: Amount,
    /// Cumulative amount already settled.
    pub settled: Amount,
    /// Value the party deposited with the hub.
    pub loan: Amount,
    pub last_used_nonce: Nonce,
    /// Block a requested balance decrease becomes applicable; 0 when none is armed.
    pub timelock: BlockNumber,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountantFee {
    /// Hundredths of a percent.
    pub value: u16,
    pub valid_from: BlockNumber,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punishment {
    pub activation_block: BlockNumber,
    /// Penalty accrued over all punishment episodes.
    pub amount: Amount,
}

/// Accountant (hub) instance state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountantState {
    pub initialized: bool,
    pub ledger: Address,
    /// Registry that deployed this instance; the only account allowed to open channels.
    pub registry: Address,
    pub operator: Address,
    pub status: AccountantStatus,
    /// Sum of channel balances.
    pub locked_funds: Amount,
    /// Sum of channel loans.
    pub total_loan: Amount,
    /// Per-channel loan cap.
    pub max_loan: Amount,
    pub stake: Amount,
    pub punishment: Punishment,
    pub last_fee: AccountantFee,
    pub previous_fee: AccountantFee,
    pub channels: BTreeMap<ChannelId, ChannelAccount>,
    pub closing_timelock: BlockNumber,
    pub stake_returned: bool,
    pub funds_destination: Option<Address>,
    /// Nonce of the last funds-destination cheque.
    pub last_used_nonce: Nonce,
}

impl Default for AccountantState {
    fn default() -> Self {
        Self {
            initialized: false,
            ledger: Address::ZERO,
            registry: Address::ZERO,
            operator: Address::ZERO,
            status: AccountantStatus::Active,
            locked_funds: 0,
            total_loan: 0,
            max_loan: 0,
            stake: 0,
            punishment: Punishment::default(),
            last_fee: AccountantFee::default(),
            previous_fee: AccountantFee::default(),
            channels: BTreeMap::new(),
            closing_timelock: 0,
            stake_returned: false,
            funds_destination: None,
            last_used_nonce: 0,
        }
    }
}

impl AccountantState {
    /// Value the hub must keep in custody given the supplied locked/loan totals.
    pub fn required_balance(&self, locked_funds: Amount, total_loan: Amount) -> Amount {
        locked_funds
            .max(total_loan)
            .saturating_add(self.stake.max(self.punishment.amount))
    }

    /// `max(locked, total_loan) + max(stake, punishment)`.
    pub fn minimal_expected_balance(&self) -> Amount {
        self.required_balance(self.locked_funds, self.total_loan)
    }

    /// Custodied value above the minimal expected balance.
    pub fn available_balance(&self, custody: Amount) -> Amount {
        custody.saturating_sub(self.minimal_expected_balance())
    }

    /// Fee schedule in force at `block`.
    pub fn active_fee(&self, block: BlockNumber) -> AccountantFee {
        if block >= self.last_fee.valid_from {
            self.last_fee
        } else {
            self.previous_fee
        }
    }

    /// Hub fee on `amount` at `block`.
    pub fn calculate_accountant_fee(&self, amount: Amount, block: BlockNumber) -> Amount {
        calculate_fee(amount, self.active_fee(block).value)
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountantStatus::Active
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&ChannelAccount> {
        self.channels.get(id)
    }

    /// Aggregates match the per-channel records.
    pub fn accounting_consistent(&self) -> bool {
        let (locked, loans) = self
            .channels
            .values()
            .fold((0 as Amount, 0 as Amount), |(l, t), c| {
                (l.saturating_add(c.balance), t.saturating_add(c.loan))
            });
        locked == self.locked_funds && loans == self.total_loan
    }
}

impl Owned for AccountantState {
    fn owner(&self) -> Address {
        self.operator
    }

    fn set_owner_unchecked(&mut self, owner: Address) {
        self.operator = owner;
    }
}

impl FundsRecoverable for AccountantState {
    fn funds_destination(&self) -> Option<Address> {
        self.funds_destination
    }

    fn set_funds_destination_unchecked(&mut self, destination: Address) {
        self.funds_destination = Some(destination);
    }
}

impl LedgerBound for AccountantState {
    fn ledger_id(&self) -> Address {
        self.ledger
    }
}

/// The hub a channel pays into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubBinding {
    /// Hub operator; informational.
    pub operator: Address,
    /// Hub instance address settled value is sent to.
    pub contract: Address,
    /// Cumulative amount settled to the hub.
    pub settled: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingExit {
    pub timelock: BlockNumber,
    pub beneficiary: Address,
}

/// Consumer channel instance state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelState {
    pub initialized: bool,
    pub ledger: Address,
    pub dex: Address,
    /// Identity that controls the channel and signs its promises.
    pub operator: Address,
    pub hub: HubBinding,
    pub exit: Option<PendingExit>,
    /// An exit was finalized at least once.
    pub exited: bool,
    pub funds_destination: Option<Address>,
    pub last_used_nonce: Nonce,
}

impl ChannelState {
    pub fn phase(&self, custody: Amount) -> ChannelPhase {
        ChannelPhase::derive(self.initialized, self.exit.is_some(), self.exited, custody)
    }
}

impl Owned for ChannelState {
    fn owner(&self) -> Address {
        self.operator
    }

    fn set_owner_unchecked(&mut self, owner: Address) {
        self.operator = owner;
    }
}

impl FundsRecoverable for ChannelState {
    fn funds_destination(&self) -> Option<Address> {
        self.funds_destination
    }

    fn set_funds_destination_unchecked(&mut self, destination: Address) {
        self.funds_destination = Some(destination);
    }
}

impl LedgerBound for ChannelState {
    fn ledger_id(&self) -> Address {
        self.ledger
    }
}

/// Outcome of a promise settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledPromise {
    /// Newly settled value (cumulative amount minus what was settled before, clamped).
    pub amount: Amount,
    pub accountant_fee: Amount,
    pub transactor_fee: Amount,
    /// What reached the beneficiary (or the hub, for a channel-side settlement).
    pub payout: Amount,
    pub total_settled: Amount,
}

/// Outcome of a balance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceUpdate {
    /// The new balance is in effect.
    Applied { balance: Amount },
    /// A decrease was requested; it can be applied from `timelock` on.
    DecreaseRequested { timelock: BlockNumber },
}

/// Outcome of leaving punishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyResolution {
    /// Penalty added for this episode.
    pub penalty: Amount,
    /// Value pulled from the caller to restore solvency.
    pub topped_up: Amount,
}
