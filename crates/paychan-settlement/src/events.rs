//! Observable protocol events, recorded in the runtime's event log.

use paychan_core::types::{Address, Amount, BlockNumber, ChannelId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Registry
    RegisteredAccountant {
        accountant: Address,
        operator: Address,
    },
    RegisteredIdentity {
        identity: Address,
        accountant: Address,
    },
    ChannelDeployed {
        identity: Address,
        accountant: Address,
        channel: Address,
    },

    // Channel
    ChannelInitialized {
        channel: Address,
        operator: Address,
        accountant: Address,
    },
    ChannelPromiseSettled {
        channel: Address,
        accountant: Address,
        amount: Amount,
        total_settled: Amount,
    },
    ExitRequested {
        channel: Address,
        beneficiary: Address,
        timelock: BlockNumber,
    },
    ExitFinalized {
        channel: Address,
        beneficiary: Address,
        amount: Amount,
    },

    // Accountant
    ChannelOpened {
        accountant: Address,
        channel_id: ChannelId,
        initial_balance: Amount,
    },
    PromiseSettled {
        accountant: Address,
        channel_id: ChannelId,
        beneficiary: Address,
        amount: Amount,
        total_settled: Amount,
    },
    ChannelBalanceUpdated {
        accountant: Address,
        channel_id: ChannelId,
        balance: Amount,
    },
    ChannelBalanceDecreaseRequested {
        accountant: Address,
        channel_id: ChannelId,
        timelock: BlockNumber,
    },
    NewLoan {
        accountant: Address,
        channel_id: ChannelId,
        loan: Amount,
    },
    LoanReturned {
        accountant: Address,
        channel_id: ChannelId,
        amount: Amount,
    },
    BeneficiaryChanged {
        accountant: Address,
        channel_id: ChannelId,
        beneficiary: Address,
    },
    PunishmentActivated {
        accountant: Address,
        block: BlockNumber,
    },
    PunishmentDeactivated {
        accountant: Address,
        block: BlockNumber,
        penalty: Amount,
    },
    FeeUpdated {
        accountant: Address,
        fee: u16,
        valid_from: BlockNumber,
    },
    StakeIncreased {
        accountant: Address,
        stake: Amount,
    },
    FundsWithdrawn {
        accountant: Address,
        beneficiary: Address,
        amount: Amount,
    },
    MaxLoanUpdated {
        accountant: Address,
        max_loan: Amount,
    },
    OperatorChanged {
        accountant: Address,
        operator: Address,
    },
    ChannelOpeningPaused {
        accountant: Address,
    },
    ChannelOpeningResumed {
        accountant: Address,
    },
    AccountantClosed {
        accountant: Address,
        block: BlockNumber,
        timelock: BlockNumber,
    },
    StakeReturned {
        accountant: Address,
        beneficiary: Address,
        amount: Amount,
    },

    // Shared
    DestinationChanged {
        instance: Address,
        previous: Option<Address>,
        destination: Address,
    },
}
