use paychan_core::config::ProtocolConfig;
use paychan_core::ledger::ValueLedger;
use paychan_core::types::{Address, Amount, BlockNumber};

use crate::error::Result;
use crate::events::Event;

/// Everything one instance sees during one call: who called it, its own
/// address, the current block, and the ledger its value lives in.
pub struct CallContext<'a> {
    pub caller: Address,
    /// Address of the instance being called.
    pub this: Address,
    pub block: BlockNumber,
    pub config: &'a ProtocolConfig,
    ledger: &'a dyn ValueLedger,
    events: &'a mut Vec<Event>,
}

impl<'a> CallContext<'a> {
    pub fn new(
        caller: Address,
        this: Address,
        block: BlockNumber,
        config: &'a ProtocolConfig,
        ledger: &'a dyn ValueLedger,
        events: &'a mut Vec<Event>,
    ) -> Self {
        Self {
            caller,
            this,
            block,
            config,
            ledger,
            events,
        }
    }

    /// Value this instance holds on the ledger.
    pub fn custody(&self) -> Amount {
        self.ledger.balance_of(&self.this)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    /// Send `amount` from this instance to `to`. Zero amounts are skipped.
    pub fn pay(&self, to: Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.ledger.transfer(self.this, to, amount)?;
        Ok(())
    }

    /// Pull `amount` from `from` into this instance, spending the allowance
    /// `from` granted this instance.
    pub fn pull(&self, from: Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.ledger.transfer_from(self.this, from, self.this, amount)?;
        Ok(())
    }

    pub fn emit(&mut self, event: Event) {
        tracing::debug!(instance = %self.this, block = self.block, event = ?event, "event");
        self.events.push(event);
    }
}
