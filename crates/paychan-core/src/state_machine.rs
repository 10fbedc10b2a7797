use std::fmt;

use crate::error::CoreError;
use crate::types::Amount;

/// The four statuses of an accountant (hub).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AccountantStatus {
    /// Normal operation.
    Active,
    /// Operator paused new channel openings. Everything else keeps working.
    Paused,
    /// Custodied value fell short of obligations; a penalty accrues until resolved.
    Punishment,
    /// Operator closed the hub. Final state.
    Closed,
}

impl AccountantStatus {
    /// Whether this is a final (terminal) status.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for AccountantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Paused => write!(f, "Paused"),
            Self::Punishment => write!(f, "Punishment"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Events that drive accountant status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountantEvent {
    /// Operator paused channel opening.
    OpeningPaused,
    /// Operator resumed channel opening.
    OpeningResumed,
    /// A rebalance or loan return found custodied value below obligations.
    ShortfallDetected,
    /// The accrued penalty and shortfall were paid in.
    EmergencyResolved,
    /// Operator closed the hub.
    Closed,
}

/// Accountant status transitions.
///
/// Valid transitions:
/// - Active → Paused (OpeningPaused)
/// - Paused → Active (OpeningResumed)
/// - Active → Punishment (ShortfallDetected)
/// - Paused → Punishment (ShortfallDetected)
/// - Punishment → Punishment (ShortfallDetected)
/// - Punishment → Active (EmergencyResolved)
/// - Active → Closed (Closed)
///
/// Resolution always lands in Active. A pause on channel opening that was in
/// place before a shortfall does not survive punishment; the operator pauses
/// again if needed.
pub struct AccountantStateMachine;

impl AccountantStateMachine {
    /// Attempt a status transition based on an event.
    pub fn transition(
        current: AccountantStatus,
        event: AccountantEvent,
    ) -> Result<AccountantStatus, CoreError> {
        let next = match (current, event) {
            (AccountantStatus::Active, AccountantEvent::OpeningPaused) => AccountantStatus::Paused,
            (AccountantStatus::Paused, AccountantEvent::OpeningResumed) => AccountantStatus::Active,

            (AccountantStatus::Active, AccountantEvent::ShortfallDetected)
            | (AccountantStatus::Paused, AccountantEvent::ShortfallDetected)
            | (AccountantStatus::Punishment, AccountantEvent::ShortfallDetected) => {
                AccountantStatus::Punishment
            }

            (AccountantStatus::Punishment, AccountantEvent::EmergencyResolved) => {
                AccountantStatus::Active
            }

            (AccountantStatus::Active, AccountantEvent::Closed) => AccountantStatus::Closed,

            _ => {
                let target = match event {
                    AccountantEvent::OpeningPaused => AccountantStatus::Paused,
                    AccountantEvent::OpeningResumed => AccountantStatus::Active,
                    AccountantEvent::ShortfallDetected => AccountantStatus::Punishment,
                    AccountantEvent::EmergencyResolved => AccountantStatus::Active,
                    AccountantEvent::Closed => AccountantStatus::Closed,
                };
                return Err(CoreError::InvalidStatusTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %next,
            event = ?event,
            "accountant status transition"
        );

        Ok(next)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: AccountantStatus, event: AccountantEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

/// Observable lifecycle phase of a channel instance.
///
/// Closed is logical only: the instance persists after its exit drained it
/// and becomes Operating again if value is sent to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChannelPhase {
    Uninitialized,
    Operating,
    ExitRequested,
    Closed,
}

impl ChannelPhase {
    /// Derive the phase from a channel's flags and its custodied value.
    pub fn derive(initialized: bool, exit_pending: bool, exited: bool, custody: Amount) -> Self {
        if !initialized {
            Self::Uninitialized
        } else if exit_pending {
            Self::ExitRequested
        } else if exited && custody == 0 {
            Self::Closed
        } else {
            Self::Operating
        }
    }
}

impl fmt::Display for ChannelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Operating => write!(f, "Operating"),
            Self::ExitRequested => write!(f, "ExitRequested"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
