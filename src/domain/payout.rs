use super::money::Amount;
use super::wallet::InstructorId;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type PayoutId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl PayoutStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Paid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Paid => "PAID",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "PAID" => Ok(Self::Paid),
            _ => Err(LedgerError::Validation {
                message: format!("unknown payout status {s:?}"),
                fields: vec!["status"],
            }),
        }
    }
}

/// Admin decisions that move a payout between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutAction {
    Approve,
    Reject,
    MarkPaid,
}

impl fmt::Display for PayoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::MarkPaid => "mark paid",
        })
    }
}

/// Result of applying an action to a payout's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    To(PayoutStatus),
    /// The payout is already where the action would take it.
    AlreadyApplied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub id: PayoutId,
    pub instructor: InstructorId,
    pub amount: Amount,
    pub status: PayoutStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutRequest {
    pub fn new(id: PayoutId, instructor: InstructorId, amount: Amount) -> Self {
        let now = Utc::now();
        Self {
            id,
            instructor,
            amount,
            status: PayoutStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// The payout state machine.
    ///
    /// PENDING -> APPROVED | REJECTED | PAID, APPROVED -> PAID. Marking an
    /// already PAID payout is reported as `AlreadyApplied`; everything else is an
    /// invalid transition.
    pub fn transition(&self, action: PayoutAction) -> Result<Transition> {
        use PayoutAction::*;
        use PayoutStatus::*;

        match (self.status, action) {
            (Pending, Approve) => Ok(Transition::To(Approved)),
            (Pending, Reject) => Ok(Transition::To(Rejected)),
            (Pending | Approved, MarkPaid) => Ok(Transition::To(Paid)),
            (Paid, MarkPaid) => Ok(Transition::AlreadyApplied),
            (status, action) => Err(LedgerError::InvalidStateTransition {
                payout_id: self.id,
                status,
                action,
            }),
        }
    }

    pub(crate) fn set_status(&mut self, status: PayoutStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payout(status: PayoutStatus) -> PayoutRequest {
        let mut p = PayoutRequest::new(1, 1, Amount::new(dec!(400)).unwrap());
        p.status = status;
        p
    }

    #[test]
    fn test_pending_transitions() {
        let p = payout(PayoutStatus::Pending);
        assert_eq!(
            p.transition(PayoutAction::Approve).unwrap(),
            Transition::To(PayoutStatus::Approved)
        );
        assert_eq!(
            p.transition(PayoutAction::Reject).unwrap(),
            Transition::To(PayoutStatus::Rejected)
        );
        assert_eq!(
            p.transition(PayoutAction::MarkPaid).unwrap(),
            Transition::To(PayoutStatus::Paid)
        );
    }

    #[test]
    fn test_approved_can_only_be_paid() {
        let p = payout(PayoutStatus::Approved);
        assert_eq!(
            p.transition(PayoutAction::MarkPaid).unwrap(),
            Transition::To(PayoutStatus::Paid)
        );
        assert!(matches!(
            p.transition(PayoutAction::Reject),
            Err(LedgerError::InvalidStateTransition { .. })
        ));
        assert!(p.transition(PayoutAction::Approve).is_err());
    }

    #[test]
    fn test_terminal_states() {
        let paid = payout(PayoutStatus::Paid);
        assert_eq!(
            paid.transition(PayoutAction::MarkPaid).unwrap(),
            Transition::AlreadyApplied
        );
        assert!(paid.transition(PayoutAction::Reject).is_err());

        let rejected = payout(PayoutStatus::Rejected);
        for action in [PayoutAction::Approve, PayoutAction::Reject, PayoutAction::MarkPaid] {
            assert!(matches!(
                rejected.transition(action),
                Err(LedgerError::InvalidStateTransition {
                    status: PayoutStatus::Rejected,
                    ..
                })
            ));
        }
        assert!(rejected.status.is_terminal() && paid.status.is_terminal());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("paid".parse::<PayoutStatus>().unwrap(), PayoutStatus::Paid);
        assert_eq!(
            serde_json::to_string(&PayoutStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert!("settled".parse::<PayoutStatus>().is_err());
    }
}
