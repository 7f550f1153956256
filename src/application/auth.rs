use crate::domain::wallet::InstructorId;
use crate::error::{LedgerError, Result};

/// A verified identity presented at an operation boundary.
///
/// Authentication happens upstream; the engine only checks that the caller
/// holds the capability an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Instructor(InstructorId),
    Admin,
    /// The payment-confirmation collaborator reporting completed orders.
    PaymentProvider,
}

impl Caller {
    pub fn instructor_id(&self) -> Result<InstructorId> {
        match self {
            Self::Instructor(id) => Ok(*id),
            _ => Err(LedgerError::Forbidden {
                required: "instructor",
            }),
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        match self {
            Self::Admin => Ok(()),
            _ => Err(LedgerError::Forbidden { required: "admin" }),
        }
    }

    pub fn require_payment_provider(&self) -> Result<()> {
        match self {
            Self::PaymentProvider => Ok(()),
            _ => Err(LedgerError::Forbidden {
                required: "payment-provider",
            }),
        }
    }
}
