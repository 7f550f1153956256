use crate::domain::money::Balance;
use crate::domain::payout::{PayoutAction, PayoutId, PayoutStatus};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum LedgerError {
    #[error("{message}")]
    #[diagnostic(code(ledger::validation))]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("insufficient withdrawable balance: requested {requested}, withdrawable {withdrawable}")]
    #[diagnostic(code(ledger::insufficient_funds))]
    InsufficientFunds {
        requested: Balance,
        withdrawable: Balance,
    },

    #[error("payout {payout_id} is {status}; cannot {action}")]
    #[diagnostic(code(ledger::invalid_state_transition))]
    InvalidStateTransition {
        payout_id: PayoutId,
        status: PayoutStatus,
        action: PayoutAction,
    },

    #[error("{entity} {id} not found")]
    #[diagnostic(code(ledger::not_found))]
    NotFound { entity: &'static str, id: String },

    /// The wallet invariant broke. Always a bug, never a user error.
    #[error("ledger consistency violation: {0}")]
    #[diagnostic(code(ledger::consistency_violation))]
    ConsistencyViolation(String),

    #[error("caller lacks the {required} capability")]
    #[diagnostic(code(ledger::forbidden))]
    Forbidden { required: &'static str },

    #[error("caller identity missing or malformed")]
    #[diagnostic(code(ledger::unauthenticated))]
    Unauthenticated,

    #[error("CSV error: {0}")]
    #[diagnostic(code(ledger::csv))]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(ledger::io))]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    #[diagnostic(code(ledger::serialization))]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    #[diagnostic(code(ledger::storage))]
    Storage(#[from] rocksdb::Error),

    #[error("internal error: {0}")]
    #[diagnostic(code(ledger::internal))]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Machine readable error kind exposed to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::NotFound { .. } => "not_found",
            Self::ConsistencyViolation(_) => "consistency_violation",
            Self::Forbidden { .. } => "forbidden",
            Self::Unauthenticated => "unauthenticated",
            _ => "internal_error",
        }
    }

    /// True for errors caused by the caller's input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InsufficientFunds { .. }
                | Self::InvalidStateTransition { .. }
                | Self::NotFound { .. }
                | Self::Forbidden { .. }
                | Self::Unauthenticated
        )
    }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
