use super::revenue::CourseId;
use super::wallet::InstructorId;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A course order completed.
    Sale,
    /// An instructor asks for a payout.
    Payout,
    Approve,
    Paid,
    Reject,
}

/// One row of a replayable event log.
///
/// `reference` is the order id for sales and the payout id for admin actions.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct LedgerEvent {
    pub r#type: EventType,
    pub instructor: Option<InstructorId>,
    pub course: Option<CourseId>,
    pub reference: Option<String>,
    pub amount: Option<Decimal>,
    pub upi_id: Option<String>,
}
