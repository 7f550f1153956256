use super::money::{Amount, Balance, round_money};
use super::wallet::InstructorId;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type CourseId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

/// A course sale as reported by the payment collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub course_id: CourseId,
    #[serde(default)]
    pub course_title: Option<String>,
    pub instructor: InstructorId,
    pub amount: Decimal,
    pub status: OrderStatus,
}

/// Platform and instructor shares of one sale.
///
/// `commission + instructor_share == total` holds exactly for every split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSplit {
    pub total: Balance,
    pub commission: Balance,
    pub instructor_share: Balance,
}

impl CommissionSplit {
    pub fn compute(total: Amount, rate: Decimal) -> Self {
        let commission = Balance::new(round_money(total.value() * rate));
        let total = Balance::from(total);
        Self {
            total,
            commission,
            instructor_share: total - commission,
        }
    }
}

/// The platform's record of one recognized sale. At most one exists per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub order_id: String,
    pub course_id: CourseId,
    pub course_title: Option<String>,
    pub instructor: InstructorId,
    pub total_amount: Balance,
    pub commission_amount: Balance,
    pub created_at: DateTime<Utc>,
}

impl RevenueRecord {
    pub fn instructor_share(&self) -> Balance {
        self.total_amount - self.commission_amount
    }
}

/// Validates that an order may be recognized and returns its sale amount.
pub fn completed_sale_amount(order: &Order) -> Result<Amount> {
    if order.status != OrderStatus::Completed {
        return Err(LedgerError::Validation {
            message: format!(
                "order {} is {:?}, only completed orders earn revenue",
                order.order_id, order.status
            ),
            fields: vec!["status"],
        });
    }
    if order.order_id.trim().is_empty() {
        return Err(LedgerError::Validation {
            message: "order id must not be empty".to_string(),
            fields: vec!["order_id"],
        });
    }
    Amount::new(order.amount)
}
