use super::wallet::InstructorId;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payout destination fields as supplied by an instructor. Blank values count as
/// not supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationInput {
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub account_holder_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub routing_code: Option<String>,
}

impl DestinationInput {
    pub fn upi(upi_id: impl Into<String>) -> Self {
        Self {
            upi_id: Some(upi_id.into()),
            ..Self::default()
        }
    }

    pub fn bank(
        holder: impl Into<String>,
        number: impl Into<String>,
        routing: impl Into<String>,
    ) -> Self {
        Self {
            upi_id: None,
            account_holder_name: Some(holder.into()),
            account_number: Some(number.into()),
            routing_code: Some(routing.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.upi_id,
            &self.account_holder_name,
            &self.account_number,
            &self.routing_code,
        ]
        .into_iter()
        .all(|field| clean(field).is_none())
    }
}

fn clean(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Where an instructor's payouts are sent: a UPI id, or a full bank tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAccount {
    pub instructor: InstructorId,
    pub upi_id: Option<String>,
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub routing_code: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentAccount {
    pub fn new(instructor: InstructorId) -> Self {
        Self {
            instructor,
            upi_id: None,
            account_holder_name: None,
            account_number: None,
            routing_code: None,
            updated_at: Utc::now(),
        }
    }

    /// Overwrites every supplied field, keeps the rest. Returns whether
    /// anything changed.
    pub fn merge(&mut self, input: &DestinationInput) -> bool {
        let mut changed = false;
        for (slot, value) in [
            (&mut self.upi_id, &input.upi_id),
            (&mut self.account_holder_name, &input.account_holder_name),
            (&mut self.account_number, &input.account_number),
            (&mut self.routing_code, &input.routing_code),
        ] {
            if let Some(value) = clean(value)
                && slot.as_deref() != Some(value.as_str())
            {
                *slot = Some(value);
                changed = true;
            }
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    pub fn has_upi(&self) -> bool {
        self.upi_id.is_some()
    }

    pub fn missing_bank_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.account_holder_name.is_none() {
            missing.push("account_holder_name");
        }
        if self.account_number.is_none() {
            missing.push("account_number");
        }
        if self.routing_code.is_none() {
            missing.push("routing_code");
        }
        missing
    }

    pub fn has_destination(&self) -> bool {
        self.has_upi() || self.missing_bank_fields().is_empty()
    }

    /// Fails with a validation error naming what is missing when no complete
    /// destination is on the account.
    pub fn ensure_destination(&self) -> Result<()> {
        if self.has_destination() {
            return Ok(());
        }
        let bank_missing = self.missing_bank_fields();
        let mut fields = vec!["upi_id"];
        fields.extend(bank_missing.iter().copied());
        Err(LedgerError::Validation {
            message: format!(
                "payout destination required: provide upi_id or complete bank details (missing: {})",
                bank_missing.join(", ")
            ),
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upi_is_a_destination() {
        let mut account = PaymentAccount::new(1);
        assert!(!account.has_destination());
        assert!(account.merge(&DestinationInput::upi("tutor@upi")));
        assert!(account.has_destination());
    }

    #[test]
    fn test_partial_bank_details_are_not_enough() {
        let mut account = PaymentAccount::new(1);
        account.merge(&DestinationInput {
            account_holder_name: Some("Asha".into()),
            account_number: Some("  ".into()),
            ..Default::default()
        });

        let err = account.ensure_destination().unwrap_err();
        match err {
            LedgerError::Validation { fields, message } => {
                assert_eq!(fields, vec!["upi_id", "account_number", "routing_code"]);
                assert!(message.contains("account_number, routing_code"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_merge_completes_bank_tuple_on_file() {
        let mut account = PaymentAccount::new(1);
        account.merge(&DestinationInput {
            account_holder_name: Some("Asha".into()),
            account_number: Some("00123".into()),
            ..Default::default()
        });
        account.merge(&DestinationInput {
            routing_code: Some(" HDFC0001 ".into()),
            ..Default::default()
        });
        assert!(account.has_destination());
        assert_eq!(account.routing_code.as_deref(), Some("HDFC0001"));
        assert_eq!(account.account_number.as_deref(), Some("00123"));
    }

    #[test]
    fn test_blank_input_changes_nothing() {
        let mut account = PaymentAccount::new(1);
        account.merge(&DestinationInput::upi("a@upi"));
        let input = DestinationInput {
            upi_id: Some("".into()),
            ..Default::default()
        };
        assert!(input.is_empty());
        assert!(!account.merge(&input));
        assert_eq!(account.upi_id.as_deref(), Some("a@upi"));
    }
}
