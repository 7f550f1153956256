use crate::domain::money::MONEY_SCALE;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::net::SocketAddr;

/// Platform share of every completed sale.
pub const COMMISSION_RATE: Decimal = dec!(0.20);

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub commission_rate: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commission_rate: COMMISSION_RATE,
        }
    }
}

impl EngineConfig {
    /// Builds a config from a commission percentage such as `20` or `12.5`.
    pub fn from_percent(percent: Decimal) -> Result<Self> {
        if percent < Decimal::ZERO || percent > dec!(100) {
            return Err(LedgerError::Validation {
                message: format!("commission percent must be within 0..=100, got {percent}"),
                fields: vec!["commission_percent"],
            });
        }
        if percent.round_dp(MONEY_SCALE) != percent {
            return Err(LedgerError::Validation {
                message: format!(
                    "commission percent {percent} has more than {MONEY_SCALE} decimal places"
                ),
                fields: vec!["commission_percent"],
            });
        }
        Ok(Self {
            commission_rate: percent / dec!(100),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        assert_eq!(EngineConfig::default().commission_rate, dec!(0.20));
        assert_eq!(
            EngineConfig::from_percent(dec!(20)).unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn test_percent_bounds() {
        assert_eq!(
            EngineConfig::from_percent(dec!(12.5)).unwrap().commission_rate,
            dec!(0.125)
        );
        assert!(EngineConfig::from_percent(dec!(-1)).is_err());
        assert!(EngineConfig::from_percent(dec!(100.01)).is_err());
        assert!(EngineConfig::from_percent(dec!(10.125)).is_err());
    }
}
