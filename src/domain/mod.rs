//! Domain layer: money types, the wallet and its ledger, revenue recognition,
//! the payout state machine and the storage port.

pub mod event;
pub mod ledger;
pub mod money;
pub mod payment_account;
pub mod payout;
pub mod ports;
pub mod revenue;
pub mod wallet;
