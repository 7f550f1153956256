//! Application layer containing the core business logic orchestration.
//!
//! `LedgerEngine` is the entry point for every money-moving operation. Each
//! operation is a short unit of work: take the owning wallet's lock, read,
//! validate, build a `ChangeSet`, commit, release.

pub mod auth;
pub mod commission;
pub mod engine;
pub mod locks;
pub mod payouts;
pub mod reporting;
