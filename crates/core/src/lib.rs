//! # DutyRoster Core
//!
//! Domain models, status state machines, and the booking/approval rules for
//! the student duty-scheduling service. This crate performs no I/O: the rules
//! operate on snapshots assembled by the caller, so every invariant is
//! unit-testable without a database.

pub mod errors;
pub mod models;
pub mod rules;
