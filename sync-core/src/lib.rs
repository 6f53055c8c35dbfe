//! # sync-core
//!
//! Pure logic for upsync (no I/O, instant tests).
//!
//! This crate implements the decisions the update engine makes without
//! any network or storage I/O:
//! - [`gap::decide`]: apply, ignore or recover for one counted event
//! - [`ScopePtsCache`]: in-memory per-channel positions
//! - [`terse`]: rebuilding full messages from compact shapes
//! - [`difference`]: interpreting bulk catch-up pages
//!
//! The actual I/O (RPC calls, storage, dispatch) is performed by
//! `sync-client`, which acts on the values produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod difference;
pub mod gap;
pub mod position;
pub mod terse;

pub use difference::{global_step, scope_step, DiffPage, DiffStep};
pub use gap::{decide, GapDecision, Recovery};
pub use position::{GlobalPosition, Identity, ScopePtsCache};
pub use terse::LookupPlan;
