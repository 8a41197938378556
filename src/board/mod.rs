//! Pipeline board core
//!
//! The board is an in-memory view over the lead ledger for the duration of
//! one command invocation: leads are hydrated newest-first into a
//! [`LeadStore`], stage columns are derived projections over that sequence,
//! and a move request is applied as a single stage-field rewrite. Column
//! order is always the store's own order; columns keep no independent
//! ordering of their own, so moving a lead within its current stage changes
//! nothing.

pub mod store;
pub mod transition;

pub use store::*;
pub use transition::*;
