//! Diff application services.
//!
//! # Responsibility
//! - Apply diffs to a board through the `BoardHandle` capability.
//! - Report per-entry outcomes in a structured form.

pub mod diff_applier;
pub mod report;
