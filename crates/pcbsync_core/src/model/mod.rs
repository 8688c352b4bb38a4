//! Shadow data model and diff wire format.
//!
//! # Responsibility
//! - Define the serializable mirror of board contents (`ShadowModel`).
//! - Define typed geometry descriptors shared by board adapters and the applier.
//! - Define the diff format consumed from the diff-computation collaborator.
//!
//! # Invariants
//! - Every shadow entry is identified by a stable `Kiid`.
//! - A drawing's shape kind never changes after creation.
//! - Entry `hash` always reflects the current canonical serialization.

pub mod diff;
pub mod geometry;
pub mod kiid;
pub mod shadow;
