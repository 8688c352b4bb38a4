//! Core of the board sync plugin.
//! Applies board diffs to a live host board and keeps the shadow model in sync.

pub mod board;
pub mod config;
pub mod logging;
pub mod model;
pub mod service;

pub use board::memory::{MemoryBoard, MemoryDrawing, MemoryFootprint, MemoryTrack};
pub use board::{BoardDrawing, BoardFootprint, BoardHandle, LayerId, NewShape, ShapeSpec};
pub use config::{ApplierConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::diff::{CategoryDiff, ChangedEntry, Diff};
pub use model::geometry::{Geometry, GeometryError, Point, RectSides, ShapeKind};
pub use model::kiid::Kiid;
pub use model::shadow::{Category, ShadowEntry, ShadowError, ShadowModel};
pub use service::diff_applier::DiffApplier;
pub use service::report::{ApplyError, ApplyIssue, ApplyReport, LookupSide};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
