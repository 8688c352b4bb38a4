//! Structured outcome of one diff application.
//!
//! # Responsibility
//! - Define the per-entry / per-property error taxonomy (`ApplyError`).
//! - Collect successes and issues without aborting the application.
//! - Emit every issue on the `log` facade as a key-value event.
//!
//! # Invariants
//! - `NotImplemented` issues are acknowledged gaps, never counted as errors.

use crate::model::geometry::ShapeKind;
use crate::model::kiid::Kiid;
use crate::model::shadow::Category;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Where a kiid lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSide {
    /// No live object with this kiid on the board.
    Board,
    /// No entry with this kiid in the shadow model.
    Shadow,
    /// The host returned a kiid the shadow model already holds.
    Duplicate,
}

impl LookupSide {
    fn describe(self) -> &'static str {
        match self {
            Self::Board => "not found on board",
            Self::Shadow => "not found in shadow model",
            Self::Duplicate => "already present in shadow model",
        }
    }
}

/// Failure of one diff entry or one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Kiid could not be resolved; the whole entry is skipped.
    Lookup { kiid: Kiid, side: LookupSide },
    /// Added descriptor has no usable geometry; nothing inserted.
    UnsupportedShape(String),
    /// Board and shadow disagree on the shape kind; the entry is skipped.
    ShapeMismatch {
        kiid: Kiid,
        board: ShapeKind,
        shadow: Option<ShapeKind>,
    },
    /// Property value unusable; only this property is skipped.
    InvalidValue {
        kiid: Kiid,
        property: String,
        reason: String,
    },
    /// Known unhandled part of the diff.
    NotImplemented {
        kiid: Option<Kiid>,
        what: &'static str,
    },
}

impl ApplyError {
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lookup { .. } => "lookup_failed",
            Self::UnsupportedShape(_) => "unsupported_shape",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::InvalidValue { .. } => "invalid_value",
            Self::NotImplemented { .. } => "not_implemented",
        }
    }
}

impl Display for ApplyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lookup { kiid, side } => write!(f, "{kiid} {}", side.describe()),
            Self::UnsupportedShape(reason) => write!(f, "cannot create drawing: {reason}"),
            Self::ShapeMismatch {
                kiid,
                board,
                shadow,
            } => match shadow {
                Some(shadow) => write!(f, "{kiid} is a {board} on board but a {shadow} in shadow"),
                None => write!(f, "{kiid} is a {board} on board but has no shape in shadow"),
            },
            Self::InvalidValue {
                kiid,
                property,
                reason,
            } => write!(f, "{kiid}: cannot apply `{property}`: {reason}"),
            Self::NotImplemented {
                kiid: Some(kiid),
                what,
            } => write!(f, "{kiid}: {what} not implemented"),
            Self::NotImplemented { kiid: None, what } => write!(f, "{what} not implemented"),
        }
    }
}

impl Error for ApplyError {}

/// One recorded issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyIssue {
    pub category: Category,
    pub error: ApplyError,
}

/// Collected result of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Kiids assigned to newly created drawings.
    pub added: Vec<Kiid>,
    /// Kiids of entries that had at least one property applied.
    pub updated: Vec<Kiid>,
    pub issues: Vec<ApplyIssue>,
}

impl ApplyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an issue and logs it.
    pub fn record(&mut self, category: Category, error: ApplyError) {
        if error.is_gap() {
            info!(
                "event=diff_apply module=service status=gap category={} error_code={} detail={}",
                category,
                error.code(),
                error
            );
        } else {
            warn!(
                "event=diff_apply module=service status=skip category={} error_code={} error={}",
                category,
                error.code(),
                error
            );
        }
        self.issues.push(ApplyIssue { category, error });
    }

    pub fn merge(&mut self, other: ApplyReport) {
        self.added.extend(other.added);
        self.updated.extend(other.updated);
        self.issues.extend(other.issues);
    }

    /// Issues that are real failures.
    pub fn errors(&self) -> impl Iterator<Item = &ApplyIssue> {
        self.issues.iter().filter(|issue| !issue.error.is_gap())
    }

    /// Acknowledged unimplemented parts.
    pub fn gaps(&self) -> impl Iterator<Item = &ApplyIssue> {
        self.issues.iter().filter(|issue| issue.error.is_gap())
    }

    /// True when no failures were recorded; gaps are allowed.
    pub fn is_clean(&self) -> bool {
        self.errors().next().is_none()
    }
}
