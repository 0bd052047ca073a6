use std::collections::BTreeSet;
use std::fmt;

use super::types::Day;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Class,
    Subject,
    Teacher,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Class => "class",
            ReferenceKind::Subject => "subject",
            ReferenceKind::Teacher => "teacher",
        })
    }
}

/// Failures of grid mutations. Every variant leaves the store unchanged.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("{kind} not found: {id}")]
    InvalidReference { kind: ReferenceKind, id: String },

    #[error("{operation} failed: {message}")]
    PersistenceFailure {
        operation: &'static str,
        message: String,
    },

    #[error("teacher {teacher_id} is already booked on {day} {slot_id} for {classes:?}")]
    TeacherConflict {
        teacher_id: String,
        day: Day,
        slot_id: String,
        classes: BTreeSet<String>,
    },
}

impl GridError {
    pub(crate) fn persistence(operation: &'static str, e: anyhow::Error) -> Self {
        GridError::PersistenceFailure {
            operation,
            message: format!("{e:#}"),
        }
    }

    /// Stable machine-readable code used in IPC error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            GridError::InvalidReference { .. } => "invalid_reference",
            GridError::PersistenceFailure { .. } => "persistence_failed",
            GridError::TeacherConflict { .. } => "teacher_conflict",
        }
    }
}
