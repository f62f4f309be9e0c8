use serde::Serialize;
use supervisor_allocation_database::{PersonId, Phase, SelectionId, SelectionStatus};
use thiserror::Error;

/// The category of a rejected intent, shared by all operations so callers can map them to
/// messages or status codes in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    PhaseNotOpen,
    DuplicateActiveSelection,
    QuotaExceeded,
    NotCancelable,
    InvalidTransition,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("no student or instructor with id {0}")]
    NotFound(PersonId),
    #[error("applications are not accepted in phase {phase}")]
    PhaseNotOpen { phase: Phase },
    #[error("the student already holds the active selection {existing}")]
    DuplicateActiveSelection { existing: SelectionId },
    #[error("instructor {instructor} has no open seats left (quota {quota})")]
    QuotaExceeded { instructor: PersonId, quota: u32 },
}

impl ApplyError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PhaseNotOpen { .. } => ErrorKind::PhaseNotOpen,
            Self::DuplicateActiveSelection { .. } => ErrorKind::DuplicateActiveSelection,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelError {
    #[error("no student with id {0}")]
    NotFound(PersonId),
    #[error("applications can't be withdrawn in phase {phase}")]
    PhaseNotOpen { phase: Phase },
    #[error("there is no pending selection to withdraw")]
    NotCancelable,
}

impl CancelError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PhaseNotOpen { .. } => ErrorKind::PhaseNotOpen,
            Self::NotCancelable => ErrorKind::NotCancelable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecideError {
    #[error("no selection with id {0}")]
    UnknownSelection(SelectionId),
    #[error("no instructor with id {0}")]
    UnknownInstructor(PersonId),
    #[error("the selection belongs to another instructor")]
    Unauthorized,
    #[error("decisions are not accepted in phase {phase}")]
    PhaseNotOpen { phase: Phase },
    #[error("a {from:?} selection can't become {to:?}")]
    InvalidTransition {
        from: SelectionStatus,
        to: SelectionStatus,
    },
    #[error("instructor {instructor} has no open seats left (quota {quota})")]
    QuotaExceeded { instructor: PersonId, quota: u32 },
}

impl DecideError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownSelection(_) | Self::UnknownInstructor(_) => ErrorKind::NotFound,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::PhaseNotOpen { .. } => ErrorKind::PhaseNotOpen,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
        }
    }
}

/// Errors of operations reserved for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("only administrators may do this")]
    Unauthorized,
    #[error("no instructor with id {0}")]
    NotFound(PersonId),
}

impl AdminError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}
