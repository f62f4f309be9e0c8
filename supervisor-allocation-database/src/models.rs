use core::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a person, e.g. `t1` or `s4`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionId(Uuid);

impl SelectionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Instructor,
    Administrator,
}

/// The extra data only instructors carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorProfile {
    pub title: String,
    pub research_area: String,
    /// How many applications the instructor is meant to receive while students apply.
    /// Informational, it is reported but never enforced.
    pub select_quota: u32,
    /// Maximum number of confirmed selections. This is the authoritative capacity.
    pub confirm_quota: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum PersonKind {
    Student,
    Instructor(InstructorProfile),
    Administrator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// Login handle (student or staff number), unique across the roster.
    pub handle: String,
    pub name: String,
    pub kind: PersonKind,
}

impl Person {
    #[must_use]
    pub const fn role(&self) -> Role {
        match self.kind {
            PersonKind::Student => Role::Student,
            PersonKind::Instructor(_) => Role::Instructor,
            PersonKind::Administrator => Role::Administrator,
        }
    }

    #[must_use]
    pub const fn instructor_profile(&self) -> Option<&InstructorProfile> {
        match &self.kind {
            PersonKind::Instructor(profile) => Some(profile),
            PersonKind::Student | PersonKind::Administrator => None,
        }
    }

    pub fn instructor_profile_mut(&mut self) -> Option<&mut InstructorProfile> {
        match &mut self.kind {
            PersonKind::Instructor(profile) => Some(profile),
            PersonKind::Student | PersonKind::Administrator => None,
        }
    }

    #[must_use]
    pub const fn is_student(&self) -> bool {
        matches!(self.kind, PersonKind::Student)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl SelectionStatus {
    /// Pending and confirmed selections block the student from applying again.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// A single application of a student to an instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub id: SelectionId,
    pub student: PersonId,
    pub instructor: PersonId,
    pub rationale: String,
    pub status: SelectionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    StudentSelecting,
    InstructorConfirming,
    Completed,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::StudentSelecting => "student_selecting",
            Self::InstructorConfirming => "instructor_confirming",
            Self::Completed => "completed",
        })
    }
}
