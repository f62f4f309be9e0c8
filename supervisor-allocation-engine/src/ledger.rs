//! Quota accounting. Nothing here is stored, the fill of an instructor is always counted
//! from the selections themselves.

use serde::Serialize;
use supervisor_allocation_database::{PersonId, Selection, SelectionStatus};

/// How many selections of one instructor are pending and confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Fill {
    pub pending: u32,
    pub confirmed: u32,
}

impl Fill {
    /// Counts the selections referencing `instructor`, others are ignored.
    pub fn of<'a>(selections: impl IntoIterator<Item = &'a Selection>, instructor: &PersonId) -> Self {
        selections
            .into_iter()
            .filter(|selection| selection.instructor == *instructor)
            .fold(Self::default(), |mut fill, selection| {
                match selection.status {
                    SelectionStatus::Pending => fill.pending += 1,
                    SelectionStatus::Confirmed => fill.confirmed += 1,
                    SelectionStatus::Rejected => {}
                }
                fill
            })
    }

    /// Pending selections don't occupy a seat, only confirmed ones do.
    #[must_use]
    pub const fn has_open_seat(&self, confirm_quota: u32) -> bool {
        self.confirmed < confirm_quota
    }

    #[must_use]
    pub const fn remaining(&self, confirm_quota: u32) -> u32 {
        confirm_quota.saturating_sub(self.confirmed)
    }
}

/// The pending or confirmed selection of a student, if there is one.
pub fn active_selection<'a>(
    selections: impl IntoIterator<Item = &'a Selection>,
    student: &PersonId,
) -> Option<&'a Selection> {
    selections
        .into_iter()
        .find(|selection| selection.student == *student && selection.status.is_active())
}
