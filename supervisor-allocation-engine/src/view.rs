//! Read-only projections for dashboards and reports.
//!
//! A view is built from a copy of the records and never written back, so it can be computed
//! without holding any lock and may already be outdated when it is returned.

use alloc::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;
use supervisor_allocation_database::{Person, PersonId, Selection, SelectionId, SelectionStatus};

use crate::ledger::{active_selection, Fill};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstructorStats {
    pub confirmed: u32,
    pub quota: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StudentStatus {
    Unselected,
    Pending { instructor: PersonId },
    Confirmed { instructor: PersonId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructorOverview {
    pub id: PersonId,
    pub name: String,
    pub title: String,
    pub research_area: String,
    pub pending: u32,
    pub confirmed: u32,
    pub select_quota: u32,
    pub confirm_quota: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
    pub students: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub unselected: usize,
}

/// One confirmed pairing, as exported after the allocation is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedPair {
    pub selection: SelectionId,
    pub student: PersonId,
    pub student_handle: String,
    pub student_name: String,
    pub instructor: PersonId,
    pub instructor_name: String,
    pub instructor_title: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Applications {
    pub pending: Vec<Selection>,
    pub confirmed: Vec<Selection>,
    pub rejected: Vec<Selection>,
}

#[derive(Debug, Clone)]
pub struct AllocationView {
    persons: BTreeMap<PersonId, Person>,
    selections: Vec<Selection>,
}

impl AllocationView {
    #[must_use]
    pub fn new(persons: Vec<Person>, selections: Vec<Selection>) -> Self {
        Self {
            persons: persons
                .into_iter()
                .map(|person| (person.id.clone(), person))
                .collect(),
            selections,
        }
    }

    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    fn students(&self) -> impl Iterator<Item = &Person> {
        self.persons().filter(|person| person.is_student())
    }

    /// `None` if there is no instructor with this id.
    #[must_use]
    pub fn instructor_stats(&self, instructor: &PersonId) -> Option<InstructorStats> {
        let profile = self.persons.get(instructor)?.instructor_profile()?;
        Some(InstructorStats {
            confirmed: Fill::of(&self.selections, instructor).confirmed,
            quota: profile.confirm_quota,
        })
    }

    /// `None` if there is no student with this id.
    #[must_use]
    pub fn student_status(&self, student: &PersonId) -> Option<StudentStatus> {
        if !self.persons.get(student)?.is_student() {
            return None;
        }
        Some(match active_selection(&self.selections, student) {
            None => StudentStatus::Unselected,
            Some(selection) => match selection.status {
                SelectionStatus::Pending => StudentStatus::Pending {
                    instructor: selection.instructor.clone(),
                },
                SelectionStatus::Confirmed => StudentStatus::Confirmed {
                    instructor: selection.instructor.clone(),
                },
                SelectionStatus::Rejected => StudentStatus::Unselected,
            },
        })
    }

    #[must_use]
    pub fn active_selection_of(&self, student: &PersonId) -> Option<&Selection> {
        active_selection(&self.selections, student)
    }

    /// Students without a confirmed selection, ordered by id.
    #[must_use]
    pub fn unmatched_students(&self) -> Vec<&Person> {
        self.students()
            .filter(|student| {
                !self.selections.iter().any(|selection| {
                    selection.student == student.id
                        && selection.status == SelectionStatus::Confirmed
                })
            })
            .collect()
    }

    #[must_use]
    pub fn instructor_overview(&self) -> Vec<InstructorOverview> {
        let by_instructor = self
            .selections
            .iter()
            .map(|selection| (&selection.instructor, selection))
            .into_group_map();
        self.persons()
            .filter_map(|person| {
                let profile = person.instructor_profile()?;
                let fill = by_instructor
                    .get(&person.id)
                    .map(|theirs| Fill::of(theirs.iter().copied(), &person.id))
                    .unwrap_or_default();
                Some(InstructorOverview {
                    id: person.id.clone(),
                    name: person.name.clone(),
                    title: profile.title.clone(),
                    research_area: profile.research_area.clone(),
                    pending: fill.pending,
                    confirmed: fill.confirmed,
                    select_quota: profile.select_quota,
                    confirm_quota: profile.confirm_quota,
                    remaining: fill.remaining(profile.confirm_quota),
                })
            })
            .collect()
    }

    #[must_use]
    pub fn roster_summary(&self) -> RosterSummary {
        let mut summary = RosterSummary::default();
        for student in self.students() {
            summary.students += 1;
            match self.student_status(&student.id) {
                Some(StudentStatus::Confirmed { .. }) => summary.confirmed += 1,
                Some(StudentStatus::Pending { .. }) => summary.pending += 1,
                Some(StudentStatus::Unselected) | None => summary.unselected += 1,
            }
        }
        summary
    }

    /// Every confirmed selection joined with the people it pairs, ordered by student id.
    #[must_use]
    pub fn matched_pairs(&self) -> Vec<MatchedPair> {
        self.selections
            .iter()
            .filter(|selection| selection.status == SelectionStatus::Confirmed)
            .filter_map(|selection| {
                let student = self.persons.get(&selection.student)?;
                let instructor = self.persons.get(&selection.instructor)?;
                Some(MatchedPair {
                    selection: selection.id,
                    student: student.id.clone(),
                    student_handle: student.handle.clone(),
                    student_name: student.name.clone(),
                    instructor: instructor.id.clone(),
                    instructor_name: instructor.name.clone(),
                    instructor_title: instructor
                        .instructor_profile()
                        .map(|profile| profile.title.clone())
                        .unwrap_or_default(),
                    rationale: selection.rationale.clone(),
                })
            })
            .sorted_by(|left, right| left.student.cmp(&right.student))
            .collect()
    }

    /// All selections sent to an instructor, newest first within each status.
    #[must_use]
    pub fn applications_for(&self, instructor: &PersonId) -> Option<Applications> {
        self.persons
            .get(instructor)
            .filter(|person| person.instructor_profile().is_some())?;
        let mut applications = Applications::default();
        self.selections
            .iter()
            .filter(|selection| selection.instructor == *instructor)
            .sorted_by(|left, right| right.created_at.cmp(&left.created_at))
            .for_each(|selection| {
                let bucket = match selection.status {
                    SelectionStatus::Pending => &mut applications.pending,
                    SelectionStatus::Confirmed => &mut applications.confirmed,
                    SelectionStatus::Rejected => &mut applications.rejected,
                };
                bucket.push(selection.clone());
            });
        Some(applications)
    }
}
