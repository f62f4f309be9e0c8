use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use supervisor_allocation_config::CancelPolicy;
use supervisor_allocation_database::{
    InstructorProfile, MappingStore, MemoryStore, Person, PersonDirectory, PersonId, Phase,
    Selection, SelectionId, SelectionStatus,
};
use tracing::{debug, info};

use crate::caller::Caller;
use crate::error::{AdminError, ApplyError, CancelError, DecideError};
use crate::ledger::{active_selection, Fill};
use crate::phase::PhaseContext;
use crate::view::AllocationView;

/// What an instructor decides about a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Confirmed,
    Rejected,
}

impl Outcome {
    #[must_use]
    pub const fn status(self) -> SelectionStatus {
        match self {
            Self::Confirmed => SelectionStatus::Confirmed,
            Self::Rejected => SelectionStatus::Rejected,
        }
    }
}

/// Version counters a polling client compares to find out whether it is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreVersions {
    pub roster: u64,
    pub selections: u64,
}

struct Books<P, S> {
    persons: P,
    selections: S,
}

/// Validates intents against phase, uniqueness and quota and commits them.
///
/// All checks and the following write of one operation happen under a single lock, so two
/// concurrent operations can never both pass a check that only one of them may pass.
pub struct AllocationEngine<
    P = MemoryStore<PersonId, Person>,
    S = MemoryStore<SelectionId, Selection>,
> {
    books: Mutex<Books<P, S>>,
    roster: Vec<Person>,
    cancel_policy: CancelPolicy,
}

impl AllocationEngine {
    /// A fresh engine without any selections.
    #[must_use]
    pub fn new(roster: Vec<Person>, cancel_policy: CancelPolicy) -> Self {
        let persons = roster
            .iter()
            .map(|person| (person.id.clone(), person.clone()))
            .collect();
        Self::with_stores(persons, MemoryStore::new(), roster, cancel_policy)
    }

    /// Continues from previously stored persons and selections, counting versions on from
    /// `versions`. `roster` is what a reset goes back to.
    #[must_use]
    pub fn restore(
        roster: Vec<Person>,
        persons: Vec<Person>,
        selections: Vec<Selection>,
        versions: StoreVersions,
        cancel_policy: CancelPolicy,
    ) -> Self {
        let persons = persons
            .into_iter()
            .map(|person| (person.id.clone(), person))
            .collect::<MemoryStore<_, _>>()
            .with_version(versions.roster);
        let selections = selections
            .into_iter()
            .map(|selection| (selection.id, selection))
            .collect::<MemoryStore<_, _>>()
            .with_version(versions.selections);
        Self::with_stores(persons, selections, roster, cancel_policy)
    }
}

impl<P, S> AllocationEngine<P, S>
where
    P: MappingStore<PersonId, Person>,
    S: MappingStore<SelectionId, Selection>,
{
    pub fn with_stores(
        persons: P,
        selections: S,
        roster: Vec<Person>,
        cancel_policy: CancelPolicy,
    ) -> Self {
        Self {
            books: Mutex::new(Books {
                persons,
                selections,
            }),
            roster,
            cancel_policy,
        }
    }

    /// Files a new pending application of `student` to `instructor`.
    pub fn apply(
        &self,
        context: &PhaseContext,
        student: &PersonId,
        instructor: &PersonId,
        rationale: impl Into<String>,
    ) -> Result<SelectionId, ApplyError> {
        let mut books = self.books.lock();
        let books = &mut *books;

        if !books
            .persons
            .get_person(student)
            .is_some_and(|person| person.is_student())
        {
            return Err(ApplyError::NotFound(student.clone()));
        }
        let profile = instructor_profile(&books.persons, instructor)
            .ok_or_else(|| ApplyError::NotFound(instructor.clone()))?;

        if context.phase != Phase::StudentSelecting {
            debug!(%student, phase = %context.phase, "apply rejected, phase not open");
            return Err(ApplyError::PhaseNotOpen {
                phase: context.phase,
            });
        }

        let mine = books
            .selections
            .list_where(&|selection: &Selection| selection.student == *student);
        if let Some(existing) = active_selection(&mine, student) {
            debug!(%student, existing = %existing.id, "apply rejected, already active");
            return Err(ApplyError::DuplicateActiveSelection {
                existing: existing.id,
            });
        }

        let fill = fill_of(&books.selections, instructor);
        if !fill.has_open_seat(profile.confirm_quota) {
            debug!(%student, %instructor, "apply rejected, quota exhausted");
            return Err(ApplyError::QuotaExceeded {
                instructor: instructor.clone(),
                quota: profile.confirm_quota,
            });
        }

        let selection = Selection {
            id: SelectionId::generate(),
            student: student.clone(),
            instructor: instructor.clone(),
            rationale: rationale.into(),
            status: SelectionStatus::Pending,
            created_at: Utc::now(),
        };
        let id = selection.id;
        books.selections.put(id, selection);
        info!(selection = %id, %student, %instructor, "student applied");
        Ok(id)
    }

    /// Withdraws the pending selection of `student`. Confirmed selections stay.
    pub fn cancel(&self, context: &PhaseContext, student: &PersonId) -> Result<(), CancelError> {
        let mut books = self.books.lock();
        let books = &mut *books;

        if !books
            .persons
            .get_person(student)
            .is_some_and(|person| person.is_student())
        {
            return Err(CancelError::NotFound(student.clone()));
        }

        match self.cancel_policy {
            CancelPolicy::AnyPhase => {}
            CancelPolicy::StudentSelectingOnly => {
                if context.phase != Phase::StudentSelecting {
                    return Err(CancelError::PhaseNotOpen {
                        phase: context.phase,
                    });
                }
            }
        }

        let mine = books
            .selections
            .list_where(&|selection: &Selection| selection.student == *student);
        let pending = active_selection(&mine, student)
            .filter(|selection| selection.status == SelectionStatus::Pending)
            .ok_or(CancelError::NotCancelable)?;
        books.selections.remove(&pending.id);
        info!(selection = %pending.id, %student, "student withdrew application");
        Ok(())
    }

    /// Confirms or rejects a selection on behalf of the instructor it was sent to.
    pub fn decide(
        &self,
        context: &PhaseContext,
        selection: &SelectionId,
        instructor: &PersonId,
        outcome: Outcome,
    ) -> Result<(), DecideError> {
        let mut books = self.books.lock();
        let books = &mut *books;

        let profile = instructor_profile(&books.persons, instructor)
            .ok_or_else(|| DecideError::UnknownInstructor(instructor.clone()))?;
        let mut record = books
            .selections
            .get(selection)
            .ok_or(DecideError::UnknownSelection(*selection))?;

        if record.instructor != *instructor {
            return Err(DecideError::Unauthorized);
        }
        if context.phase != Phase::InstructorConfirming {
            debug!(%selection, phase = %context.phase, "decision rejected, phase not open");
            return Err(DecideError::PhaseNotOpen {
                phase: context.phase,
            });
        }

        match (record.status, outcome) {
            (SelectionStatus::Pending, Outcome::Confirmed) => {
                // re-read under the lock, other decisions may have taken the seat meanwhile
                let fill = fill_of(&books.selections, instructor);
                if !fill.has_open_seat(profile.confirm_quota) {
                    debug!(%selection, %instructor, "confirmation rejected, quota exhausted");
                    return Err(DecideError::QuotaExceeded {
                        instructor: instructor.clone(),
                        quota: profile.confirm_quota,
                    });
                }
            }
            (SelectionStatus::Pending | SelectionStatus::Confirmed, Outcome::Rejected) => {}
            (from, outcome) => {
                return Err(DecideError::InvalidTransition {
                    from,
                    to: outcome.status(),
                });
            }
        }

        record.status = outcome.status();
        books.selections.put(record.id, record);
        info!(%selection, %instructor, ?outcome, "instructor decided");
        Ok(())
    }

    /// Changes the quotas of an instructor. `None` keeps the current value. A confirm quota
    /// below the current fill only prevents further confirmations.
    pub fn update_quotas(
        &self,
        caller: &Caller,
        instructor: &PersonId,
        select_quota: Option<u32>,
        confirm_quota: Option<u32>,
    ) -> Result<InstructorProfile, AdminError> {
        if !caller.is_administrator() {
            return Err(AdminError::Unauthorized);
        }
        let mut books = self.books.lock();
        let mut person = books
            .persons
            .get_person(instructor)
            .ok_or_else(|| AdminError::NotFound(instructor.clone()))?;
        let profile = person
            .instructor_profile_mut()
            .ok_or_else(|| AdminError::NotFound(instructor.clone()))?;
        if let Some(select_quota) = select_quota {
            profile.select_quota = select_quota;
        }
        if let Some(confirm_quota) = confirm_quota {
            profile.confirm_quota = confirm_quota;
        }
        let profile = profile.clone();
        books.persons.put(person.id.clone(), person);
        info!(
            %instructor,
            select_quota = profile.select_quota,
            confirm_quota = profile.confirm_quota,
            "quotas updated"
        );
        Ok(profile)
    }

    /// Drops every selection and goes back to the roster the engine was created with.
    pub fn reset(&self, caller: &Caller) -> Result<(), AdminError> {
        if !caller.is_administrator() {
            return Err(AdminError::Unauthorized);
        }
        let mut books = self.books.lock();
        books.selections.clear();
        books.persons.clear();
        for person in &self.roster {
            books.persons.put(person.id.clone(), person.clone());
        }
        info!(by = %caller.id, "allocation reset");
        Ok(())
    }

    pub fn get_person(&self, id: &PersonId) -> Option<Person> {
        self.books.lock().persons.get_person(id)
    }

    pub fn versions(&self) -> StoreVersions {
        let books = self.books.lock();
        StoreVersions {
            roster: books.persons.version(),
            selections: books.selections.version(),
        }
    }

    /// Copies the current records. The lock is only held for the copy.
    pub fn view(&self) -> AllocationView {
        self.view_with_versions().0
    }

    /// The records together with the versions they belong to.
    pub fn view_with_versions(&self) -> (AllocationView, StoreVersions) {
        let (persons, selections, versions) = {
            let books = self.books.lock();
            (
                books.persons.list_all(),
                books.selections.list_all(),
                StoreVersions {
                    roster: books.persons.version(),
                    selections: books.selections.version(),
                },
            )
        };
        (AllocationView::new(persons, selections), versions)
    }
}

fn instructor_profile<P: PersonDirectory>(
    persons: &P,
    instructor: &PersonId,
) -> Option<InstructorProfile> {
    persons
        .get_person(instructor)
        .and_then(|person| person.instructor_profile().cloned())
}

fn fill_of<S: MappingStore<SelectionId, Selection>>(selections: &S, instructor: &PersonId) -> Fill {
    let theirs = selections.list_where(&|selection: &Selection| selection.instructor == *instructor);
    Fill::of(&theirs, instructor)
}

#[cfg(test)]
mod tests {
    use supervisor_allocation_database::roster::default_roster;
    use supervisor_allocation_database::Role;

    use super::*;

    const SELECTING: PhaseContext = PhaseContext::new(Phase::StudentSelecting);
    const CONFIRMING: PhaseContext = PhaseContext::new(Phase::InstructorConfirming);

    fn id(value: &str) -> PersonId {
        PersonId::from(value)
    }

    fn engine() -> AllocationEngine {
        AllocationEngine::new(default_roster(), CancelPolicy::AnyPhase)
    }

    #[test]
    fn unknown_ids_are_reported_before_the_phase() {
        let engine = engine();
        let closed = PhaseContext::new(Phase::Setup);
        assert_eq!(
            engine.apply(&closed, &id("s9"), &id("t1"), ""),
            Err(ApplyError::NotFound(id("s9")))
        );
        assert_eq!(
            engine.apply(&closed, &id("s1"), &id("s2"), ""),
            Err(ApplyError::NotFound(id("s2")))
        );
        assert_eq!(
            engine.apply(&closed, &id("s1"), &id("t1"), ""),
            Err(ApplyError::PhaseNotOpen {
                phase: Phase::Setup
            })
        );
        assert_eq!(
            engine.cancel(&closed, &id("t1")),
            Err(CancelError::NotFound(id("t1")))
        );
    }

    #[test]
    fn decide_checks_ownership_before_phase() {
        let engine = engine();
        let selection = engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        assert_eq!(
            engine.decide(&SELECTING, &selection, &id("t2"), Outcome::Confirmed),
            Err(DecideError::Unauthorized)
        );
        assert_eq!(
            engine.decide(&SELECTING, &selection, &id("t1"), Outcome::Confirmed),
            Err(DecideError::PhaseNotOpen {
                phase: Phase::StudentSelecting
            })
        );
        assert_eq!(
            engine.decide(&CONFIRMING, &SelectionId::generate(), &id("t1"), Outcome::Rejected)
                .map_err(|error| error.kind()),
            Err(crate::ErrorKind::NotFound)
        );
    }

    #[test]
    fn rejected_is_terminal_and_confirmed_can_be_revoked() {
        let engine = engine();
        let first = engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        let second = engine.apply(&SELECTING, &id("s2"), &id("t1"), "").unwrap();

        engine.decide(&CONFIRMING, &first, &id("t1"), Outcome::Rejected).unwrap();
        assert_eq!(
            engine.decide(&CONFIRMING, &first, &id("t1"), Outcome::Confirmed),
            Err(DecideError::InvalidTransition {
                from: SelectionStatus::Rejected,
                to: SelectionStatus::Confirmed
            })
        );

        engine.decide(&CONFIRMING, &second, &id("t1"), Outcome::Confirmed).unwrap();
        assert_eq!(
            engine.decide(&CONFIRMING, &second, &id("t1"), Outcome::Confirmed),
            Err(DecideError::InvalidTransition {
                from: SelectionStatus::Confirmed,
                to: SelectionStatus::Confirmed
            })
        );
        engine.decide(&CONFIRMING, &second, &id("t1"), Outcome::Rejected).unwrap();
        assert_eq!(engine.view().instructor_stats(&id("t1")).unwrap().confirmed, 0);
    }

    #[test]
    fn cancel_policy_can_restrict_withdrawal_to_the_selection_phase() {
        let engine = AllocationEngine::new(default_roster(), CancelPolicy::StudentSelectingOnly);
        engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        assert_eq!(
            engine.cancel(&CONFIRMING, &id("s1")),
            Err(CancelError::PhaseNotOpen {
                phase: Phase::InstructorConfirming
            })
        );
        engine.cancel(&SELECTING, &id("s1")).unwrap();

        let engine = self::engine();
        engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        engine.cancel(&CONFIRMING, &id("s1")).unwrap();
    }

    #[test]
    fn quota_updates_are_for_administrators() {
        let engine = engine();
        let student = Caller::new("s1", Role::Student);
        let admin = Caller::new("admin", Role::Administrator);
        assert_eq!(
            engine.update_quotas(&student, &id("t1"), None, Some(1)),
            Err(AdminError::Unauthorized)
        );
        assert_eq!(
            engine.update_quotas(&admin, &id("s1"), None, Some(1)),
            Err(AdminError::NotFound(id("s1")))
        );
        let versions = engine.versions();
        let profile = engine.update_quotas(&admin, &id("t1"), Some(7), Some(1)).unwrap();
        assert_eq!((profile.select_quota, profile.confirm_quota), (7, 1));
        assert_eq!(engine.versions().roster, versions.roster + 1);
        assert_eq!(engine.view().instructor_stats(&id("t1")).unwrap().quota, 1);
    }

    #[test]
    fn reset_restores_the_roster_and_drops_selections() {
        let engine = engine();
        let admin = Caller::new("admin", Role::Administrator);
        engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        engine.update_quotas(&admin, &id("t1"), None, Some(0)).unwrap();

        assert_eq!(
            engine.reset(&Caller::new("t1", Role::Instructor)),
            Err(AdminError::Unauthorized)
        );
        engine.reset(&admin).unwrap();

        let view = engine.view();
        assert!(view.selections().is_empty());
        assert_eq!(view.instructor_stats(&id("t1")).unwrap().quota, 5);
    }

    #[test]
    fn restored_engine_continues_the_versions() {
        let engine = engine();
        engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        let (view, versions) = engine.view_with_versions();

        let restored = AllocationEngine::restore(
            default_roster(),
            view.persons().cloned().collect(),
            view.selections().to_vec(),
            versions,
            CancelPolicy::AnyPhase,
        );
        assert_eq!(restored.versions(), versions);
        restored.cancel(&SELECTING, &id("s1")).unwrap();
        assert_eq!(restored.versions().selections, versions.selections + 1);
    }

    #[test]
    fn versions_follow_committed_changes_only() {
        let engine = engine();
        let before = engine.versions();
        let _ = engine.apply(&CONFIRMING, &id("s1"), &id("t1"), "");
        assert_eq!(engine.versions(), before);
        engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        assert_eq!(engine.versions().selections, before.selections + 1);
    }
}
