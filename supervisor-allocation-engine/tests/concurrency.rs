use std::sync::Barrier;
use std::thread;

use supervisor_allocation_config::CancelPolicy;
use supervisor_allocation_database::roster::default_roster;
use supervisor_allocation_engine::{
    AllocationEngine, Caller, DecideError, Outcome, PersonId, Phase, PhaseContext,
    PhaseController, Role,
};

const SELECTING: PhaseContext = PhaseContext::new(Phase::StudentSelecting);
const CONFIRMING: PhaseContext = PhaseContext::new(Phase::InstructorConfirming);

fn id(value: &str) -> PersonId {
    PersonId::from(value)
}

#[test]
fn racing_confirmations_fill_the_last_seat_once() {
    for _ in 0..50 {
        let engine = AllocationEngine::new(default_roster(), CancelPolicy::AnyPhase);
        let admin = Caller::new("admin", Role::Administrator);
        engine.update_quotas(&admin, &id("t1"), None, Some(2)).unwrap();

        let first = engine.apply(&SELECTING, &id("s1"), &id("t1"), "").unwrap();
        let second = engine.apply(&SELECTING, &id("s2"), &id("t1"), "").unwrap();
        let third = engine.apply(&SELECTING, &id("s3"), &id("t1"), "").unwrap();
        engine.decide(&CONFIRMING, &first, &id("t1"), Outcome::Confirmed).unwrap();

        let barrier = Barrier::new(2);
        let results = thread::scope(|scope| {
            let handles = [second, third].map(|selection| {
                let engine = &engine;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    engine.decide(&CONFIRMING, &selection, &id("t1"), Outcome::Confirmed)
                })
            });
            handles.map(|handle| handle.join().unwrap())
        });

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results.contains(&Err(DecideError::QuotaExceeded {
            instructor: id("t1"),
            quota: 2
        })));
        assert_eq!(engine.view().instructor_stats(&id("t1")).unwrap().confirmed, 2);
    }
}

#[test]
fn racing_applications_of_one_student_create_one_selection() {
    let instructors = ["t1", "t2", "t3", "t4"];
    for _ in 0..50 {
        let engine = AllocationEngine::new(default_roster(), CancelPolicy::AnyPhase);
        let barrier = Barrier::new(instructors.len());
        let accepted = thread::scope(|scope| {
            let handles = instructors.map(|instructor| {
                let engine = &engine;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    engine.apply(&SELECTING, &id("s1"), &id(instructor), "").is_ok()
                })
            });
            handles
                .map(|handle| handle.join().unwrap())
                .into_iter()
                .filter(|accepted| *accepted)
                .count()
        });

        assert_eq!(accepted, 1);
        assert_eq!(engine.view().selections().len(), 1);
    }
}

#[test]
fn many_students_compete_for_a_single_seat() {
    let engine = AllocationEngine::new(default_roster(), CancelPolicy::AnyPhase);
    let selections = ["s1", "s2", "s3", "s4"]
        .map(|student| engine.apply(&SELECTING, &id(student), &id("t4"), "").unwrap());
    let admin = Caller::new("admin", Role::Administrator);
    engine.update_quotas(&admin, &id("t4"), None, Some(1)).unwrap();

    let barrier = Barrier::new(selections.len());
    thread::scope(|scope| {
        for selection in &selections {
            let engine = &engine;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                let _ = engine.decide(&CONFIRMING, selection, &id("t4"), Outcome::Confirmed);
            });
        }
    });

    assert_eq!(engine.view().instructor_stats(&id("t4")).unwrap().confirmed, 1);
}

/// Once `set_phase` returned, no operation gated on the previous phase may commit anymore.
#[test]
fn nothing_commits_after_the_phase_closed() {
    let admin = Caller::new("admin", Role::Administrator);
    for round in 0..200 {
        let engine = AllocationEngine::new(default_roster(), CancelPolicy::AnyPhase);
        let pending = engine.apply(&SELECTING, &id("s2"), &id("t1"), "").unwrap();
        let deciding = round % 2 == 1;
        let (open, closed) = if deciding {
            (Phase::InstructorConfirming, Phase::Completed)
        } else {
            (Phase::StudentSelecting, Phase::InstructorConfirming)
        };
        let phase = PhaseController::new(open);

        let barrier = Barrier::new(2);
        let versions_after_close = thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                if deciding {
                    let _ = phase.gate(|context| {
                        engine.decide(context, &pending, &id("t1"), Outcome::Confirmed)
                    });
                } else {
                    let _ = phase.gate(|context| engine.apply(context, &id("s1"), &id("t2"), ""));
                }
            });
            let closer = scope.spawn(|| {
                barrier.wait();
                phase.set_phase(closed, &admin).unwrap();
                engine.versions()
            });
            closer.join().unwrap()
        });

        assert_eq!(engine.versions(), versions_after_close);
    }
}

#[test]
fn reset_and_phase_restore_are_one_step() {
    let admin = Caller::new("admin", Role::Administrator);
    for _ in 0..200 {
        let engine = AllocationEngine::new(default_roster(), CancelPolicy::AnyPhase);
        let phase = PhaseController::new(Phase::StudentSelecting);

        let barrier = Barrier::new(2);
        thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                phase
                    .set_phase_after(Phase::Setup, &admin, || engine.reset(&admin))
                    .unwrap();
            });
            scope.spawn(|| {
                barrier.wait();
                let _ = phase.gate(|context| engine.apply(context, &id("s1"), &id("t1"), ""));
            });
        });

        // an application either predates the reset or is refused in setup
        assert!(engine.view().selections().is_empty());
        assert_eq!(phase.get_phase(), Phase::Setup);
    }
}
