//! Phase-gated allocation of students to supervising instructors.
//!
//! Students apply to an instructor while the [`Phase`] is `StudentSelecting`, instructors
//! confirm or reject while it is `InstructorConfirming`. The [`AllocationEngine`] guarantees
//! that a student never holds two active selections and that an instructor never has more
//! confirmed selections than their confirm quota, no matter how calls interleave.

extern crate alloc;

pub mod caller;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod phase;
pub mod view;

pub use caller::Caller;
pub use engine::{AllocationEngine, Outcome, StoreVersions};
pub use error::{AdminError, ApplyError, CancelError, DecideError, ErrorKind};
pub use ledger::Fill;
pub use phase::{PhaseContext, PhaseController};
pub use supervisor_allocation_database::{Person, PersonId, Phase, Role, Selection, SelectionId};
pub use view::{
    AllocationView, Applications, InstructorOverview, InstructorStats, MatchedPair,
    RosterSummary, StudentStatus,
};
