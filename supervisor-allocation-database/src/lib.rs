//! Records of the supervisor allocation and the storage they live in.
//!
//! Nothing in here knows about phases gating actions or quotas being exhausted, that is
//! the job of the engine. This crate only defines what is stored and how.

extern crate alloc;

pub mod error;
pub mod models;
pub mod roster;
pub mod snapshot;
pub mod store;

pub use error::DatabaseError;
pub use models::{
    InstructorProfile, Person, PersonId, PersonKind, Phase, Role, Selection, SelectionId,
    SelectionStatus,
};
pub use snapshot::{load_snapshot, save_snapshot, Snapshot, Versions};
pub use store::{MappingStore, MemoryStore, PersonDirectory};
