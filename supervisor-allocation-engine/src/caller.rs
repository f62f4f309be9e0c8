use serde::Serialize;
use supervisor_allocation_database::{Person, PersonId, Role};

/// Who is asking. The identity is asserted by the caller, there is no authentication here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: PersonId,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<PersonId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    #[must_use]
    pub fn of(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            role: person.role(),
        }
    }

    #[must_use]
    pub const fn is_administrator(&self) -> bool {
        match self.role {
            Role::Administrator => true,
            Role::Student | Role::Instructor => false,
        }
    }
}
