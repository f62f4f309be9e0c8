pub mod admin;
pub mod instructors;
pub mod phase;
pub mod reports;
pub mod selections;
pub mod students;
