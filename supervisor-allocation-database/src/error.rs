use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to access storage file {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize stored data {0}")]
    Json(#[from] serde_json::Error),
}
