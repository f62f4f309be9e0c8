use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DatabaseError;
use crate::models::{Person, Phase, Selection};

/// Everything needed to bring the system back after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    /// Missing in snapshots written before versions were stored, all counters start at 0 then.
    #[serde(default)]
    pub versions: Versions,
    pub persons: Vec<Person>,
    pub selections: Vec<Selection>,
}

/// Version counters at the time of the snapshot, so pollers never see a number reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    pub phase: u64,
    pub roster: u64,
    pub selections: u64,
}

/// Returns `None` if no snapshot was written yet.
pub async fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, DatabaseError> {
    match tokio::fs::read(path).await {
        Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Writes to a sibling temporary file first so a crash never leaves a half written snapshot.
pub async fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), DatabaseError> {
    let content = serde_json::to_vec_pretty(snapshot)?;
    let temporary = path.with_extension("json.tmp");
    tokio::fs::write(&temporary, content).await?;
    tokio::fs::rename(&temporary, path).await?;
    debug!(
        path = %path.display(),
        selections = snapshot.selections.len(),
        "wrote snapshot"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{PersonId, SelectionId, SelectionStatus};
    use crate::roster::default_roster;

    #[tokio::test]
    async fn missing_file_is_no_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_snapshot(&dir.path().join("state.json")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn saved_snapshot_is_loaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let snapshot = Snapshot {
            phase: Phase::InstructorConfirming,
            versions: Versions {
                phase: 2,
                roster: 9,
                selections: 14,
            },
            persons: default_roster(),
            selections: vec![Selection {
                id: SelectionId::generate(),
                student: PersonId::from("s1"),
                instructor: PersonId::from("t2"),
                rationale: "distributed systems project".to_owned(),
                status: SelectionStatus::Pending,
                created_at: Utc::now(),
            }],
        };
        save_snapshot(&path, &snapshot).await.unwrap();
        assert_eq!(load_snapshot(&path).await.unwrap(), Some(snapshot));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn snapshot_without_versions_starts_counting_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, br#"{"phase": "setup", "persons": [], "selections": []}"#)
            .await
            .unwrap();
        let snapshot = load_snapshot(&path).await.unwrap().unwrap();
        assert_eq!(snapshot.phase, Phase::Setup);
        assert_eq!(snapshot.versions, Versions::default());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();
        assert!(matches!(
            load_snapshot(&path).await,
            Err(DatabaseError::Json(_))
        ));
    }
}
