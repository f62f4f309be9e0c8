use std::path::PathBuf;

use supervisor_allocation_database::{save_snapshot, DatabaseError, Snapshot, Versions};
use supervisor_allocation_engine::{AllocationEngine, PhaseController};
use tokio::sync::Mutex;

/// Rewrites the snapshot file after committed changes.
///
/// Writers queue on an async lock and take the snapshot only once they hold it, so the last
/// write always carries the newest state. The engine lock is never held across the file write.
#[derive(Debug)]
pub struct Persistence {
    path: PathBuf,
    writer: Mutex<()>,
}

impl Persistence {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            writer: Mutex::new(()),
        }
    }

    pub async fn save(
        &self,
        engine: &AllocationEngine,
        phase: &PhaseController,
    ) -> Result<(), DatabaseError> {
        let _writer = self.writer.lock().await;
        let (context, (view, stores)) =
            phase.gate(|context| (*context, engine.view_with_versions()));
        let snapshot = Snapshot {
            phase: context.phase,
            versions: Versions {
                phase: context.version,
                roster: stores.roster,
                selections: stores.selections,
            },
            persons: view.persons().cloned().collect(),
            selections: view.selections().to_vec(),
        };
        save_snapshot(&self.path, &snapshot).await
    }
}
