//! File-backed habit store.

use crate::error::{StoreError, StoreResult};
use crate::store::{LocalHabitStore, MemoryHabitStore, RowStream};
use async_trait::async_trait;
use habitsync_core::{DateKey, HabitId, HabitRow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    habits: Vec<HabitRow>,
}

/// A habit store persisted as a JSON snapshot.
///
/// Rows are served from memory. Every write rewrites the whole snapshot to a
/// temporary file, syncs it and renames it over the previous one before the
/// write is acknowledged, so a crash leaves either the old or the new file.
///
/// # Example
///
/// ```no_run
/// # async fn demo() -> habitsync_engine::StoreResult<()> {
/// use habitsync_engine::FileHabitStore;
///
/// let store = FileHabitStore::open("habits.json").await?;
/// println!("{} habits on disk", store.len());
/// # Ok(())
/// # }
/// ```
pub struct FileHabitStore {
    path: PathBuf,
    memory: MemoryHabitStore,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileHabitStore {
    /// Opens the snapshot at `path`, starting empty if it does not exist.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let rows = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(StoreError::Corrupt(format!(
                        "unsupported snapshot version {}",
                        snapshot.version
                    )));
                }
                snapshot.habits
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), habits = rows.len(), "opened habit snapshot");

        Ok(Self {
            path,
            memory: MemoryHabitStore::with_rows(rows),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Returns the path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every stored row, ordered by id.
    pub fn rows(&self) -> Vec<HabitRow> {
        self.memory.rows()
    }

    /// Returns the number of stored rows.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    async fn write_snapshot(&self, habits: Vec<HabitRow>) -> StoreResult<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            habits,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalHabitStore for FileHabitStore {
    fn observe_by_date(&self, key: DateKey) -> RowStream {
        self.memory.observe_by_date(key)
    }

    async fn upsert(&self, row: HabitRow) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut habits = self.memory.rows();
        match habits.iter_mut().find(|existing| existing.id == row.id) {
            Some(slot) => *slot = row.clone(),
            None => habits.push(row.clone()),
        }
        self.write_snapshot(habits).await?;

        self.memory.commit(row)
    }

    async fn find_by_id(&self, id: &HabitId) -> StoreResult<Option<HabitRow>> {
        self.memory.lookup(id)
    }
}
