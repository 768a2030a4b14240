//! Project registry: an in-memory list persisted through a `RecordStore`.
//!
//! The registry is loaded once at startup and is the single source of truth
//! afterwards. Every mutation rewrites the full backing file; a failed write
//! is reported to the caller but never rolls back the in-memory list, which
//! stays authoritative until the next successful write.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::project::Project;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store write failed: {0}")]
    WriteFailed(String),
    #[error("corrupt record data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The persistence capability the registry needs: a single overwritable
/// blob. Where it lives (local file, remote object) is the adapter's
/// business.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn exists(&self) -> bool;
    async fn load(&self) -> Result<Vec<u8>, StoreError>;
    async fn write(&self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Record store over a local JSON file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn load(&self) -> Result<Vec<u8>, StoreError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", self.path.display())))
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {e}", self.path.display())))
    }
}

/// In-memory record store (for testing).
#[derive(Default)]
pub struct MemoryStore {
    bytes: std::sync::Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an already-serialized project list.
    pub fn seeded(projects: &[Project]) -> Self {
        let store = Self::default();
        *store.bytes.lock().unwrap() = Some(serde_json::to_vec_pretty(projects).unwrap());
        store
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn exists(&self) -> bool {
        self.bytes.lock().unwrap().is_some()
    }

    async fn load(&self) -> Result<Vec<u8>, StoreError> {
        self.bytes
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StoreError::Unavailable("empty memory store".to_string()))
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
        *self.bytes.lock().unwrap() = Some(bytes.to_vec());
        Ok(())
    }
}

/// The project registry.
///
/// The lock covers every read-compute-write unit, so id assignment and
/// insertion are one atomic step and concurrent creates can never mint the
/// same id.
pub struct ProjectStore {
    records: Mutex<Vec<Project>>,
    backing: Box<dyn RecordStore>,
}

impl ProjectStore {
    /// Load the registry once. An unreachable backing medium degrades to an
    /// empty registry: the bot stays up, the gap is logged.
    pub async fn open(backing: Box<dyn RecordStore>) -> Self {
        let records = if backing.exists().await {
            match Self::read_all(backing.as_ref()).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not load project registry, starting empty");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        tracing::info!(projects = records.len(), "Project registry loaded");
        Self { records: Mutex::new(records), backing }
    }

    async fn read_all(backing: &dyn RecordStore) -> Result<Vec<Project>, StoreError> {
        let bytes = backing.load().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Next id: one past the highest ever assigned still present, never
    /// reusing an id freed by deletion within the same list.
    fn next_id(records: &[Project]) -> u32 {
        records.iter().map(|p| p.id).max().map_or(1, |max| max + 1)
    }

    async fn persist(&self, records: &[Project]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        self.backing.write(&bytes).await
    }

    pub async fn snapshot(&self) -> Vec<Project> {
        self.records.lock().await.clone()
    }

    pub async fn get(&self, id: u32) -> Option<Project> {
        self.records.lock().await.iter().find(|p| p.id == id).cloned()
    }

    /// Assign the next id, insert, persist, all in one critical section. The
    /// returned project carries its assigned id even when the write failed.
    pub async fn insert(&self, mut project: Project) -> (Project, Result<(), StoreError>) {
        let mut records = self.records.lock().await;
        project.id = Self::next_id(&records);
        records.push(project.clone());
        let saved = self.persist(&records).await;
        (project, saved)
    }

    /// Replace the record with the same id, then persist.
    pub async fn update(&self, project: &Project) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        match records.iter_mut().find(|p| p.id == project.id) {
            Some(slot) => *slot = project.clone(),
            None => {
                tracing::warn!(id = project.id, "Update for a project no longer in the registry");
                return Ok(());
            }
        }
        self.persist(&records).await
    }

    /// Remove by id, then persist. Returns the removed record, if any.
    pub async fn remove(&self, id: u32) -> (Option<Project>, Result<(), StoreError>) {
        let mut records = self.records.lock().await;
        let Some(index) = records.iter().position(|p| p.id == id) else {
            return (None, Ok(()));
        };
        let removed = records.remove(index);
        let saved = self.persist(&records).await;
        (Some(removed), saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Project {
        Project { name: name.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn ids_are_assigned_monotonically_and_never_reused() {
        let store = ProjectStore::open(Box::new(MemoryStore::new())).await;
        let (alpha, _) = store.insert(named("Alpha")).await;
        let (beta, _) = store.insert(named("Beta")).await;
        assert_eq!(alpha.id, 1);
        assert_eq!(beta.id, 2);

        store.remove(beta.id).await;
        let (gamma, _) = store.insert(named("Gamma")).await;
        assert_eq!(gamma.id, 2, "highest surviving id is 1, so the next is 2");

        store.remove(alpha.id).await;
        store.remove(gamma.id).await;
        let (delta, _) = store.insert(named("Delta")).await;
        assert_eq!(delta.id, 1, "empty registry starts over at 1");
    }

    #[tokio::test]
    async fn registry_round_trips_field_for_field() {
        let backing = std::sync::Arc::new(MemoryStore::new());

        struct Shared(std::sync::Arc<MemoryStore>);
        #[async_trait]
        impl RecordStore for Shared {
            async fn exists(&self) -> bool {
                self.0.exists().await
            }
            async fn load(&self) -> Result<Vec<u8>, StoreError> {
                self.0.load().await
            }
            async fn write(&self, bytes: &[u8]) -> Result<(), StoreError> {
                self.0.write(bytes).await
            }
        }

        let store = ProjectStore::open(Box::new(Shared(backing.clone()))).await;
        let (mut alpha, _) = store.insert(named("Alpha")).await;
        alpha.description = "first".to_string();
        alpha.is_minted = true;
        alpha.message_id = hive_discord::MessageId(9);
        store.update(&alpha).await.unwrap();

        let reloaded = ProjectStore::open(Box::new(Shared(backing))).await;
        assert_eq!(reloaded.snapshot().await, vec![alpha]);
    }

    #[tokio::test]
    async fn delete_then_reload_keeps_only_the_survivor() {
        let seeded = MemoryStore::seeded(&[
            Project { id: 1, name: "Alpha".into(), ..Default::default() },
        ]);
        let store = ProjectStore::open(Box::new(seeded)).await;
        let (beta, _) = store.insert(named("Beta")).await;
        assert_eq!(beta.id, 2);

        let (removed, saved) = store.remove(1).await;
        assert_eq!(removed.unwrap().name, "Alpha");
        saved.unwrap();

        let survivors = store.snapshot().await;
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, 2);
    }

    #[tokio::test]
    async fn unreachable_backing_degrades_to_an_empty_registry() {
        struct Broken;
        #[async_trait]
        impl RecordStore for Broken {
            async fn exists(&self) -> bool {
                true
            }
            async fn load(&self) -> Result<Vec<u8>, StoreError> {
                Err(StoreError::Unavailable("medium offline".to_string()))
            }
            async fn write(&self, _bytes: &[u8]) -> Result<(), StoreError> {
                Err(StoreError::WriteFailed("medium offline".to_string()))
            }
        }

        let store = ProjectStore::open(Box::new(Broken)).await;
        assert!(store.snapshot().await.is_empty());

        // Writes keep failing, but the in-memory list stays authoritative.
        let (alpha, saved) = store.insert(named("Alpha")).await;
        assert_eq!(alpha.id, 1);
        assert!(matches!(saved, Err(StoreError::WriteFailed(_))));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn file_store_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.json");

        let store = ProjectStore::open(Box::new(FileStore::new(&path))).await;
        let (alpha, saved) = store.insert(named("Alpha")).await;
        saved.unwrap();

        let reloaded = ProjectStore::open(Box::new(FileStore::new(&path))).await;
        assert_eq!(reloaded.snapshot().await, vec![alpha]);

        // The layout on disk is a plain JSON array.
        let raw: Vec<Project> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 1);
    }
}
