use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::directory::{Clock, DirectoryError, StudentDirectory};
use crate::io;
use crate::models::{Student, StudentPayload};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}

/// Handle to the directory shared by every request.
///
/// Reads share the lock. Writes hold it exclusively and, when a snapshot path
/// is set, only become visible after the snapshot reflecting them is on disk.
///
/// A persisted write clones the whole directory and rewrites the full
/// snapshot under the write lock, so each write costs O(n) and reads wait on
/// the disk until it finishes.
#[derive(Clone)]
pub struct SharedDirectory {
    inner: Arc<RwLock<StudentDirectory>>,
    snapshot_path: Option<Arc<PathBuf>>,
}

impl SharedDirectory {
    pub fn in_memory(directory: StudentDirectory) -> Self {
        Self {
            inner: Arc::new(RwLock::new(directory)),
            snapshot_path: None,
        }
    }

    /// Opens the directory persisted at `path`, starting empty if there is none.
    pub async fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            io::prepare_io(parent).await?;
        }

        let directory = match io::read_snapshot(&path).await? {
            Some(snapshot) => StudentDirectory::from_snapshot(snapshot, clock),
            None => StudentDirectory::with_clock(clock),
        };
        if directory.is_empty() {
            log::info!("No saved students at {}, starting empty", path.display());
        }

        Ok(Self {
            inner: Arc::new(RwLock::new(directory)),
            snapshot_path: Some(Arc::new(path)),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref().map(PathBuf::as_path)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn add_student(&self, payload: StudentPayload) -> Result<Option<Student>, StoreError> {
        let created = self.write(|directory| Ok(directory.add_student(payload))).await?;
        match &created {
            Some(student) => log::info!("Created student id={}", student.id),
            None => log::warn!("Student id space exhausted, nothing created"),
        }
        Ok(created)
    }

    pub async fn get_student(&self, id: u64) -> Result<Student, StoreError> {
        log::debug!("Reading student id={}", id);
        Ok(self.inner.read().await.get_student(id)?)
    }

    pub async fn update_student(&self, id: u64, payload: StudentPayload) -> Result<Student, StoreError> {
        let updated = self
            .write(|directory| directory.update_student(id, payload))
            .await?;
        log::info!("Updated student id={}", id);
        Ok(updated)
    }

    pub async fn delete_student(&self, id: u64) -> Result<Student, StoreError> {
        let deleted = self
            .write(|directory| directory.delete_student(id))
            .await?;
        log::info!("Deleted student id={}", id);
        Ok(deleted)
    }

    async fn write<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut StudentDirectory) -> Result<T, DirectoryError>,
    {
        let mut directory = self.inner.write().await;
        let path = match &self.snapshot_path {
            Some(path) => path,
            None => return Ok(op(&mut *directory)?),
        };

        let mut next = directory.clone();
        let out = op(&mut next)?;
        if let Err(err) = io::write_snapshot(path, &next.snapshot()).await {
            log::error!("Failed to persist {}: {:#}", path.display(), err);
            return Err(StoreError::Persist(err));
        }
        *directory = next;
        Ok(out)
    }
}
