//! JSON-file document store.
//!
//! DESIGN
//! ======
//! The whole data set lives in one JSON document
//! `{classes, students, activities, items}`, loaded at startup and held
//! behind an `RwLock`. Every mutation is applied to the in-memory snapshot
//! and then the full document is rewritten (temp file + rename) while the
//! write guard is still held, so writes are serialized and the file never
//! holds a half-written document. Each collection's next ID is persisted
//! alongside the records, so a deleted record's ID is never handed out again.
//!
//! ERROR HANDLING
//! ==============
//! If the rewrite fails the in-memory snapshot is restored to its previous
//! state, so memory and disk never disagree about a mutation the caller was
//! told failed.

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use layout::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Collection, Document, DocumentStore, Filter, StoreError, document_id, position_value, stored_position};

/// On-disk layout of the data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub classes: Vec<Document>,
    #[serde(default)]
    pub students: Vec<Document>,
    #[serde(default)]
    pub activities: Vec<Document>,
    #[serde(default)]
    pub items: Vec<Document>,
    /// Per-collection high-water mark: the next ID to hand out. IDs of
    /// deleted records are never reused.
    #[serde(default)]
    pub next_ids: BTreeMap<String, i64>,
}

impl Snapshot {
    #[must_use]
    pub fn records(&self, collection: Collection) -> &Vec<Document> {
        match collection {
            Collection::Classes => &self.classes,
            Collection::Students => &self.students,
            Collection::Activities => &self.activities,
            Collection::Items => &self.items,
        }
    }

    fn records_mut(&mut self, collection: Collection) -> &mut Vec<Document> {
        match collection {
            Collection::Classes => &mut self.classes,
            Collection::Students => &mut self.students,
            Collection::Activities => &mut self.activities,
            Collection::Items => &mut self.items,
        }
    }

    /// Next ID for `collection`: the recorded high-water mark, or one past the
    /// highest ID present for files written before the mark existed. Starts at 1.
    #[must_use]
    pub fn next_id(&self, collection: Collection) -> i64 {
        let present = self.records(collection).iter().filter_map(document_id).max().unwrap_or(0) + 1;
        self.next_ids.get(collection.as_str()).map_or(present, |&mark| mark.max(present))
    }

    fn claim_id(&mut self, collection: Collection) -> i64 {
        let id = self.next_id(collection);
        self.next_ids.insert(collection.as_str().to_owned(), id + 1);
        id
    }

    fn find_mut(&mut self, collection: Collection, id: i64) -> Option<&mut Document> {
        self.records_mut(collection)
            .iter_mut()
            .find(|doc| document_id(doc) == Some(id))
    }
}

pub struct FileStore {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl FileStore {
    /// Load the data file, starting empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Snapshot::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "data file missing, starting empty");
                Snapshot::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, snapshot: RwLock::new(snapshot) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current in-memory document.
    #[cfg(test)]
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Apply `mutate` and rewrite the file, rolling back on write failure.
    async fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.snapshot.write().await;
        self.commit(&mut *guard, mutate).await
    }

    /// Like `mutate`, but only if `check` passes on the current snapshot
    /// under the same write guard. Returns `None` (no rewrite) otherwise.
    async fn mutate_if<T>(
        &self,
        check: impl FnOnce(&Snapshot) -> Result<bool, StoreError>,
        mutate: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<Option<T>, StoreError> {
        let mut guard = self.snapshot.write().await;
        if !check(&*guard)? {
            return Ok(None);
        }
        self.commit(&mut *guard, mutate).await.map(Some)
    }

    async fn commit<T>(
        &self,
        snapshot: &mut Snapshot,
        mutate: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let previous = snapshot.clone();
        let result = mutate(&mut *snapshot)?;
        if let Err(e) = write_atomic(&self.path, &*snapshot).await {
            *snapshot = previous;
            return Err(e);
        }
        Ok(result)
    }
}

async fn write_atomic(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "data file rewritten");
    Ok(())
}

#[async_trait]
impl DocumentStore for FileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let snapshot = self.snapshot.read().await;
        let mut docs: Vec<Document> = snapshot
            .records(collection)
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        docs.sort_by_key(|doc| document_id(doc).unwrap_or(i64::MAX));
        Ok(docs)
    }

    async fn get(&self, collection: Collection, id: i64) -> Result<Option<Document>, StoreError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .records(collection)
            .iter()
            .find(|doc| document_id(doc) == Some(id))
            .cloned())
    }

    async fn insert(&self, collection: Collection, mut doc: Document) -> Result<Document, StoreError> {
        self.mutate(|snapshot| {
            let id = snapshot.claim_id(collection);
            doc.insert("id".into(), Value::from(id));
            snapshot.records_mut(collection).push(doc.clone());
            Ok(doc)
        })
        .await
    }

    async fn replace(&self, collection: Collection, id: i64, mut doc: Document) -> Result<Document, StoreError> {
        self.mutate(|snapshot| {
            let slot = snapshot
                .find_mut(collection, id)
                .ok_or(StoreError::NotFound { collection, id })?;
            doc.insert("id".into(), Value::from(id));
            slot.clone_from(&doc);
            Ok(doc)
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: i64) -> Result<(), StoreError> {
        self.mutate(|snapshot| {
            let records = snapshot.records_mut(collection);
            let before = records.len();
            records.retain(|doc| document_id(doc) != Some(id));
            if records.len() == before {
                return Err(StoreError::NotFound { collection, id });
            }
            Ok(())
        })
        .await
    }

    async fn save_position(&self, collection: Collection, id: i64, position: Point) -> Result<(), StoreError> {
        self.mutate(|snapshot| {
            let doc = snapshot
                .find_mut(collection, id)
                .ok_or(StoreError::NotFound { collection, id })?;
            doc.insert("position".into(), position_value(position));
            Ok(())
        })
        .await
    }

    async fn save_position_if(
        &self,
        collection: Collection,
        id: i64,
        expected: Option<Point>,
        position: Point,
    ) -> Result<bool, StoreError> {
        let applied = self
            .mutate_if(
                |snapshot| {
                    let doc = snapshot
                        .records(collection)
                        .iter()
                        .find(|doc| document_id(doc) == Some(id))
                        .ok_or(StoreError::NotFound { collection, id })?;
                    Ok(stored_position(doc) == expected)
                },
                |snapshot| {
                    let doc = snapshot
                        .find_mut(collection, id)
                        .ok_or(StoreError::NotFound { collection, id })?;
                    doc.insert("position".into(), position_value(position));
                    Ok(())
                },
            )
            .await?;
        Ok(applied.is_some())
    }
}
