//! Document storage behind a single trait.
//!
//! DESIGN
//! ======
//! Records are schemaless JSON objects carrying an integer `id`, grouped in
//! four collections. The file backend keeps the whole data set in one JSON
//! document and rewrites it on every mutation; the Postgres backend keeps one
//! JSONB row per record. Handlers only see `dyn DocumentStore`, so the
//! backend is a startup decision. Concurrent writers resolve last-write-wins,
//! except layout write-backs, which go through `save_position_if` so they
//! never clobber a position written after the layout was computed.

pub mod file;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use layout::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use file::FileStore;
pub use postgres::PgStore;

/// A stored record: a JSON object with an integer `id` key.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Classes,
    Students,
    Activities,
    Items,
}

impl Collection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classes => "classes",
            Self::Students => "students",
            Self::Activities => "activities",
            Self::Items => "items",
        }
    }

    /// Name of one record, for error messages.
    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::Classes => "class",
            Self::Students => "student",
            Self::Activities => "activity",
            Self::Items => "item",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter on one top-level field. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    field: Option<(String, Value)>,
}

impl Filter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: Some((field.into(), value.into())) }
    }

    #[must_use]
    pub fn field(&self) -> Option<(&str, &Value)> {
        self.field.as_ref().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match &self.field {
            None => true,
            Some((key, value)) => doc.get(key) == Some(value),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("{} {id} not found", collection.singular())]
    NotFound { collection: Collection, id: i64 },
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The storage collaborator used by every route.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Records in `collection` matching `filter`, ordered by ascending ID.
    async fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: Collection, id: i64) -> Result<Option<Document>, StoreError>;

    /// Store a new record. Any `id` in `doc` is ignored; the next free ID is
    /// assigned and returned in the stored document.
    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, StoreError>;

    /// Replace an existing record wholesale. The path ID wins over any `id` in `doc`.
    async fn replace(&self, collection: Collection, id: i64, doc: Document) -> Result<Document, StoreError>;

    async fn delete(&self, collection: Collection, id: i64) -> Result<(), StoreError>;

    /// Overwrite only the `position` field of a record.
    async fn save_position(&self, collection: Collection, id: i64, position: Point) -> Result<(), StoreError>;

    /// Write `position` only if the stored position still equals `expected`
    /// (`None` meaning no position). Returns `false`, leaving the record
    /// untouched, when another write got there first.
    async fn save_position_if(
        &self,
        collection: Collection,
        id: i64,
        expected: Option<Point>,
        position: Point,
    ) -> Result<bool, StoreError>;
}

/// Integer ID of a document, if present.
#[must_use]
pub fn document_id(doc: &Document) -> Option<i64> {
    doc.get("id").and_then(Value::as_i64)
}

/// A document's stored position, if it has a well-formed one.
#[must_use]
pub fn stored_position(doc: &Document) -> Option<Point> {
    Point::deserialize(doc.get("position")?).ok()
}

/// JSON value stored in a document's `position` field.
#[must_use]
pub fn position_value(position: Point) -> Value {
    serde_json::json!({ "x": position.x, "y": position.y })
}
