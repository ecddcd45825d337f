//! Typed views over stored documents.
//!
//! DESIGN
//! ======
//! Storage is schemaless, so these types are lenient on read: unknown keys
//! are kept in `extra` and written back untouched, and every field the app
//! added over time has a default. The one structural change in the data's
//! history, the student "existence" bundle, is handled by a single migration
//! in `Existence::from_value` rather than by fallbacks at each use site.

#[cfg(test)]
#[path = "models_test.rs"]
mod models_test;

use layout::{Entity, EntityId, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{Document, StoreError};

// =============================================================================
// EXISTENCE
// =============================================================================

/// Current on-disk version of [`Existence`].
pub const EXISTENCE_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
    Star,
    Heart,
}

impl Shape {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "circle" => Some(Self::Circle),
            "square" | "rect" => Some(Self::Square),
            "triangle" => Some(Self::Triangle),
            "star" => Some(Self::Star),
            "heart" => Some(Self::Heart),
            _ => None,
        }
    }
}

/// One activity logged against a student.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ActivityRecord {
    /// Accepts both the current snake_case shape and the legacy camelCase one.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(str::to_owned)
        };
        Some(Self {
            activity_id: ["activity_id", "activityId"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_i64)),
            title: text(&["title", "name"]).unwrap_or_default(),
            note: text(&["note", "memo"]),
            date: text(&["date"]),
        })
    }
}

/// Visual and behavioral attributes of a student particle.
///
/// Always version 2 in memory. Legacy blobs (no `version` key, camelCase
/// `particleColor` / `particleShape` / `particleSize` / `activityRecords`)
/// are migrated when read. A versionless blob that already uses the current
/// keys is read as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Existence {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub shape: Shape,
    pub size: f64,
    pub activities: Vec<ActivityRecord>,
}

impl Default for Existence {
    fn default() -> Self {
        Self { version: EXISTENCE_VERSION, color: None, shape: Shape::Circle, size: 1.0, activities: Vec::new() }
    }
}

impl Existence {
    /// Migrate any stored existence blob to the current version.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        // Current keys win; camelCase keys are only read from unversioned blobs.
        let versioned = obj.contains_key("version");
        let field = |current: &str, old: &str| {
            obj.get(current)
                .or_else(|| if versioned { None } else { obj.get(old) })
        };

        let color = field("color", "particleColor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);
        let shape = field("shape", "particleShape")
            .and_then(Value::as_str)
            .and_then(Shape::parse)
            .unwrap_or_default();
        let size = field("size", "particleSize")
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0);
        let activities = field("activities", "activityRecords")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(ActivityRecord::from_value).collect())
            .unwrap_or_default();

        Self { version: EXISTENCE_VERSION, color, shape, size, activities }
    }
}

impl From<Value> for Existence {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<EntityId>,
    #[serde(default)]
    pub connections: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default)]
    pub existence: Existence,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub connections: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared by the typed records for document conversion and layout input.
pub trait Record: Serialize + for<'de> Deserialize<'de> {
    fn entity(&self) -> Entity;

    /// Explicit display color, if the record sets one.
    fn explicit_color(&self) -> Option<&str>;

    fn name(&self) -> &str;

    /// Parse a stored or submitted document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` if required fields are missing or mistyped.
    fn from_document(doc: Document) -> Result<Self, StoreError> {
        let record: Self =
            serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        if record.name().trim().is_empty() {
            return Err(StoreError::InvalidDocument("name must not be empty".into()));
        }
        Ok(record)
    }

    /// Serialize back to a document.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if serialization fails.
    fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::InvalidDocument("record did not serialize to an object".into())),
        }
    }
}

impl Record for Student {
    fn entity(&self) -> Entity {
        Entity { id: self.id, connections: self.connections.clone(), position: self.position }
    }

    fn explicit_color(&self) -> Option<&str> {
        self.existence.color.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Record for Class {
    fn entity(&self) -> Entity {
        Entity { id: self.id, connections: self.connections.clone(), position: self.position }
    }

    fn explicit_color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Parse every document, skipping (and logging) ones that do not fit.
pub fn parse_records<T: Record>(docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = crate::store::document_id(&doc);
            match T::from_document(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(?id, error = %e, "skipping malformed record");
                    None
                }
            }
        })
        .collect()
}
