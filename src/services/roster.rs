//! Roster service: which records a layout or grouping operates on.
//!
//! A scope is either the students of one class or the set of all classes
//! (the overview canvas). Both are loaded in ascending ID order, which is
//! also the grid layout's placement order.

#[cfg(test)]
#[path = "roster_test.rs"]
mod roster_test;

use layout::Entity;
use serde_json::Value;
use tracing::info;

use crate::models::{Class, Record, Student, parse_records};
use crate::store::{Collection, DocumentStore, Filter, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Students whose `class_id` is this class.
    Class(i64),
    /// Every class.
    Classes,
}

impl Scope {
    #[must_use]
    pub fn collection(self) -> Collection {
        match self {
            Self::Class(_) => Collection::Students,
            Self::Classes => Collection::Classes,
        }
    }
}

/// Layout-relevant view of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub entity: Entity,
    pub name: String,
    pub color: Option<String>,
}

impl Member {
    fn from_record(record: &impl Record) -> Self {
        Self {
            entity: record.entity(),
            name: record.name().to_owned(),
            color: record.explicit_color().map(str::to_owned),
        }
    }
}

/// Students of `class_id`.
///
/// # Errors
///
/// Returns `NotFound` if the class does not exist.
pub async fn class_students(store: &dyn DocumentStore, class_id: i64) -> Result<Vec<Student>, StoreError> {
    if store.get(Collection::Classes, class_id).await?.is_none() {
        return Err(StoreError::NotFound { collection: Collection::Classes, id: class_id });
    }
    let docs = store
        .list(Collection::Students, &Filter::field_eq("class_id", class_id))
        .await?;
    Ok(parse_records(docs))
}

/// Members of `scope` in ascending ID order.
///
/// # Errors
///
/// Propagates storage errors; `NotFound` for a missing class.
pub async fn members(store: &dyn DocumentStore, scope: Scope) -> Result<Vec<Member>, StoreError> {
    match scope {
        Scope::Class(class_id) => Ok(class_students(store, class_id)
            .await?
            .iter()
            .map(Member::from_record)
            .collect()),
        Scope::Classes => {
            let classes: Vec<Class> = parse_records(store.list(Collection::Classes, &Filter::all()).await?);
            Ok(classes.iter().map(Member::from_record).collect())
        }
    }
}

/// Delete a class and detach its students (they keep existing, unassigned).
///
/// # Errors
///
/// Returns `NotFound` if the class does not exist.
pub async fn delete_class(store: &dyn DocumentStore, class_id: i64) -> Result<usize, StoreError> {
    store.delete(Collection::Classes, class_id).await?;
    strip_connections(store, Collection::Classes, class_id).await?;

    let docs = store
        .list(Collection::Students, &Filter::field_eq("class_id", class_id))
        .await?;
    let detached = docs.len();
    for mut doc in docs {
        let Some(id) = crate::store::document_id(&doc) else {
            continue;
        };
        doc.insert("class_id".into(), Value::Null);
        store.replace(Collection::Students, id, doc).await?;
    }

    info!(class_id, detached, "class deleted");
    Ok(detached)
}

/// Delete a student and drop its ID from every other student's connections.
///
/// # Errors
///
/// Returns `NotFound` if the student does not exist.
pub async fn delete_student(store: &dyn DocumentStore, student_id: i64) -> Result<(), StoreError> {
    store.delete(Collection::Students, student_id).await?;
    let unlinked = strip_connections(store, Collection::Students, student_id).await?;
    info!(student_id, unlinked, "student deleted");
    Ok(())
}

/// Remove `id` from the `connections` of every record in `collection`.
/// Returns how many records were rewritten.
async fn strip_connections(store: &dyn DocumentStore, collection: Collection, id: i64) -> Result<usize, StoreError> {
    let mut rewritten = 0;
    for mut doc in store.list(collection, &Filter::all()).await? {
        let Some(doc_id) = crate::store::document_id(&doc) else {
            continue;
        };
        let Some(Value::Array(connections)) = doc.get_mut("connections") else {
            continue;
        };
        let before = connections.len();
        connections.retain(|c| c.as_i64() != Some(id));
        if connections.len() == before {
            continue;
        }
        store.replace(collection, doc_id, doc).await?;
        rewritten += 1;
    }
    Ok(rewritten)
}
