//! Postgres-backed document store.
//!
//! One row per record in `documents(collection, id, body)`. The `id` column
//! is authoritative; `body` is stored without it and the ID is merged back
//! in on read, so the JSON shape matches the file backend exactly. IDs are
//! claimed from `id_counters`, which only moves forward, so deleted IDs are
//! never reissued.

use async_trait::async_trait;
use layout::Point;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

use super::{Collection, Document, DocumentStore, Filter, StoreError, position_value};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn with_id(id: i64, Json(body): Json<Value>) -> Document {
    let mut doc = match body {
        Value::Object(map) => map,
        _ => Document::new(),
    };
    doc.insert("id".into(), Value::from(id));
    doc
}

fn without_id(mut doc: Document) -> Value {
    doc.remove("id");
    Value::Object(doc)
}

/// Pool exhaustion and refused connections are "storage unavailable"; the
/// rest are ordinary database errors.
fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let rows = match filter.field() {
            None => {
                sqlx::query_as::<_, (i64, Json<Value>)>(
                    "SELECT id, body FROM documents WHERE collection = $1 ORDER BY id",
                )
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await
            }
            Some((field, value)) => {
                sqlx::query_as::<_, (i64, Json<Value>)>(
                    "SELECT id, body FROM documents
                     WHERE collection = $1 AND body -> $2 = $3
                     ORDER BY id",
                )
                .bind(collection.as_str())
                .bind(field)
                .bind(Json(value.clone()))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(classify)?;

        Ok(rows.into_iter().map(|(id, body)| with_id(id, body)).collect())
    }

    async fn get(&self, collection: Collection, id: i64) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, (i64, Json<Value>)>(
            "SELECT id, body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        Ok(row.map(|(id, body)| with_id(id, body)))
    }

    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, StoreError> {
        let body = without_id(doc);
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "WITH claimed AS (
                 INSERT INTO id_counters (collection, last_id) VALUES ($1, 1)
                 ON CONFLICT (collection) DO UPDATE SET last_id = id_counters.last_id + 1
                 RETURNING last_id
             )
             INSERT INTO documents (collection, id, body)
             SELECT $1, last_id, $2 FROM claimed
             RETURNING id",
        )
        .bind(collection.as_str())
        .bind(Json(body.clone()))
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(with_id(id, Json(body)))
    }

    async fn replace(&self, collection: Collection, id: i64, doc: Document) -> Result<Document, StoreError> {
        let body = without_id(doc);
        let result = sqlx::query(
            "UPDATE documents SET body = $3, updated_at = now() WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(body.clone()))
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(with_id(id, Json(body)))
    }

    async fn delete(&self, collection: Collection, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(())
    }

    async fn save_position(&self, collection: Collection, id: i64, position: Point) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents
             SET body = jsonb_set(body, '{position}', $3, true), updated_at = now()
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(position_value(position)))
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(())
    }

    async fn save_position_if(
        &self,
        collection: Collection,
        id: i64,
        expected: Option<Point>,
        position: Point,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE documents
             SET body = jsonb_set(body, '{position}', $3, true), updated_at = now()
             WHERE collection = $1 AND id = $2 AND body -> 'position' IS NOT DISTINCT FROM $4",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(position_value(position)))
        .bind(expected.map(|p| Json(position_value(p))))
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        // Either the record is gone or its position moved on.
        match self.get(collection, id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound { collection, id }),
        }
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
mod tests {
    use super::*;

    async fn live_store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for live-db-tests");
        let pool = crate::db::init_pool(&url, 2).await.expect("pool");
        sqlx::query("DELETE FROM documents").execute(&pool).await.expect("reset");
        sqlx::query("DELETE FROM id_counters").execute(&pool).await.expect("reset counters");
        PgStore::new(pool)
    }

    #[tokio::test]
    async fn insert_list_and_position_round_trip() {
        let store = live_store().await;
        let mut doc = Document::new();
        doc.insert("name".into(), Value::from("민수"));
        doc.insert("class_id".into(), Value::from(1));
        let stored = store.insert(Collection::Students, doc).await.unwrap();
        let id = stored["id"].as_i64().unwrap();

        store.save_position(Collection::Students, id, Point::new(3.0, 4.0)).await.unwrap();
        let listed = store
            .list(Collection::Students, &Filter::field_eq("class_id", 1))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["position"]["x"], 3.0);

        let stale = store
            .save_position_if(Collection::Students, id, None, Point::new(9.0, 9.0))
            .await
            .unwrap();
        assert!(!stale);
        let current = store
            .save_position_if(Collection::Students, id, Some(Point::new(3.0, 4.0)), Point::new(9.0, 9.0))
            .await
            .unwrap();
        assert!(current);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = live_store().await;
        let named = |name: &str| {
            let mut doc = Document::new();
            doc.insert("name".into(), Value::from(name));
            doc
        };
        let first = store.insert(Collection::Classes, named("a")).await.unwrap();
        let second = store.insert(Collection::Classes, named("b")).await.unwrap();
        store.delete(Collection::Classes, second["id"].as_i64().unwrap()).await.unwrap();
        let third = store.insert(Collection::Classes, named("c")).await.unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(third["id"], 3);
    }
}
