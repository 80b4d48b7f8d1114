use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::info;
use sawa_core::store::{
    prepare_new, stamp_patch, Collection, Document, DocumentStore, Filter, Op, StoreError, StoreResult,
};

/// Documents live in one `documents` table as JSONB, keyed by
/// `(collection, id)`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pub pool: Pool<Postgres>,
}

impl PgDocumentStore {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// `SELECT` over one collection, newest first. `created_date` is cast so
/// stamps with different fractional precision still order by time.
fn select_query<'a>(collection: Collection, filters: &[Filter]) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE collection = ");
    qb.push_bind(collection.as_str());
    push_filters(&mut qb, filters);
    qb.push(" ORDER BY (body ->> 'created_date')::timestamptz DESC NULLS LAST, id");
    qb
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for filter in filters {
        qb.push(" AND ");
        match filter.op {
            Op::Eq => {
                qb.push("(body -> ");
                qb.push_bind(filter.field.clone());
                qb.push(") = ");
                qb.push_bind(Json(filter.value.clone()));
            }
            Op::Ne => {
                qb.push("(body -> ");
                qb.push_bind(filter.field.clone());
                qb.push(") IS DISTINCT FROM ");
                qb.push_bind(Json(filter.value.clone()));
            }
            Op::In => {
                let options = match &filter.value {
                    Value::Array(_) => filter.value.clone(),
                    other => Value::Array(vec![other.clone()]),
                };
                qb.push("(body ? ");
                qb.push_bind(filter.field.clone());
                qb.push(" AND ");
                qb.push_bind(Json(options));
                qb.push(" @> jsonb_build_array(body -> ");
                qb.push_bind(filter.field.clone());
                qb.push("))");
            }
            Op::ArrayContains => {
                qb.push("(jsonb_typeof(body -> ");
                qb.push_bind(filter.field.clone());
                qb.push(") = 'array' AND (body -> ");
                qb.push_bind(filter.field.clone());
                qb.push(") @> jsonb_build_array(");
                qb.push_bind(Json(filter.value.clone()));
                qb.push("))");
            }
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_document(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<Json<Value>> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(row.map(|Json(body)| body))
    }

    async fn query_documents(&self, collection: Collection, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let mut qb = select_query(collection, filters);
        let rows: Vec<Json<Value>> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(|Json(body)| body).collect())
    }

    async fn add_document(&self, collection: Collection, mut data: Document) -> StoreResult<Document> {
        let id = prepare_new(&mut data)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(Json(&data))
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => StoreError::already_exists(collection, &id),
                _ => backend(e),
            })?;
        Ok(data)
    }

    async fn update_document(&self, collection: Collection, id: &str, mut patch: Document) -> StoreResult<Document> {
        stamp_patch(&mut patch)?;
        let row: Option<Json<Value>> = sqlx::query_scalar(
            "UPDATE documents SET body = body || $3, updated_at = now() \
             WHERE collection = $1 AND id = $2 RETURNING body",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&patch))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|Json(body)| body)
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn update_document_if(
        &self,
        collection: Collection,
        id: &str,
        filters: &[Filter],
        mut patch: Document,
    ) -> StoreResult<Option<Document>> {
        stamp_patch(&mut patch)?;
        // Single statement: the row lock taken by UPDATE makes check-and-write atomic
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE documents SET body = body || ");
        qb.push_bind(Json(patch));
        qb.push(", updated_at = now() WHERE collection = ");
        qb.push_bind(collection.as_str());
        qb.push(" AND id = ");
        qb.push_bind(id.to_string());
        push_filters(&mut qb, filters);
        qb.push(" RETURNING body");

        let row: Option<Json<Value>> = qb
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|Json(body)| body))
    }

    async fn set_document(&self, collection: Collection, id: &str, mut data: Document) -> StoreResult<Document> {
        match data.as_object_mut() {
            Some(obj) => {
                obj.insert("id".into(), Value::String(id.to_string()));
            }
            None => {
                let mut obj = Map::new();
                obj.insert("id".into(), Value::String(id.to_string()));
                obj.insert("value".into(), data);
                data = Value::Object(obj);
            }
        }
        prepare_new(&mut data)?;

        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body, updated_at = now()",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&data))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(data)
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}
