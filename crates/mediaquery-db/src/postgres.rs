//! PostgreSQL catalog backend
//!
//! One row per entry in a table keyed by `name`. Labels are stored as a JSONB array of
//! `{name, confidence}` objects so the `label` filter becomes a containment check that a
//! GIN index can serve. All three filters are pushed into SQL with the same semantics as
//! [`ListFilter::matches`].

use async_trait::async_trait;
use mediaquery_core::{AppError, Label, ListFilter, MediaEntry, MediaType};
use serde_json::json;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::catalog::CatalogStore;

/// Repository for the media catalog table
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
    table: String,
}

impl PostgresCatalogStore {
    /// Create a store over an existing pool. `table_name` may contain letters, digits,
    /// `_` and `-` (provisioned names look like `media-query-<uuid>`).
    pub fn new(pool: PgPool, table_name: &str) -> Result<Self, AppError> {
        Ok(Self {
            pool,
            table: quote_identifier(table_name)?,
        })
    }

    /// Create the catalog table and its label index if they do not exist yet
    #[tracing::instrument(skip(self), fields(db.table = %self.table, db.operation = "create"))]
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                name TEXT PRIMARY KEY,
                media_type TEXT NOT NULL,
                labels JSONB NOT NULL DEFAULT '[]'::jsonb
            )
            "#,
            table = self.table
        );
        sqlx::query(&create_table)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let index_name = quote_identifier(&format!("{}_labels_idx", unquote(&self.table)))?;
        let create_index = format!(
            "CREATE INDEX IF NOT EXISTS {index} ON {table} USING GIN (labels jsonb_path_ops)",
            index = index_name,
            table = self.table
        );
        sqlx::query(&create_index)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[tracing::instrument(skip(self, labels), fields(db.table = %self.table, db.operation = "upsert"))]
    async fn upsert(
        &self,
        name: &str,
        media_type: MediaType,
        labels: &[Label],
    ) -> Result<(), AppError> {
        let sql = format!(
            r#"
            INSERT INTO {table} (name, media_type, labels)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET media_type = EXCLUDED.media_type, labels = EXCLUDED.labels
            "#,
            table = self.table
        );

        sqlx::query(&sql)
            .bind(name)
            .bind(media_type.as_str())
            .bind(Json(labels.to_vec()))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = %self.table, db.operation = "select"))]
    async fn get(&self, name: &str) -> Result<Option<MediaEntry>, AppError> {
        let sql = format!(
            "SELECT name, media_type, labels FROM {table} WHERE name = $1",
            table = self.table
        );

        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_entry).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = %self.table, db.operation = "delete"))]
    async fn delete(&self, name: &str) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {table} WHERE name = $1", table = self.table);

        let result = sqlx::query(&sql)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        tracing::debug!(name = %name, rows_affected = result.rows_affected(), "Catalog entry deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = %self.table, db.operation = "select"))]
    async fn list(&self, filter: &ListFilter) -> Result<Vec<MediaEntry>, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT name, media_type, labels FROM {table} WHERE TRUE",
            table = self.table
        ));

        if let Some(prefix) = &filter.startswith {
            query.push(" AND starts_with(name, ");
            query.push_bind(prefix.clone());
            query.push(")");
        }
        if let Some(media_type) = filter.media_type {
            query.push(" AND media_type = ");
            query.push_bind(media_type.as_str());
        }
        if let Some(label) = &filter.label {
            query.push(" AND labels @> ");
            query.push_bind(Json(json!([{ "name": label }])));
        }
        // Byte order, so listings sort the same way as the other backends
        query.push(" ORDER BY name COLLATE \"C\"");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn row_to_entry(row: &PgRow) -> Result<MediaEntry, AppError> {
    let name: String = row.try_get("name").map_err(map_sqlx_error)?;
    let media_type: String = row.try_get("media_type").map_err(map_sqlx_error)?;
    let Json(labels): Json<Vec<Label>> = row.try_get("labels").map_err(map_sqlx_error)?;

    let media_type = media_type.parse::<MediaType>().map_err(|_| {
        AppError::Internal(format!(
            "Catalog entry {} has unknown media type '{}'",
            name, media_type
        ))
    })?;

    Ok(MediaEntry::new(name, media_type, labels))
}

/// Decode failures mean a malformed row; everything else is the database being
/// unreachable or refusing the statement.
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            AppError::Internal(format!("Failed to decode catalog row: {}", err))
        }
        other => {
            tracing::error!(error = %other, "Catalog database error");
            AppError::StoreUnavailable(other.to_string())
        }
    }
}

fn quote_identifier(name: &str) -> Result<String, AppError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::InvalidInput(format!(
            "Invalid catalog table name '{}'",
            name
        )));
    }
    Ok(format!("\"{}\"", name))
}

fn unquote(identifier: &str) -> &str {
    identifier.trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_accepts_provisioned_names() {
        assert_eq!(
            quote_identifier("media-query-1234").unwrap(),
            "\"media-query-1234\""
        );
        assert_eq!(quote_identifier("media_catalog").unwrap(), "\"media_catalog\"");
    }

    #[test]
    fn test_quote_identifier_rejects_injection() {
        assert!(quote_identifier("media\"; DROP TABLE x; --").is_err());
        assert!(quote_identifier("").is_err());
        assert!(quote_identifier("a b").is_err());
    }

    #[test]
    fn test_decode_errors_are_internal() {
        let err = map_sqlx_error(sqlx::Error::ColumnNotFound("labels".to_string()));
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_transport_errors_are_store_unavailable() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }
}
