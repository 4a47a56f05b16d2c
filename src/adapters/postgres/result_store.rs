//! PostgreSQL implementation of ResultStore.
//!
//! Persists assistant results to the `assistant_results` table created by the
//! embedded migrations in `migrations/`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::collections::BTreeMap;

use crate::domain::foundation::{ResultId, Timestamp, UserId};
use crate::domain::writing::{AssistantResult, StopReason, TokenUsage, WritingRequest};
use crate::ports::{ResultStore, StoreError};

/// PostgreSQL implementation of ResultStore.
#[derive(Clone)]
pub struct PostgresResultStore {
    pool: PgPool,
}

impl PostgresResultStore {
    /// Creates a new PostgresResultStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::storage(format!("Failed to connect: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::storage(format!("Failed to run migrations: {}", e)))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ResultStore for PostgresResultStore {
    async fn save(&self, result: &AssistantResult) -> Result<(), StoreError> {
        let request = result.original_request();
        let options = serde_json::to_string(&request.options)
            .map_err(|e| StoreError::serialization(e.to_string()))?;
        let usage = result.usage();

        sqlx::query(
            r#"
            INSERT INTO assistant_results (
                id, user_id, tool_id, requested_tool_id, input_text, options,
                output, stop_reason, input_tokens, output_tokens, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*result.id().as_uuid())
        .bind(request.user_id.as_str())
        .bind(result.tool_id())
        .bind(&request.tool_id)
        .bind(&request.input_text)
        .bind(options)
        .bind(result.output())
        .bind(stop_reason_to_str(result.stop_reason()))
        .bind(i64::from(usage.input_tokens))
        .bind(i64::from(usage.output_tokens))
        .bind(*result.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::storage(format!("Failed to insert result: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ResultId) -> Result<Option<AssistantResult>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, tool_id, requested_tool_id, input_text, options,
                   output, stop_reason, input_tokens, output_tokens, created_at
            FROM assistant_results
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::storage(format!("Failed to fetch result: {}", e)))?;

        row.map(row_to_result).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<AssistantResult>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, tool_id, requested_tool_id, input_text, options,
                   output, stop_reason, input_tokens, output_tokens, created_at
            FROM assistant_results
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::storage(format!("Failed to list results: {}", e)))?;

        rows.into_iter().map(row_to_result).collect()
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::storage(format!("Failed to get {}: {}", name, e)))
}

fn token_count(row: &PgRow, name: &str) -> Result<u32, StoreError> {
    let value: i64 = column(row, name)?;
    u32::try_from(value)
        .map_err(|_| StoreError::serialization(format!("{} out of range: {}", name, value)))
}

fn row_to_result(row: PgRow) -> Result<AssistantResult, StoreError> {
    let id: uuid::Uuid = column(&row, "id")?;
    let user_id: String = column(&row, "user_id")?;
    let tool_id: String = column(&row, "tool_id")?;
    let requested_tool_id: String = column(&row, "requested_tool_id")?;
    let input_text: String = column(&row, "input_text")?;
    let options: String = column(&row, "options")?;
    let output: String = column(&row, "output")?;
    let stop_reason: String = column(&row, "stop_reason")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;

    let user_id = UserId::new(user_id).map_err(|e| StoreError::serialization(e.to_string()))?;
    let options: BTreeMap<String, String> =
        serde_json::from_str(&options).map_err(|e| StoreError::serialization(e.to_string()))?;

    let mut request = WritingRequest::new(user_id, requested_tool_id, input_text);
    request.options = options;

    Ok(AssistantResult::reconstitute(
        ResultId::from_uuid(id),
        request,
        tool_id,
        output,
        str_to_stop_reason(&stop_reason)?,
        TokenUsage::new(
            token_count(&row, "input_tokens")?,
            token_count(&row, "output_tokens")?,
        ),
        Timestamp::from_datetime(created_at),
    ))
}

fn stop_reason_to_str(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Complete => "complete",
        StopReason::Truncated => "truncated",
        StopReason::Error => "error",
    }
}

fn str_to_stop_reason(s: &str) -> Result<StopReason, StoreError> {
    match s {
        "complete" => Ok(StopReason::Complete),
        "truncated" => Ok(StopReason::Truncated),
        "error" => Ok(StopReason::Error),
        _ => Err(StoreError::serialization(format!(
            "Invalid stop reason: {}",
            s
        ))),
    }
}
