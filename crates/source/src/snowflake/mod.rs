//! Snowflake source adapter.
//!
//! Three retrieval paths:
//! - `INFORMATION_SCHEMA_UPDATE`: `information_schema.tables.last_altered`
//! - `AUDIT_LOG_OPERATION`: account-usage access history joined with
//!   query history (may lag up to three hours)
//! - `FIELD_UPDATE`: high watermark of a timestamp-typed column

pub mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vigil_connection::{Connection, SnowflakeConnection};
use vigil_core::model::{EntityEvent, EntityEventType, SourceParams, ValidationWindow};
use vigil_core::retry::{retry_with_backoff, RetryPolicy};
use vigil_core::urn;

use crate::error::SourceError;
use crate::source::Source;
use crate::time::{parse_millis_value, parse_timestamp_value};

/// A source for extracting freshness evidence from Snowflake.
pub struct SnowflakeSource {
    connection: Arc<Connection>,
}

impl SnowflakeSource {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    fn connection(&self) -> Result<&SnowflakeConnection, SourceError> {
        match self.connection.as_ref() {
            Connection::Snowflake(c) => Ok(c),
            other => Err(SourceError::Config(format!(
                "snowflake source bound to {} connection",
                other.platform_urn()
            ))),
        }
    }

    async fn fetch_rows(&self, query: &str) -> Result<Vec<Vec<Option<String>>>, SourceError> {
        debug!(query, "snowflake source query");
        let client = self.connection()?.client().await?;
        Ok(client.fetch_rows(query).await?)
    }

    async fn information_schema_events(
        &self,
        entity_urn: &str,
        window: &ValidationWindow,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        let name = urn::dataset_name(entity_urn)
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let rows = self
            .fetch_rows(&sql::information_schema_query(&name, window))
            .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let value = cell(&row, 2, "last_altered")?;
            events.push(EntityEvent::new(
                EntityEventType::InformationSchemaUpdate,
                parse_millis_value(&value)?,
            ));
        }
        Ok(events)
    }

    async fn audit_log_events(
        &self,
        entity_urn: &str,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        let spec = params.as_audit_log();
        let operation_types = sql::operation_types_filter(spec);
        let user_name = sql::user_name_filter(spec);

        let name = urn::dataset_name(entity_urn)
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let query = sql::audit_log_query(&name, window, &operation_types, user_name.as_deref());
        let rows = self.fetch_rows(&query).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let value = cell(&row, 6, "query_start_ms")?;
            events.push(EntityEvent::new(
                EntityEventType::AuditLogOperation,
                parse_millis_value(&value)?,
            ));
        }
        Ok(events)
    }

    async fn field_events(
        &self,
        entity_urn: &str,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        let field = params.as_field().ok_or_else(|| {
            SourceError::MissingParameters("column path and column type".to_string())
        })?;
        let column_type = field.native_type.as_deref().ok_or_else(|| {
            SourceError::MissingParameters("column path and column type".to_string())
        })?;

        if !sql::SUPPORTED_COLUMN_TYPES.contains(&column_type.to_uppercase().as_str()) {
            return Err(SourceError::UnsupportedColumnType(column_type.to_string()));
        }

        let start_expr = sql::millis_to_timestamp_expr(window.start_ms, column_type)?;
        let end_expr = sql::millis_to_timestamp_expr(window.end_ms, column_type)?;

        let name = urn::dataset_name(entity_urn)
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let query = sql::field_query(&name, &field.path, &start_expr, &end_expr);
        let rows = self.fetch_rows(&query).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let value = cell(&row, 0, "last_altered_date")?;
            events.push(EntityEvent::new(
                EntityEventType::FieldUpdate,
                parse_timestamp_value(&value)?,
            ));
        }
        Ok(events)
    }

    async fn try_get_entity_events(
        &self,
        entity_urn: &str,
        event_type: EntityEventType,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        match event_type {
            EntityEventType::AuditLogOperation => {
                self.audit_log_events(entity_urn, window, params).await
            }
            EntityEventType::InformationSchemaUpdate => {
                self.information_schema_events(entity_urn, window).await
            }
            EntityEventType::FieldUpdate => self.field_events(entity_urn, window, params).await,
            other => Err(SourceError::UnsupportedEventType(other.to_string())),
        }
    }
}

#[async_trait]
impl Source for SnowflakeSource {
    async fn get_entity_events(
        &self,
        entity_urn: &str,
        event_type: EntityEventType,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        retry_with_backoff(
            RetryPolicy::default(),
            "snowflake.get_entity_events",
            SourceError::is_transient,
            || self.try_get_entity_events(entity_urn, event_type, window, params),
        )
        .await
    }
}

/// Read one cell from a row, treating absent or NULL cells as errors.
fn cell(row: &[Option<String>], index: usize, what: &str) -> Result<String, SourceError> {
    row.get(index)
        .and_then(|v| v.clone())
        .ok_or_else(|| SourceError::Parse(format!("row missing {what} at index {index}")))
}
