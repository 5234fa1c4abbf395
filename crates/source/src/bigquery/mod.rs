//! BigQuery source adapter.
//!
//! Three retrieval paths:
//! - `INFORMATION_SCHEMA_UPDATE`: dataset `__TABLES__` metadata scan
//! - `AUDIT_LOG_OPERATION`: Cloud Logging insert-job entries
//! - `FIELD_UPDATE`: high watermark of a timestamp-typed column

pub mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use vigil_connection::{BigQueryConnection, Connection};
use vigil_core::model::{EntityEvent, EntityEventType, SourceParams, ValidationWindow};
use vigil_core::retry::{retry_with_backoff, RetryPolicy};
use vigil_core::urn;

use crate::error::SourceError;
use crate::source::Source;
use crate::time::{midnight_utc_millis, parse_millis_value, parse_timestamp_value};

/// A source for extracting freshness evidence from BigQuery.
pub struct BigQuerySource {
    connection: Arc<Connection>,
}

impl BigQuerySource {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    fn connection(&self) -> Result<&BigQueryConnection, SourceError> {
        match self.connection.as_ref() {
            Connection::BigQuery(c) => Ok(c),
            other => Err(SourceError::Config(format!(
                "bigquery source bound to {} connection",
                other.platform_urn()
            ))),
        }
    }

    async fn query(&self, sql: &str) -> Result<Vec<Vec<Option<String>>>, SourceError> {
        debug!(sql, "bigquery source query");
        let client = self.connection()?.client().await?;
        Ok(client.query(sql).await?)
    }

    async fn information_schema_events(
        &self,
        entity_urn: &str,
        window: &ValidationWindow,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        let name = urn::dataset_name(entity_urn)
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let rows = self
            .query(&sql::information_schema_query(&name, window))
            .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let value = cell(&row, 0, "last_modified_time")?;
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
        let statement_types = sql::statement_types_filter(spec);
        let principal_email = sql::user_name_filter(spec);

        let name = urn::dataset_name(entity_urn)
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let filter =
            sql::audit_log_filter(&name, window, &statement_types, principal_email.as_deref());

        debug!(filter, "bigquery audit log filter");
        let client = self.connection()?.client().await?;
        let entries = client.list_log_entries(&filter).await?;

        let mut events = Vec::with_capacity(entries.len());
        for entry in entries {
            events.push(EntityEvent::new(
                EntityEventType::AuditLogOperation,
                parse_timestamp_value(&entry.timestamp)?,
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
        let rows = self
            .query(&sql::field_query(&name, &field.path, &start_expr, &end_expr))
            .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let value = cell(&row, 0, &field.path)?;
            let millis = match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
                Ok(date) => midnight_utc_millis(date),
                Err(_) => parse_timestamp_value(&value)?,
            };
            events.push(EntityEvent::new(EntityEventType::FieldUpdate, millis));
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
impl Source for BigQuerySource {
    async fn get_entity_events(
        &self,
        entity_urn: &str,
        event_type: EntityEventType,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        retry_with_backoff(
            RetryPolicy::default(),
            "bigquery.get_entity_events",
            SourceError::is_transient,
            || self.try_get_entity_events(entity_urn, event_type, window, params),
        )
        .await
    }
}

fn cell(row: &[Option<String>], index: usize, what: &str) -> Result<String, SourceError> {
    row.get(index)
        .and_then(|v| v.clone())
        .ok_or_else(|| SourceError::Parse(format!("row missing {what} at index {index}")))
}
