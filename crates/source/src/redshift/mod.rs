//! Redshift source adapter.
//!
//! Redshift offers no native table last-updated statistic, so the
//! INFORMATION_SCHEMA path is unsupported and returns no events. The
//! audit-log path supports INSERT operations only, via the STL insert
//! log; requests for other operation types are downgraded to INSERT
//! with a warning.

pub mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::{debug, warn};

use vigil_connection::{Connection, RedshiftConnection};
use vigil_core::model::{EntityEvent, EntityEventType, SourceParams, ValidationWindow};
use vigil_core::retry::{retry_with_backoff, RetryPolicy};
use vigil_core::urn;

use crate::error::SourceError;
use crate::source::Source;
use crate::time::midnight_utc_millis;

/// A source for extracting freshness evidence from Redshift.
pub struct RedshiftSource {
    connection: Arc<Connection>,
}

impl RedshiftSource {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    fn connection(&self) -> Result<&RedshiftConnection, SourceError> {
        match self.connection.as_ref() {
            Connection::Redshift(c) => Ok(c),
            other => Err(SourceError::Config(format!(
                "redshift source bound to {} connection",
                other.platform_urn()
            ))),
        }
    }

    async fn fetch_rows(&self, query: &str) -> Result<Vec<PgRow>, SourceError> {
        debug!(query, "redshift source query");
        let pool = self.connection()?.pool().await?;
        sqlx::query(query)
            .fetch_all(pool)
            .await
            .map_err(|e| SourceError::Connection(e.into()))
    }

    async fn audit_log_events(
        &self,
        entity_urn: &str,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        let spec = params.as_audit_log();

        // INSERT is the only supported operation type; anything else is
        // downgraded rather than failed, for compatibility.
        if let Some(requested) = spec.and_then(|s| s.operation_types.as_ref()) {
            if !requested.iter().any(|t| t.eq_ignore_ascii_case("INSERT")) {
                warn!(
                    entity_urn,
                    requested = ?requested,
                    "redshift audit log supports only INSERT operations; adjusting"
                );
            }
        }

        let user_name = sql::user_name_filter(spec);
        let name = urn::dataset_name(entity_urn)
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        let query = sql::insert_audit_query(&name, window, user_name.as_deref());
        let rows = self.fetch_rows(&query).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let endtime: NaiveDateTime = row
                .try_get("endtime")
                .map_err(|e| SourceError::Parse(format!("endtime column: {e}")))?;
            events.push(EntityEvent::new(
                EntityEventType::AuditLogOperation,
                endtime.and_utc().timestamp_millis(),
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
            let millis = decode_watermark(&row, column_type)?;
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
                warn!(
                    entity_urn,
                    "redshift does not expose a table last-updated statistic; returning no events"
                );
                Ok(Vec::new())
            }
            EntityEventType::FieldUpdate => self.field_events(entity_urn, window, params).await,
            other => Err(SourceError::UnsupportedEventType(other.to_string())),
        }
    }
}

#[async_trait]
impl Source for RedshiftSource {
    async fn get_entity_events(
        &self,
        entity_urn: &str,
        event_type: EntityEventType,
        window: &ValidationWindow,
        params: &SourceParams,
    ) -> Result<Vec<EntityEvent>, SourceError> {
        retry_with_backoff(
            RetryPolicy::default(),
            "redshift.get_entity_events",
            SourceError::is_transient,
            || self.try_get_entity_events(entity_urn, event_type, window, params),
        )
        .await
    }
}

/// Decode the watermark column by its declared native type, attaching
/// UTC to naive values and midnight UTC to bare dates.
fn decode_watermark(row: &PgRow, column_type: &str) -> Result<i64, SourceError> {
    let upper = column_type.to_uppercase();
    let millis = if upper == "DATE" {
        let date: NaiveDate = row
            .try_get(0)
            .map_err(|e| SourceError::Parse(format!("watermark column: {e}")))?;
        midnight_utc_millis(date)
    } else if upper.contains("TZ") || upper.contains("WITH TIME ZONE") {
        let ts: DateTime<Utc> = row
            .try_get(0)
            .map_err(|e| SourceError::Parse(format!("watermark column: {e}")))?;
        ts.timestamp_millis()
    } else {
        let ts: NaiveDateTime = row
            .try_get(0)
            .map_err(|e| SourceError::Parse(format!("watermark column: {e}")))?;
        ts.and_utc().timestamp_millis()
    };
    Ok(millis)
}
