//! Deriving the adapter request from evaluation parameters.

use vigil_core::model::{
    AssertionEvaluationParameters, DatasetFreshnessSourceType, EntityEventType, SourceParams,
};
use vigil_core::MonitorError;

/// Extract the entity event type and per-variant source parameters from
/// the evaluation parameters.
///
/// The source-type → event-type mapping is total and fixed:
/// FIELD_VALUE → FIELD_UPDATE, INFORMATION_SCHEMA →
/// INFORMATION_SCHEMA_UPDATE, AUDIT_LOG → AUDIT_LOG_OPERATION.
pub fn derive_event_request(
    parameters: &AssertionEvaluationParameters,
) -> Result<(EntityEventType, SourceParams), MonitorError> {
    let freshness = parameters
        .dataset_freshness_parameters
        .as_ref()
        .ok_or_else(|| {
            MonitorError::MalformedAssertion(
                "missing dataset freshness parameters".to_string(),
            )
        })?;

    match freshness.source_type {
        DatasetFreshnessSourceType::FieldValue => {
            let field = freshness.field.clone().ok_or_else(|| {
                MonitorError::MalformedAssertion("missing schema field spec".to_string())
            })?;
            Ok((EntityEventType::FieldUpdate, SourceParams::Field(field)))
        }
        DatasetFreshnessSourceType::InformationSchema => {
            Ok((EntityEventType::InformationSchemaUpdate, SourceParams::None))
        }
        DatasetFreshnessSourceType::AuditLog => {
            let audit_log = freshness.audit_log.clone().ok_or_else(|| {
                MonitorError::MalformedAssertion("missing audit log spec".to_string())
            })?;
            Ok((
                EntityEventType::AuditLogOperation,
                SourceParams::AuditLog(audit_log),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::model::{
        AssertionEvaluationParametersType, AuditLogSpec, DatasetFreshnessParameters,
        SchemaFieldSpec,
    };

    fn params(freshness: DatasetFreshnessParameters) -> AssertionEvaluationParameters {
        AssertionEvaluationParameters {
            kind: AssertionEvaluationParametersType::DatasetFreshness,
            dataset_freshness_parameters: Some(freshness),
        }
    }

    #[test]
    fn information_schema_routes_with_empty_params() {
        let (event_type, source_params) = derive_event_request(&params(
            DatasetFreshnessParameters {
                source_type: DatasetFreshnessSourceType::InformationSchema,
                field: None,
                audit_log: None,
            },
        ))
        .unwrap();
        assert_eq!(event_type, EntityEventType::InformationSchemaUpdate);
        assert_eq!(source_params, SourceParams::None);
    }

    #[test]
    fn field_value_routes_with_field_spec() {
        let spec = SchemaFieldSpec {
            path: "updated_at".to_string(),
            field_type: "TIME".to_string(),
            native_type: Some("TIMESTAMP".to_string()),
        };
        let (event_type, source_params) = derive_event_request(&params(
            DatasetFreshnessParameters {
                source_type: DatasetFreshnessSourceType::FieldValue,
                field: Some(spec.clone()),
                audit_log: None,
            },
        ))
        .unwrap();
        assert_eq!(event_type, EntityEventType::FieldUpdate);
        assert_eq!(source_params, SourceParams::Field(spec));
    }

    #[test]
    fn audit_log_routes_with_audit_spec() {
        let spec = AuditLogSpec {
            operation_types: Some(vec!["INSERT".to_string()]),
            user_name: None,
        };
        let (event_type, source_params) = derive_event_request(&params(
            DatasetFreshnessParameters {
                source_type: DatasetFreshnessSourceType::AuditLog,
                field: None,
                audit_log: Some(spec.clone()),
            },
        ))
        .unwrap();
        assert_eq!(event_type, EntityEventType::AuditLogOperation);
        assert_eq!(source_params, SourceParams::AuditLog(spec));
    }

    #[test]
    fn missing_nested_specs_are_malformed() {
        let missing_field = derive_event_request(&params(DatasetFreshnessParameters {
            source_type: DatasetFreshnessSourceType::FieldValue,
            field: None,
            audit_log: None,
        }));
        assert!(matches!(
            missing_field,
            Err(MonitorError::MalformedAssertion(_))
        ));

        let no_freshness = derive_event_request(&AssertionEvaluationParameters {
            kind: AssertionEvaluationParametersType::DatasetFreshness,
            dataset_freshness_parameters: None,
        });
        assert!(matches!(
            no_freshness,
            Err(MonitorError::MalformedAssertion(_))
        ));
    }
}
