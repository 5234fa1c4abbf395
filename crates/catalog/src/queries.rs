//! GraphQL documents issued against the catalog.

/// Lists monitors via the entity search surface. The cache is skipped so
/// a freshly-created monitor is picked up on the next refresh tick.
pub const LIST_MONITORS_QUERY: &str = r#"
query listMonitors($input: SearchAcrossEntitiesInput!) {
  searchAcrossEntities(input: $input) {
    start
    count
    total
    searchResults {
      entity {
        urn
        type
        ... on Monitor {
          info {
            type
            assertionMonitor {
              assertions {
                assertion {
                  urn
                  info {
                    type
                    freshnessAssertion {
                      type
                      schedule {
                        type
                        cron {
                          cron
                          timezone
                          windowStartOffsetMs
                        }
                        fixedInterval {
                          unit
                          multiple
                        }
                      }
                    }
                  }
                  relationships(input: { types: ["Asserts"], direction: OUTGOING, start: 0, count: 1 }) {
                    relationships {
                      entity {
                        urn
                        type
                        ... on Dataset {
                          platform {
                            urn
                          }
                          subTypes {
                            typeNames
                          }
                        }
                      }
                    }
                  }
                }
                schedule {
                  cron
                  timezone
                }
                parameters {
                  type
                  datasetFreshnessParameters {
                    sourceType
                    field {
                      path
                      type
                      nativeType
                    }
                    auditLog {
                      operationTypes
                      userName
                    }
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// Lists configured ingestion sources; their recipes carry the warehouse
/// connection coordinates the connection provider extracts.
pub const LIST_INGESTION_SOURCES_QUERY: &str = r#"
query listIngestionSources($input: ListIngestionSourcesInput!) {
  listIngestionSources(input: $input) {
    start
    count
    total
    ingestionSources {
      urn
      type
      name
      config {
        recipe
        executorId
        version
      }
    }
  }
}
"#;

/// Resolves secret references found in ingestion recipes.
pub const GET_SECRET_VALUES_QUERY: &str = r#"
query getSecretValues($input: GetSecretValuesInput!) {
  getSecretValues(input: $input) {
    name
    value
  }
}
"#;
