// src/services/catalog.rs

//! Catalog API client.
//!
//! The engine only talks to the catalog through [`CatalogSource`], so tests
//! and alternative mirrors can stand in for the real openBD endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{CatalogConfig, Identifier};
use crate::utils::http;

/// Source of catalog identifiers and raw records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List every identifier the catalog currently knows. Failure is fatal.
    async fn list_identifiers(&self) -> Result<Vec<Identifier>>;

    /// Fetch raw records for `ids`, one slot per requested identifier.
    ///
    /// A `None` slot means the identifier vanished between listing and fetch.
    async fn fetch_records(&self, ids: &[Identifier]) -> Result<Vec<Option<Value>>>;
}

/// openBD API client.
pub struct OpenBdClient {
    config: CatalogConfig,
    client: Client,
}

impl OpenBdClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    fn parse_identifiers(body: &str) -> Result<Vec<Identifier>> {
        let payload: Value = serde_json::from_str(body)?;
        let items = match payload {
            Value::Array(items) => items,
            other => {
                return Err(AppError::catalog(
                    "coverage",
                    format!("expected a JSON array, got {}", type_name(&other)),
                ));
            }
        };

        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(AppError::catalog(
                    "coverage",
                    format!("unexpected identifier {}", type_name(&other)),
                )),
            })
            .collect()
    }

    fn parse_records(body: &str, requested: usize) -> Result<Vec<Option<Value>>> {
        let payload: Value = serde_json::from_str(body)?;
        let items = match payload {
            Value::Array(items) => items,
            other => {
                return Err(AppError::catalog(
                    "get",
                    format!("expected a JSON array, got {}", type_name(&other)),
                ));
            }
        };

        if items.len() != requested {
            log::warn!(
                "Detail response has {} slots for {} requested identifiers",
                items.len(),
                requested
            );
        }

        Ok(items
            .into_iter()
            .map(|item| match item {
                Value::Object(_) => Some(item),
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl CatalogSource for OpenBdClient {
    async fn list_identifiers(&self) -> Result<Vec<Identifier>> {
        log::info!("Fetching all identifiers from {}", self.config.coverage_url);
        let body = self
            .client
            .get(&self.config.coverage_url)
            .timeout(Duration::from_secs(self.config.list_timeout_secs))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let ids = Self::parse_identifiers(&body)?;
        log::info!("Catalog lists {} identifiers", ids.len());
        Ok(ids)
    }

    async fn fetch_records(&self, ids: &[Identifier]) -> Result<Vec<Option<Value>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let body = self
            .client
            .post(&self.config.get_url)
            .timeout(Duration::from_secs(self.config.detail_timeout_secs))
            .form(&[("isbn", ids.join(","))])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Self::parse_records(&body, ids.len())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifiers() {
        let ids = OpenBdClient::parse_identifiers(r#"["9784000000001", 9784000000002]"#).unwrap();
        assert_eq!(ids, vec!["9784000000001", "9784000000002"]);
    }

    #[test]
    fn test_parse_identifiers_rejects_non_list() {
        let err = OpenBdClient::parse_identifiers(r#"{"isbn": []}"#).unwrap_err();
        assert!(matches!(err, AppError::Catalog { .. }));
        assert!(OpenBdClient::parse_identifiers("not json").is_err());
    }

    #[test]
    fn test_parse_records_keeps_null_slots() {
        let records =
            OpenBdClient::parse_records(r#"[{"summary": {"isbn": "1"}}, null]"#, 2).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_some());
        assert!(records[1].is_none());
    }
}
