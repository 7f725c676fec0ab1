//! Materials-database collaborator
//!
//! Screening only needs one question answered: which known materials exist
//! in a given element system, and how far above the convex hull they sit.
//! `MaterialsSource` is that seam; `MaterialsProject` answers it over HTTP
//! and `Offline` stands in when no API key is configured.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::MaterialsProjectConfig;
use crate::models::MaterialSummary;

#[derive(Debug, Error)]
pub enum MaterialsError {
    #[error("Materials database is not configured (set MP_API_KEY)")]
    NotConfigured,
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Status(StatusCode),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for MaterialsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MaterialsError::Timeout
        } else if err.is_decode() {
            MaterialsError::Decode(err.to_string())
        } else {
            MaterialsError::Network(err.to_string())
        }
    }
}

#[async_trait]
pub trait MaterialsSource: Send + Sync + fmt::Debug {
    /// Materials whose element set is exactly `elements`, at most `limit`
    async fn search_by_elements(
        &self,
        elements: &[String],
        limit: usize,
    ) -> Result<Vec<MaterialSummary>, MaterialsError>;
}

/// Chemical system key, e.g. ["O", "Fe"] -> "Fe-O"
pub fn chemsys(elements: &[String]) -> String {
    let mut sorted: Vec<&str> = elements.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join("-")
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    data: Vec<SummaryDoc>,
}

#[derive(Debug, Deserialize)]
struct SummaryDoc {
    material_id: Option<String>,
    formula_pretty: Option<String>,
    energy_above_hull: Option<f64>,
}

impl From<SummaryDoc> for MaterialSummary {
    fn from(doc: SummaryDoc) -> Self {
        MaterialSummary {
            material_id: doc.material_id,
            formula: doc.formula_pretty.unwrap_or_default(),
            energy_above_hull: doc.energy_above_hull,
        }
    }
}

/// Materials Project summary endpoint client
pub struct MaterialsProject {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for MaterialsProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialsProject")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MaterialsProject {
    pub fn new(config: &MaterialsProjectConfig, api_key: String) -> Result<Self, MaterialsError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl MaterialsSource for MaterialsProject {
    async fn search_by_elements(
        &self,
        elements: &[String],
        limit: usize,
    ) -> Result<Vec<MaterialSummary>, MaterialsError> {
        let system = chemsys(elements);
        let limit_param = limit.to_string();
        debug!(chemsys = %system, limit, "querying Materials Project");

        let response = self
            .client
            .get(format!("{}/materials/summary/", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("chemsys", system.as_str()),
                ("_limit", limit_param.as_str()),
                ("_fields", "material_id,formula_pretty,energy_above_hull"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MaterialsError::Status(status));
        }

        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| MaterialsError::Decode(e.to_string()))?;
        Ok(body.data.into_iter().take(limit).map(MaterialSummary::from).collect())
    }
}

/// Source used when no API key is available; every call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct Offline;

#[async_trait]
impl MaterialsSource for Offline {
    async fn search_by_elements(
        &self,
        _elements: &[String],
        _limit: usize,
    ) -> Result<Vec<MaterialSummary>, MaterialsError> {
        Err(MaterialsError::NotConfigured)
    }
}

/// Pick the HTTP client when a key is present, else the offline stub
pub fn from_config(
    config: &MaterialsProjectConfig,
    api_key: Option<String>,
) -> Result<Box<dyn MaterialsSource>, MaterialsError> {
    match api_key.or_else(|| config.api_key.clone()).filter(|k| !k.trim().is_empty()) {
        Some(key) => Ok(Box::new(MaterialsProject::new(config, key)?)),
        None => Ok(Box::new(Offline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chemsys_is_sorted() {
        let elements = vec!["O".to_string(), "Fe".to_string(), "Li".to_string()];
        assert_eq!(chemsys(&elements), "Fe-Li-O");
    }

    #[test]
    fn test_summary_decoding() {
        let body: SummaryResponse = serde_json::from_str(
            r#"{"data": [
                {"material_id": "mp-19770", "formula_pretty": "Fe2O3", "energy_above_hull": 0.0},
                {"material_id": "mp-1", "formula_pretty": "FeO", "energy_above_hull": null},
                {"formula_pretty": "Fe3O4"}
            ], "meta": {"total_doc": 3}}"#,
        )
        .unwrap();
        let summaries: Vec<MaterialSummary> = body.data.into_iter().map(Into::into).collect();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].formula, "Fe2O3");
        assert_eq!(summaries[0].energy_above_hull, Some(0.0));
        assert_eq!(summaries[1].energy_above_hull, None);
        assert_eq!(summaries[2].material_id, None);
    }

    #[tokio::test]
    async fn test_offline_source_fails() {
        let err = Offline
            .search_by_elements(&["Fe".to_string()], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, MaterialsError::NotConfigured));
    }

    #[test]
    fn test_from_config_without_key_is_offline() {
        let config = MaterialsProjectConfig::default();
        let source = from_config(&config, None).unwrap();
        assert_eq!(format!("{:?}", source), "Offline");

        let source = from_config(&config, Some("key".to_string())).unwrap();
        assert!(format!("{:?}", source).starts_with("MaterialsProject"));
    }
}
