//! HTTP client for the hosted record store.
//!
//! Requests go to `{base_url}/projects/{project_id}/tables/{table}/{op}`
//! with the public key as bearer token. Every response is an envelope of
//! `{success, message, data, results}`; batch writes report one result per
//! record.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::RecordId;
use crate::store::{FieldSelection, WhereCondition};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

/// Parameters of a fetch request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchParams {
    pub fields: Vec<FieldSelection>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<WhereCondition>,
}

/// Outcome of one record in a batch write.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Response envelope returned by every store call.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
}

impl StoreResponse {
    /// Fail if the store reported `success = false`.
    pub fn ensure_success(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(StoreError::Upstream(
                self.message
                    .unwrap_or_else(|| "record store reported a failure".to_string()),
            ))
        }
    }

    /// Per-record data of a batch write, failing if any record failed.
    pub fn into_batch_data(self, action: &str, table: &str) -> Result<Vec<Value>> {
        let results = self.results.ok_or_else(|| {
            StoreError::Upstream(format!("no per-record results for {} {}", action, table))
        })?;

        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            let reasons: Vec<&str> = failed
                .iter()
                .filter_map(|r| r.message.as_deref())
                .collect();
            return Err(StoreError::Upstream(format!(
                "failed to {} {} {} record(s): {}",
                action,
                failed.len(),
                table,
                if reasons.is_empty() {
                    "no reason given".to_string()
                } else {
                    reasons.join("; ")
                }
            )));
        }

        Ok(results.into_iter().filter_map(|r| r.data).collect())
    }
}

/// Client for the hosted record store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    public_key: String,
}

impl StoreClient {
    /// Create a client. The project id and public key must be set.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if config.project_id.trim().is_empty() || config.public_key.trim().is_empty() {
            return Err(StoreError::Validation(
                "record store project id and public key are required in live mode".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            public_key: config.public_key.clone(),
        })
    }

    fn endpoint(&self, table: &str, operation: &str) -> String {
        format!(
            "{}/projects/{}/tables/{}/{}",
            self.base_url, self.project_id, table, operation
        )
    }

    async fn call(&self, table: &str, operation: &str, body: Value) -> Result<StoreResponse> {
        let url = self.endpoint(table, operation);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.public_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", url, e);
                StoreError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Record store returned {} for {}", status, url);
            return Err(StoreError::Upstream(format!(
                "record store returned {}: {}",
                status, body
            )));
        }

        let envelope: StoreResponse = response.json().await?;
        envelope.ensure_success()
    }

    pub async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<Vec<Value>> {
        let response = self
            .call(table, "fetch", serde_json::to_value(params)?)
            .await?;
        match response.data {
            Some(Value::Array(rows)) => Ok(rows),
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(StoreError::Upstream(format!(
                "expected a list of {} records, got {}",
                table, other
            ))),
        }
    }

    /// Fetch one record; `None` when the store has no such id.
    pub async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[FieldSelection],
    ) -> Result<Option<Value>> {
        let body = json!({ "id": id, "fields": fields });
        let response = self.call(table, "get", body).await?;
        Ok(response.data.filter(|d| !d.is_null()))
    }

    pub async fn create_records(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        let response = self
            .call(table, "create", json!({ "records": records }))
            .await?;
        response.into_batch_data("create", table)
    }

    pub async fn update_records(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        let response = self
            .call(table, "update", json!({ "records": records }))
            .await?;
        response.into_batch_data("update", table)
    }

    pub async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<()> {
        let response = self
            .call(table, "delete", json!({ "RecordIds": ids }))
            .await?;
        response.into_batch_data("delete", table).map(|_| ())
    }
}
