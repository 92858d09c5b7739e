use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    params::form::{ParamEnvelope, ParamPatch},
    topology::{
        snapshot::{BasicAuth, Snapshot},
        source::{SnapshotSource, TopologyError, TopologyResult},
    },
};

/// Component name of the handover manager on the controller.
pub const HANDOVER_COMPONENT: &str = "empower.apps.handovermanager.handovermanager";

/// Reasons a parameter update was not applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    /// 400; carries the controller's explanation.
    #[error("{0}")]
    Rejected(String),
    #[error("Component not found")]
    NotFound,
    #[error("Internal error")]
    Internal,
    #[error("Unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("Request failed: {0}")]
    Transport(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// REST client for the handover manager component of one tenant.
#[derive(Debug, Clone)]
pub struct HandoverApiClient {
    client: Client,
    base_url: String,
    tenant_id: String,
}

impl HandoverApiClient {
    pub fn new(base_url: &str, tenant_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tenant_id: tenant_id.to_string(),
        }
    }

    pub fn component_url(&self) -> String {
        format!(
            "{}/api/v1/tenants/{}/components/{}",
            self.base_url, self.tenant_id, HANDOVER_COMPONENT
        )
    }

    /// One `GET` of the component resource.
    pub async fn get_snapshot(&self) -> TopologyResult<Option<Snapshot>> {
        let url = self.component_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TopologyError::Acquisition(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopologyError::Acquisition(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TopologyError::Acquisition(e.to_string()))?;
        parse_snapshot(&body)
    }

    /// `PUT` a sparse parameter update.
    pub async fn submit_params(
        &self,
        patch: &ParamPatch,
        auth: Option<&BasicAuth>,
    ) -> Result<(), SubmitError> {
        let url = self.component_url();
        let mut request = self.client.put(&url).json(&ParamEnvelope::new(patch));
        match auth {
            Some(auth) => request = request.header(AUTHORIZATION, auth.header_value()),
            None => debug!(target: "submit", "No credentials received yet, sending without Authorization"),
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let result = classify_response(status, &body);
        info!(target: "submit", status = status.as_u16(), ok = result.is_ok(), "Parameter update answered");
        result
    }
}

#[async_trait]
impl SnapshotSource for HandoverApiClient {
    async fn fetch_snapshot(&mut self) -> TopologyResult<Option<Snapshot>> {
        self.get_snapshot().await
    }
}

/// An empty body or a JSON `null` is a valid "nothing yet" answer.
pub fn parse_snapshot(body: &str) -> TopologyResult<Option<Snapshot>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<Snapshot>>(body).map_err(|e| TopologyError::Protocol(e.to_string()))
}

/// Map the controller's answer to a parameter update.
pub fn classify_response(status: StatusCode, body: &str) -> Result<(), SubmitError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::BAD_REQUEST => {
            let message = serde_json::from_str::<ErrorBody>(body)
                .map(|body| body.message)
                .unwrap_or_else(|_| "Bad request".to_string());
            Err(SubmitError::Rejected(message))
        }
        StatusCode::NOT_FOUND => Err(SubmitError::NotFound),
        StatusCode::INTERNAL_SERVER_ERROR => Err(SubmitError::Internal),
        other => Err(SubmitError::UnexpectedStatus(other.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_url() {
        let client = HandoverApiClient::new("http://127.0.0.1:8888/", "8f83e794-1d07-4430-b5bd-db45d670c8f0");
        assert_eq!(
            client.component_url(),
            "http://127.0.0.1:8888/api/v1/tenants/8f83e794-1d07-4430-b5bd-db45d670c8f0/components/empower.apps.handovermanager.handovermanager"
        );
    }

    #[test]
    fn test_null_and_empty_payloads() {
        assert_eq!(parse_snapshot("null"), Ok(None));
        assert_eq!(parse_snapshot("  \n"), Ok(None));
        assert!(matches!(parse_snapshot("{\"graphData\": "), Err(TopologyError::Protocol(_))));
    }

    #[test]
    fn test_snapshot_payload() {
        let snapshot = parse_snapshot(include_str!("../../test_data/snapshot.json"))
            .unwrap()
            .expect("Snapshot should be present");
        assert_eq!(snapshot.graph_data.nodes.len(), 4);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(classify_response(StatusCode::OK, ""), Ok(()));
        assert_eq!(classify_response(StatusCode::NO_CONTENT, ""), Ok(()));
        assert_eq!(
            classify_response(StatusCode::BAD_REQUEST, r#"{"code": 400, "message": "Invalid value for RSRQ threshold"}"#),
            Err(SubmitError::Rejected("Invalid value for RSRQ threshold".into()))
        );
        assert_eq!(
            classify_response(StatusCode::BAD_REQUEST, "<html>"),
            Err(SubmitError::Rejected("Bad request".into()))
        );
        assert_eq!(classify_response(StatusCode::NOT_FOUND, ""), Err(SubmitError::NotFound));
        assert_eq!(
            classify_response(StatusCode::INTERNAL_SERVER_ERROR, ""),
            Err(SubmitError::Internal)
        );
        assert_eq!(
            classify_response(StatusCode::UNAUTHORIZED, ""),
            Err(SubmitError::UnexpectedStatus(401))
        );
    }

    #[test]
    fn test_submit_error_messages() {
        assert_eq!(SubmitError::NotFound.to_string(), "Component not found");
        assert_eq!(SubmitError::Internal.to_string(), "Internal error");
    }
}
