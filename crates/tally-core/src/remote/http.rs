//! HTTP client for the managed record service.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{RecordService, RemoteError, RemoteResult};
use crate::config::SyncSettings;
use crate::error::{Error, Result};
use crate::models::{Category, EntityId, Record};
use crate::util::{compact_text, is_http_url};

/// REST implementation of [`RecordService`]
#[derive(Debug, Clone)]
pub struct HttpRecordService {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpRecordService {
    /// Builds a client for an explicit API base URL.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::InvalidInput(format!("Failed to construct HTTP client: {error}")))?;
        Ok(Self {
            base_url,
            auth_token,
            client,
        })
    }

    /// Builds a client from sync settings.
    ///
    /// Returns `Ok(None)` when no API URL is configured.
    pub fn from_settings(settings: &SyncSettings) -> Result<Option<Self>> {
        let Some(base_url) = settings.api_base_url.as_deref() else {
            return Ok(None);
        };
        Self::new(
            base_url,
            settings.auth_token.clone(),
            settings.request_timeout,
        )
        .map(Some)
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cheap reachability check used to drive connectivity state
    pub async fn health(&self) -> bool {
        match self.request(Method::GET, "/health").send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!("Health probe failed: {error}");
                false
            }
        }
    }

    fn request(&self, method: Method, route: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{route}", self.base_url))
            .header("Accept", "application/json");
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> RemoteResult<T> {
        let response = request.send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))
    }

    async fn send_empty(request: RequestBuilder) -> RemoteResult<()> {
        let response = request.send().await.map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

impl RecordService for HttpRecordService {
    async fn list(&self) -> RemoteResult<Vec<Record>> {
        Self::send_json(self.request(Method::GET, "/records")).await
    }

    async fn list_categories(&self) -> RemoteResult<Vec<Category>> {
        Self::send_json(self.request(Method::GET, "/categories")).await
    }

    async fn get(&self, id: &EntityId) -> RemoteResult<Record> {
        Self::send_json(self.request(Method::GET, &entity_route("records", id))).await
    }

    async fn create(&self, payload: &Record) -> RemoteResult<Record> {
        Self::send_json(self.request(Method::POST, "/records").json(payload)).await
    }

    async fn update(&self, id: &EntityId, payload: &Record) -> RemoteResult<Record> {
        let response = self
            .request(Method::PUT, &entity_route("records", id))
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::CONFLICT {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_conflict(id, &body));
        }

        check_status(response)
            .await?
            .json::<Record>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))
    }

    async fn delete(&self, id: &EntityId) -> RemoteResult<()> {
        Self::send_empty(self.request(Method::DELETE, &entity_route("records", id))).await
    }

    async fn create_category(&self, payload: &Category) -> RemoteResult<Category> {
        Self::send_json(self.request(Method::POST, "/categories").json(payload)).await
    }

    async fn update_category(&self, id: &EntityId, payload: &Category) -> RemoteResult<Category> {
        Self::send_json(
            self.request(Method::PUT, &entity_route("categories", id))
                .json(payload),
        )
        .await
    }

    async fn delete_category(&self, id: &EntityId) -> RemoteResult<()> {
        Self::send_empty(self.request(Method::DELETE, &entity_route("categories", id))).await
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConflictBody {
    #[serde(alias = "current", alias = "serverVersion")]
    server_version: Option<Record>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn entity_route(collection: &str, id: &EntityId) -> String {
    format!("/{collection}/{}", urlencoding::encode(&id.to_string()))
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_decode() {
        RemoteError::InvalidPayload(error.to_string())
    } else {
        RemoteError::Unreachable(error.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    })
}

fn parse_conflict(id: &EntityId, body: &str) -> RemoteError {
    let server_version = serde_json::from_str::<ConflictBody>(body)
        .ok()
        .and_then(|payload| payload.server_version)
        .map(Box::new);
    RemoteError::VersionConflict {
        entity_id: id.clone(),
        server_version,
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{trimmed} ({})", status.as_u16())
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::InvalidInput(
            "API base URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(&base) {
        return Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("example.com").is_err());
    }

    #[test]
    fn normalize_base_url_trims_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://api.example.com/").unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn entity_route_encodes_temporary_ids() {
        assert_eq!(entity_route("records", &EntityId::Number(4)), "/records/4");
        assert_eq!(
            entity_route("records", &EntityId::from("a b")),
            "/records/a%20b"
        );
    }

    #[test]
    fn parse_conflict_extracts_server_version() {
        let body = r#"{"server_version": {"id": 4, "user_id": 1, "amount": 20, "kind": "expense", "date": "2026-01-01"}}"#;
        let RemoteError::VersionConflict {
            entity_id,
            server_version,
        } = parse_conflict(&EntityId::Number(4), body)
        else {
            panic!("expected a version conflict");
        };
        assert_eq!(entity_id, EntityId::Number(4));
        assert_eq!(server_version.unwrap().amount, rust_decimal::Decimal::from(20));
    }

    #[test]
    fn parse_conflict_tolerates_missing_body() {
        let RemoteError::VersionConflict { server_version, .. } =
            parse_conflict(&EntityId::Number(4), "")
        else {
            panic!("expected a version conflict");
        };
        assert!(server_version.is_none());
    }

    #[test]
    fn parse_api_error_prefers_message_field() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, r#"{"message": " bad amount "}"#),
            "bad amount (400)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[test]
    fn from_settings_without_url_is_none() {
        let settings = SyncSettings::default();
        assert!(HttpRecordService::from_settings(&settings).unwrap().is_none());
    }
}
