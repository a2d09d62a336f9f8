use futures_util::StreamExt;
use healthboard_core::{
    decode_snapshot, ApiError, FailureKind, GroupId, LogQuery, LogResults, LogTypeInfo, Snapshot,
    TaskReply,
};
use healthboard_logging::{board_debug, board_trace};
use serde_json::Value;
use url::Url;

use crate::{ApiSettings, CacheBuster, EngineError};

/// The backend endpoint, one method per request kind.
#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    /// Health or infrastructure snapshot, depending on the group.
    async fn snapshot(&self, group: &GroupId) -> Result<Snapshot, ApiError>;
    async fn task_status(&self) -> Result<TaskReply, ApiError>;
    async fn start_task(&self) -> Result<TaskReply, ApiError>;
    async fn log_types(&self) -> Result<Vec<LogTypeInfo>, ApiError>;
    async fn logs(&self, query: &LogQuery) -> Result<LogResults, ApiError>;
}

#[derive(Debug)]
struct RawResponse {
    status: u16,
    body: String,
}

impl RawResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug)]
pub struct ReqwestApi {
    endpoint: Url,
    max_bytes: u64,
    client: reqwest::Client,
    buster: CacheBuster,
}

impl ReqwestApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, EngineError> {
        let endpoint =
            Url::parse(&settings.endpoint).map_err(|source| EngineError::InvalidEndpoint {
                url: settings.endpoint.clone(),
                source,
            })?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            endpoint,
            max_bytes: settings.max_bytes,
            client,
            buster: CacheBuster::new(),
        })
    }

    /// Endpoint URL with `params` followed by a fresh `t=` value.
    fn url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("t", &self.buster.next().to_string());
        }
        url
    }

    async fn get(&self, url: Url) -> Result<RawResponse, ApiError> {
        board_debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(too_large(self.max_bytes));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > self.max_bytes {
                return Err(too_large(self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        board_trace!("HTTP {status}, {} bytes", bytes.len());

        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    async fn task_reply(&self, action: &str) -> Result<TaskReply, ApiError> {
        let response = self.get(self.url(&[("action", action)])).await?;
        serde_json::from_str(&response.body).map_err(|err| {
            board_debug!("Unparseable {action} reply: {err}");
            ApiError::new(
                FailureKind::InvalidResponse,
                format!("Invalid response from {action} (HTTP {})", response.status),
            )
        })
    }
}

#[async_trait::async_trait]
impl DashboardApi for ReqwestApi {
    async fn snapshot(&self, group: &GroupId) -> Result<Snapshot, ApiError> {
        let kind = group.kind();
        let url = if kind.is_infra() {
            self.url(&[("type", "infra"), ("group", group.as_str())])
        } else {
            self.url(&[("group", group.as_str())])
        };
        let response = self.get(url).await?;
        let invalid = || {
            ApiError::new(
                FailureKind::InvalidResponse,
                format!(
                    "No data or invalid response format (HTTP {})",
                    response.status
                ),
            )
        };

        // The body is read whatever the status; the backend reports its own
        // failures in an `error` field.
        let value: Value = serde_json::from_str(&response.body).map_err(|_| invalid())?;
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            if !message.is_empty() {
                return Err(ApiError::remote(message));
            }
        }
        match decode_snapshot(kind, &response.body) {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => Err(ApiError::new(
                FailureKind::InvalidResponse,
                format!("Tab {group} has no snapshot"),
            )),
            Err(err) => {
                board_debug!("Snapshot for {group} did not decode: {err}");
                Err(invalid())
            }
        }
    }

    async fn task_status(&self) -> Result<TaskReply, ApiError> {
        self.task_reply("taskstatus").await
    }

    async fn start_task(&self) -> Result<TaskReply, ApiError> {
        self.task_reply("refresh").await
    }

    async fn log_types(&self) -> Result<Vec<LogTypeInfo>, ApiError> {
        let response = self.get(self.url(&[("action", "getLogTypes")])).await?;
        serde_json::from_str(&response.body)
            .map_err(|err| ApiError::new(FailureKind::InvalidResponse, err.to_string()))
    }

    async fn logs(&self, query: &LogQuery) -> Result<LogResults, ApiError> {
        let url = self.url(&[
            ("action", "getLogs"),
            ("servers", query.servers.as_str()),
            ("logType", query.log_type.as_str()),
            ("period", query.period.token()),
        ]);
        let response = self.get(url).await?;
        if !response.is_success() {
            let message = serde_json::from_str::<Value>(&response.body)
                .ok()
                .and_then(|value| value.get("error")?.as_str().map(str::to_string))
                .unwrap_or_else(|| format!("Server error (HTTP {})", response.status));
            return Err(ApiError::new(
                FailureKind::HttpStatus(response.status),
                message,
            ));
        }
        serde_json::from_str(&response.body)
            .map_err(|err| ApiError::new(FailureKind::InvalidResponse, err.to_string()))
    }
}

fn too_large(max_bytes: u64) -> ApiError {
    ApiError::new(
        FailureKind::TooLarge { max_bytes },
        format!("Response larger than {max_bytes} bytes"),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
