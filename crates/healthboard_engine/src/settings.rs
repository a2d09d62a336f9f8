use std::time::Duration;

/// Where the backend lives and how patient the client is with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Full URL of the dashboard endpoint, e.g. `http://ops/api.aspx`.
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost/api.aspx".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 16 * 1024 * 1024,
        }
    }
}
