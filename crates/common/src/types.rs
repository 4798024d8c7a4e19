use serde::{Deserialize, Serialize};

/// Optional network egress settings applied to external login/status calls.
///
/// Persisted as the `userProxy` record, derived from the member-info proxy
/// field on credential login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub protocol: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            host: String::new(),
            port: 0,
            user: None,
            pass: None,
            protocol: "http".into(),
        }
    }
}

impl ProxyConfig {
    /// Proxy URL without credentials (`http://host:port`).
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}
