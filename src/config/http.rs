//! HTTP API and authentication configuration

use serde::{Deserialize, Serialize};

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address for HTTP server (e.g., "127.0.0.1:8080")
    pub listen_addr: String,
    /// Enable CORS; the browser extension calls from arbitrary origins
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            cors_enabled: true,
        }
    }
}

/// Passphrase authentication.
///
/// Clients send the SHA512 hex of the passphrase in the `x-hlte-pp` header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected header value; unset or empty disables auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase_sha512: Option<String>,
}

impl AuthConfig {
    /// The configured digest, if auth is enabled
    pub fn expected(&self) -> Option<&str> {
        self.passphrase_sha512.as_deref().filter(|s| !s.is_empty())
    }
}
