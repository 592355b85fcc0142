//! Configuration types for the gateway client.

/// Configuration for connecting to the WhatsApp gateway daemon.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the daemon HTTP server (e.g., "http://localhost:8420").
    pub base_url: String,
    /// Account JID for multi-account mode.
    /// If None, assumes single-account mode.
    pub account: Option<String>,
}

impl GatewayConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            account: None,
        }
    }

    /// Create configuration with a specific account for multi-account mode.
    pub fn with_account(base_url: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            account: Some(account.into()),
        }
    }

    /// Get the RPC endpoint URL.
    pub fn rpc_url(&self) -> String {
        format!("{}/api/v1/rpc", self.base_url)
    }

    /// Get the events endpoint URL (with account query param if set).
    pub fn events_url(&self) -> String {
        match &self.account {
            Some(account) => {
                let encoded = urlencoding::encode(account);
                format!("{}/api/v1/events?account={}", self.base_url, encoded)
            }
            None => format!("{}/api/v1/events", self.base_url),
        }
    }

    /// Get the health check endpoint URL.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }

    /// Get the download URL for a media payload.
    pub fn media_url(&self, media_id: &str) -> String {
        format!(
            "{}/api/v1/media/{}",
            self.base_url,
            urlencoding::encode(media_id)
        )
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new("http://localhost:8420")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let config = GatewayConfig::default();
        assert_eq!(config.rpc_url(), "http://localhost:8420/api/v1/rpc");
        assert_eq!(config.check_url(), "http://localhost:8420/api/v1/check");
        assert_eq!(config.events_url(), "http://localhost:8420/api/v1/events");
    }

    #[test]
    fn test_events_url_with_account() {
        let config = GatewayConfig::with_account("http://localhost:8420", "5511999990000@s.whatsapp.net");
        assert_eq!(
            config.events_url(),
            "http://localhost:8420/api/v1/events?account=5511999990000%40s.whatsapp.net"
        );
    }

    #[test]
    fn test_media_url_encodes_id() {
        let config = GatewayConfig::default();
        assert_eq!(
            config.media_url("abc/123"),
            "http://localhost:8420/api/v1/media/abc%2F123"
        );
    }
}
