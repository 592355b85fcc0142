//! Bot configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default gateway daemon URL.
const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8420";

/// Default database URL.
const DEFAULT_DATABASE_URL: &str = "sqlite:data/tutor.db?mode=rwc";

/// Default delay before a reconnect attempt. A constant delay is enough
/// here; connection failures are rare and do not storm.
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Top-level bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Gateway daemon base URL.
    pub gateway_url: String,
    /// Account JID for multi-account gateways.
    pub account: Option<String>,
    /// SQLite database URL.
    pub database_url: String,
    /// Mirror mode: the account talks to itself as a private interface.
    pub mirror_mode: bool,
    /// Delay between reconnect attempts.
    pub reconnect_delay: Duration,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional: `GATEWAY_URL`, `WA_ACCOUNT`, `DATABASE_URL`,
    /// `MIRROR_MODE`, `RECONNECT_DELAY_SECS`.
    pub fn from_env() -> Self {
        let gateway_url =
            env::var("GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());
        let account = env::var("WA_ACCOUNT").ok();
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let mirror_mode = env::var("MIRROR_MODE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | ""))
            .unwrap_or(false);
        let reconnect_delay = env::var("RECONNECT_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RECONNECT_DELAY);

        Self {
            gateway_url,
            account,
            database_url,
            mirror_mode,
            reconnect_delay,
        }
    }

    /// Gateway client configuration.
    pub fn gateway_config(&self) -> wa_gateway::GatewayConfig {
        match &self.account {
            Some(account) => {
                wa_gateway::GatewayConfig::with_account(&self.gateway_url, account)
            }
            None => wa_gateway::GatewayConfig::new(&self.gateway_url),
        }
    }
}
