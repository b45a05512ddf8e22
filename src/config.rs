use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// PostgreSQL connection URL (overridden by `DATABASE_URL`)
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    pub payments: PaymentsConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub key_trust: KeyTrustConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub host: String,
    pub port: u16,
    /// Listener for `GET /jwt-public-key`; keep it off the public network
    pub internal_host: String,
    pub internal_port: u16,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Base64 Ed25519 keypair or seed (overridden by `JWT_SECRET`)
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

/// Payments-side trust in the auth service's key
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeyTrustConfig {
    pub endpoint: String,
    pub fetch_timeout_ms: u64,
    pub startup_attempts: u32,
    pub retry_delay_ms: u64,
    /// 0 disables background refresh
    pub refresh_interval_secs: u64,
    pub leeway_secs: u64,
}

impl Default for KeyTrustConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4444/jwt-public-key".to_string(),
            fetch_timeout_ms: 5_000,
            startup_attempts: 5,
            retry_delay_ms: 1_000,
            refresh_interval_secs: 300,
            leeway_secs: 0,
        }
    }
}

impl KeyTrustConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn default_max_connections() -> u32 {
    20
}

fn default_token_ttl_secs() -> u64 {
    300
}

impl AppConfig {
    /// Load `config/{env}.yaml`, then apply environment overrides
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.postgres_url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.auth.jwt_secret = Some(secret);
        }
    }

    pub fn database_url(&self) -> Result<&str> {
        self.postgres_url
            .as_deref()
            .ok_or_else(|| anyhow!("postgres_url is not configured (set DATABASE_URL)"))
    }

    pub fn jwt_secret(&self) -> Result<&str> {
        self.auth
            .jwt_secret
            .as_deref()
            .ok_or_else(|| anyhow!("auth.jwt_secret is not configured (set JWT_SECRET)"))
    }

    pub fn payments_addr(&self) -> String {
        format!("{}:{}", self.payments.host, self.payments.port)
    }

    pub fn auth_addr(&self) -> String {
        format!("{}:{}", self.auth.host, self.auth.port)
    }

    pub fn auth_internal_addr(&self) -> String {
        format!("{}:{}", self.auth.internal_host, self.auth.internal_port)
    }
}
