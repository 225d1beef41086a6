//! Configuration module
//!
//! Env-based configuration for the custody API and services: database,
//! content storage backend, ledger anchoring, and access settings. The ledger
//! section is surfaced as one optional block so the anchor client can be
//! constructed from explicit values instead of reading the environment
//! itself.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const STORAGE_GET_MAX_ATTEMPTS: u32 = 3;
const STORAGE_GET_RETRY_DELAY_MS: u64 = 500;
const LEDGER_TIMEOUT_SECS: u64 = 10;
const MAX_DOCUMENT_SIZE_MB: usize = 25;

/// Content storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Ipfs,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ipfs" => Ok(StorageBackend::Ipfs),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Ipfs => write!(f, "ipfs"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Explicit ledger anchoring settings, handed to the anchor client
/// constructor. Absent when anchoring is not configured.
#[derive(Clone, Debug)]
pub struct LedgerSettings {
    pub endpoint: String,
    pub contract_address: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Base configuration shared by server and services
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
}

/// Custody service configuration
#[derive(Clone, Debug)]
pub struct CustodyConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Content storage configuration
    pub storage_backend: StorageBackend,
    pub ipfs_api_url: Option<String>,
    pub ipfs_gateway_url: Option<String>,
    pub ipfs_api_token: Option<String>,
    pub local_storage_path: Option<String>,
    pub storage_get_max_attempts: u32,
    pub storage_get_retry_delay_ms: u64,
    // Ledger anchoring (optional; absence means anchoring is skipped)
    pub ledger_endpoint: Option<String>,
    pub ledger_contract_address: Option<String>,
    pub ledger_api_key: Option<String>,
    pub ledger_timeout_secs: u64,
    // Custody policy
    pub departments: Vec<String>,
    pub max_document_size_bytes: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<CustodyConfig>);

impl Config {
    fn inner(&self) -> &CustodyConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = CustodyConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn ipfs_api_url(&self) -> Option<&str> {
        self.inner().ipfs_api_url.as_deref()
    }

    pub fn ipfs_gateway_url(&self) -> Option<&str> {
        self.inner().ipfs_gateway_url.as_deref()
    }

    pub fn ipfs_api_token(&self) -> Option<&str> {
        self.inner().ipfs_api_token.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn storage_get_max_attempts(&self) -> u32 {
        self.inner().storage_get_max_attempts
    }

    pub fn storage_get_retry_delay(&self) -> Duration {
        Duration::from_millis(self.inner().storage_get_retry_delay_ms)
    }

    /// Ledger settings, present only when an endpoint is configured.
    pub fn ledger_settings(&self) -> Option<LedgerSettings> {
        let inner = self.inner();
        let endpoint = inner.ledger_endpoint.clone()?;
        let contract_address = inner.ledger_contract_address.clone()?;
        Some(LedgerSettings {
            endpoint,
            contract_address,
            api_key: inner.ledger_api_key.clone(),
            timeout: Duration::from_secs(inner.ledger_timeout_secs),
        })
    }

    pub fn departments(&self) -> &[String] {
        &self.inner().departments
    }

    pub fn max_document_size_bytes(&self) -> usize {
        self.inner().max_document_size_bytes
    }
}

impl CustodyConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(StorageBackend::Ipfs);

        let max_document_size_mb = env::var("MAX_DOCUMENT_SIZE_MB")
            .unwrap_or_else(|_| MAX_DOCUMENT_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_DOCUMENT_SIZE_MB);

        let departments = env::var("DEPARTMENTS")
            .unwrap_or_else(|_| {
                "Revenue Department,Transport Department,Health Department,Urban Development"
                    .to_string()
            })
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = CustodyConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            ipfs_api_url: env::var("IPFS_API_URL").ok().filter(|s| !s.is_empty()),
            ipfs_gateway_url: env::var("IPFS_GATEWAY_URL").ok().filter(|s| !s.is_empty()),
            ipfs_api_token: env::var("IPFS_API_TOKEN").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok().filter(|s| !s.is_empty()),
            storage_get_max_attempts: env::var("STORAGE_GET_MAX_ATTEMPTS")
                .unwrap_or_else(|_| STORAGE_GET_MAX_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(STORAGE_GET_MAX_ATTEMPTS),
            storage_get_retry_delay_ms: env::var("STORAGE_GET_RETRY_DELAY_MS")
                .unwrap_or_else(|_| STORAGE_GET_RETRY_DELAY_MS.to_string())
                .parse()
                .unwrap_or(STORAGE_GET_RETRY_DELAY_MS),
            ledger_endpoint: env::var("LEDGER_ENDPOINT").ok().filter(|s| !s.is_empty()),
            ledger_contract_address: env::var("LEDGER_CONTRACT_ADDRESS")
                .ok()
                .filter(|s| !s.is_empty()),
            ledger_api_key: env::var("LEDGER_API_KEY").ok().filter(|s| !s.is_empty()),
            ledger_timeout_secs: env::var("LEDGER_TIMEOUT_SECS")
                .unwrap_or_else(|_| LEDGER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(LEDGER_TIMEOUT_SECS),
            departments,
            max_document_size_bytes: max_document_size_mb * 1024 * 1024,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        match self.storage_backend {
            StorageBackend::Ipfs => {
                if self.ipfs_api_url.is_none() || self.ipfs_api_token.is_none() {
                    return Err(anyhow::anyhow!(
                        "IPFS_API_URL and IPFS_API_TOKEN must be set when using the IPFS storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using the local storage backend"
                    ));
                }
            }
        }

        if self.ledger_endpoint.is_some() && self.ledger_contract_address.is_none() {
            return Err(anyhow::anyhow!(
                "LEDGER_CONTRACT_ADDRESS must be set when LEDGER_ENDPOINT is configured"
            ));
        }

        if self.storage_get_max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "STORAGE_GET_MAX_ATTEMPTS must be at least 1"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CustodyConfig {
        CustodyConfig {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                environment: "development".to_string(),
            },
            database_url: "postgresql://localhost/digisewa".to_string(),
            storage_backend: StorageBackend::Local,
            ipfs_api_url: None,
            ipfs_gateway_url: None,
            ipfs_api_token: None,
            local_storage_path: Some("/tmp/digisewa".to_string()),
            storage_get_max_attempts: STORAGE_GET_MAX_ATTEMPTS,
            storage_get_retry_delay_ms: STORAGE_GET_RETRY_DELAY_MS,
            ledger_endpoint: None,
            ledger_contract_address: None,
            ledger_api_key: None,
            ledger_timeout_secs: LEDGER_TIMEOUT_SECS,
            departments: vec!["Revenue Department".to_string()],
            max_document_size_bytes: MAX_DOCUMENT_SIZE_MB * 1024 * 1024,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = test_config();
        config.base.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ipfs_backend_requires_credentials() {
        let mut config = test_config();
        config.storage_backend = StorageBackend::Ipfs;
        assert!(config.validate().is_err());

        config.ipfs_api_url = Some("https://api.pinata.cloud".to_string());
        config.ipfs_api_token = Some("token".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ledger_endpoint_requires_contract() {
        let mut config = test_config();
        config.ledger_endpoint = Some("http://localhost:8545".to_string());
        assert!(config.validate().is_err());

        config.ledger_contract_address = Some("0xabc".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ledger_settings_absent_without_endpoint() {
        let config = Config(Box::new(test_config()));
        assert!(config.ledger_settings().is_none());
    }
}
