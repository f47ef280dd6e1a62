//! Configuration module
//!
//! Configuration is read from the environment (with `.env` support) into
//! [`PortalConfig`] and shared through the cheap-to-clone [`Config`] wrapper.

use std::env;

use crate::constants::DEFAULT_SIGNED_URL_TTL_SECS;
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SESSION_TTL_HOURS: i64 = 12;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
const MAX_ORPHAN_GRACE_PERIOD_SECS: u64 = 30 * 24 * 3600;
const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 3600;
const MAX_LOGIN_FAILURE_WINDOW_SECS: u64 = 24 * 3600;

/// Settings every portal process needs regardless of storage or auth specifics.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub http_concurrency_limit: usize,
    /// Proxies in front of the server whose `X-Forwarded-For` entries are trusted.
    pub trusted_proxy_count: usize,
    pub environment: String,
}

/// Full configuration of the portal server.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    pub public_base_url: String,
    pub signed_url_ttl_secs: u64,
    // Upload limits
    pub max_document_size_bytes: usize,
    pub document_allowed_extensions: Vec<String>,
    // Operator credential
    pub admin_username: String,
    pub admin_password_hash: String,
    pub bcrypt_cost: u32,
    // Login throttling
    pub login_max_failures: u32,
    pub login_failure_window_secs: u64,
    /// Interval between orphan sweeps. 0 = disabled.
    pub orphan_sweep_interval_secs: u64,
    /// Objects younger than this are never swept, so in-flight uploads survive.
    pub orphan_grace_period_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PortalConfig>);

impl Config {
    fn as_portal(&self) -> &PortalConfig {
        &self.0
    }

    pub fn new(config: PortalConfig) -> Self {
        Config(Box::new(config))
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_portal().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PortalConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_portal().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_portal().base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_portal().base.jwt_secret
    }

    pub fn session_ttl_hours(&self) -> i64 {
        self.as_portal().base.session_ttl_hours
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_portal().base.cors_origins
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_portal().base.http_concurrency_limit
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.as_portal().base.trusted_proxy_count
    }

    pub fn environment(&self) -> &str {
        &self.as_portal().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_portal().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_portal().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.as_portal().database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_portal().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_portal().s3_bucket.as_deref()
    }

    /// S3 region, falling back to `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.as_portal()
            .s3_region
            .as_deref()
            .or(self.as_portal().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_portal().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.as_portal().local_storage_path
    }

    pub fn public_base_url(&self) -> &str {
        &self.as_portal().public_base_url
    }

    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.as_portal().signed_url_ttl_secs
    }

    pub fn max_document_size_bytes(&self) -> usize {
        self.as_portal().max_document_size_bytes
    }

    pub fn document_allowed_extensions(&self) -> &[String] {
        &self.as_portal().document_allowed_extensions
    }

    pub fn admin_username(&self) -> &str {
        &self.as_portal().admin_username
    }

    pub fn admin_password_hash(&self) -> &str {
        &self.as_portal().admin_password_hash
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.as_portal().bcrypt_cost
    }

    pub fn login_max_failures(&self) -> u32 {
        self.as_portal().login_max_failures
    }

    pub fn login_failure_window_secs(&self) -> u64 {
        self.as_portal().login_failure_window_secs
    }

    pub fn orphan_sweep_interval_secs(&self) -> u64 {
        self.as_portal().orphan_sweep_interval_secs
    }

    pub fn orphan_grace_period_secs(&self) -> u64 {
        self.as_portal().orphan_grace_period_secs
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_DOCUMENT_SIZE_MB: usize = 50;
        const BCRYPT_COST: u32 = 10;
        const LOGIN_MAX_FAILURES: u32 = 5;
        const LOGIN_FAILURE_WINDOW_SECS: u64 = 300;
        const ORPHAN_SWEEP_INTERVAL_SECS: u64 = 3600;
        const ORPHAN_GRACE_PERIOD_SECS: u64 = 600;

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

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
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
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| SESSION_TTL_HOURS.to_string())
                .parse()
                .unwrap_or(SESSION_TTL_HOURS),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|_| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Local,
        };

        let config = PortalConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/documents".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
            max_document_size_bytes: env::var("MAX_DOCUMENT_SIZE_MB")
                .unwrap_or_else(|_| MAX_DOCUMENT_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_DOCUMENT_SIZE_MB)
                * 1024
                * 1024,
            document_allowed_extensions: env::var("DOCUMENT_ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| {
                    "pdf,doc,docx,xls,xlsx,ppt,pptx,txt,csv,png,jpg,jpeg".to_string()
                })
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            admin_username: env::var("ADMIN_USERNAME")
                .map_err(|_| anyhow::anyhow!("ADMIN_USERNAME must be set"))?,
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH")
                .map_err(|_| anyhow::anyhow!("ADMIN_PASSWORD_HASH must be set"))?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| BCRYPT_COST.to_string())
                .parse()
                .unwrap_or(BCRYPT_COST),
            login_max_failures: env::var("LOGIN_MAX_FAILURES")
                .unwrap_or_else(|_| LOGIN_MAX_FAILURES.to_string())
                .parse()
                .unwrap_or(LOGIN_MAX_FAILURES),
            login_failure_window_secs: env::var("LOGIN_FAILURE_WINDOW_SECS")
                .unwrap_or_else(|_| LOGIN_FAILURE_WINDOW_SECS.to_string())
                .parse()
                .unwrap_or(LOGIN_FAILURE_WINDOW_SECS),
            orphan_sweep_interval_secs: env::var("ORPHAN_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| ORPHAN_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(ORPHAN_SWEEP_INTERVAL_SECS),
            orphan_grace_period_secs: env::var("ORPHAN_GRACE_PERIOD_SECS")
                .unwrap_or_else(|_| ORPHAN_GRACE_PERIOD_SECS.to_string())
                .parse()
                .unwrap_or(ORPHAN_GRACE_PERIOD_SECS),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.admin_username.trim().is_empty() {
            return Err(anyhow::anyhow!("ADMIN_USERNAME must not be empty"));
        }

        if !self.admin_password_hash.starts_with("$2") {
            return Err(anyhow::anyhow!(
                "ADMIN_PASSWORD_HASH must be a bcrypt hash (generate one with `portal hash-password`)"
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(anyhow::anyhow!("BCRYPT_COST must be between 4 and 31"));
        }

        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.base.session_ttl_hours) {
            return Err(anyhow::anyhow!(
                "SESSION_TTL_HOURS must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            ));
        }

        if !(1..=MAX_SIGNED_URL_TTL_SECS).contains(&self.signed_url_ttl_secs) {
            return Err(anyhow::anyhow!(
                "SIGNED_URL_TTL_SECS must be between 1 and {}",
                MAX_SIGNED_URL_TTL_SECS
            ));
        }

        if self.orphan_grace_period_secs > MAX_ORPHAN_GRACE_PERIOD_SECS {
            return Err(anyhow::anyhow!(
                "ORPHAN_GRACE_PERIOD_SECS must be at most {}",
                MAX_ORPHAN_GRACE_PERIOD_SECS
            ));
        }

        if self.login_failure_window_secs > MAX_LOGIN_FAILURE_WINDOW_SECS {
            return Err(anyhow::anyhow!(
                "LOGIN_FAILURE_WINDOW_SECS must be at most {}",
                MAX_LOGIN_FAILURE_WINDOW_SECS
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PortalConfig {
        PortalConfig {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: 5,
                db_timeout_seconds: 5,
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                session_ttl_hours: 12,
                http_concurrency_limit: 100,
                trusted_proxy_count: 0,
                environment: "development".to_string(),
            },
            database_url: "postgresql://localhost/portal".to_string(),
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: "./data".to_string(),
            public_base_url: "http://localhost:4000".to_string(),
            signed_url_ttl_secs: 3600,
            max_document_size_bytes: 1024,
            document_allowed_extensions: vec!["pdf".to_string()],
            admin_username: "operator".to_string(),
            admin_password_hash: "$2b$04$abcdefghijklmnopqrstuu5Cw4Q1B0p3dQ3mB6xTqvZ2M3rYzZ5y".to_string(),
            bcrypt_cost: 10,
            login_max_failures: 5,
            login_failure_window_secs: 300,
            orphan_sweep_interval_secs: 0,
            orphan_grace_period_secs: 600,
        }
    }

    #[test]
    fn accepts_valid_local_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let mut config = valid_config();
        config.base.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn s3_backend_requires_bucket_and_region() {
        let mut config = valid_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("documents".to_string());
        assert!(config.validate().is_err());

        config.aws_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(Config::new(config).s3_region(), Some("eu-west-1"));
    }

    #[test]
    fn rejects_plaintext_admin_password() {
        let mut config = valid_config();
        config.admin_password_hash = "hunter2".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn session_ttl_must_be_positive_and_bounded() {
        let mut config = valid_config();
        config.base.session_ttl_hours = 0;
        assert!(config.validate().is_err());
        config.base.session_ttl_hours = -3;
        assert!(config.validate().is_err());
        config.base.session_ttl_hours = i64::MAX;
        assert!(config.validate().is_err());
        config.base.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn orphan_grace_period_is_bounded() {
        let mut config = valid_config();
        config.orphan_grace_period_secs = u64::MAX;
        assert!(config.validate().is_err());
        config.orphan_grace_period_secs = MAX_ORPHAN_GRACE_PERIOD_SECS;
        assert!(config.validate().is_ok());
        config.orphan_grace_period_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn signed_url_ttl_is_bounded() {
        let mut config = valid_config();
        config.signed_url_ttl_secs = u64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_detection() {
        let mut config = valid_config();
        config.base.environment = "Prod".to_string();
        assert!(Config::new(config).is_production());
    }
}
