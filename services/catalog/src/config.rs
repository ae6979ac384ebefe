//! Catalog service configuration.
//!
//! Values come from `LUXE_*` environment variables; a YAML file named by
//! `LUXE_CONFIG` may override any of them. Production deployments refuse to
//! start with the built-in development session secret.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Session secret used when none is configured. Only acceptable outside production.
pub const DEV_SESSION_SECRET: &str = "luxe-dev-session-secret-change-me";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("unknown environment: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    Memory,
    Cloudinary,
}

impl FromStr for MediaBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(MediaBackend::Memory),
            "cloudinary" => Ok(MediaBackend::Cloudinary),
            other => bail!("unknown media backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub cookie_name: String,
    pub leeway_secs: u64,
    pub ttl_secs: u64,
    pub admin_username: String,
    /// bcrypt hash; the account cannot sign in while unset.
    pub admin_password_hash: Option<String>,
    pub manager_username: String,
    pub manager_password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub cloudinary: Option<CloudinaryConfig>,
    pub folder: String,
    /// Base URL the in-memory backend hands out image URLs under.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub environment: Environment,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub session: SessionConfig,
    pub dev_auth_bypass: bool,
    pub media: MediaConfig,
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    environment: Option<Environment>,
    storage: Option<StorageBackend>,
    database_url: Option<String>,
    pg_max_connections: Option<u32>,
    pg_acquire_timeout_ms: Option<u64>,
    session_secret: Option<String>,
    session_issuer: Option<String>,
    session_audience: Option<String>,
    session_cookie: Option<String>,
    session_leeway_secs: Option<u64>,
    session_ttl_secs: Option<u64>,
    admin_username: Option<String>,
    admin_password_hash: Option<String>,
    manager_username: Option<String>,
    manager_password_hash: Option<String>,
    dev_auth_bypass: Option<bool>,
    media_backend: Option<MediaBackend>,
    media_folder: Option<String>,
    media_public_base_url: Option<String>,
    max_upload_bytes: Option<usize>,
    cloudinary_cloud_name: Option<String>,
    cloudinary_api_key: Option<String>,
    cloudinary_api_secret: Option<String>,
    cloudinary_api_base: Option<String>,
    cors_origins: Option<Vec<String>>,
    request_timeout_ms: Option<u64>,
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("LUXE_BIND", "0.0.0.0:3000")
            .parse()
            .with_context(|| "parse LUXE_BIND")?;
        let metrics_bind = env_or("LUXE_METRICS_BIND", "0.0.0.0:9090")
            .parse()
            .with_context(|| "parse LUXE_METRICS_BIND")?;
        let environment = env_or("LUXE_ENV", "development")
            .parse()
            .with_context(|| "parse LUXE_ENV")?;
        let storage = env_or("LUXE_STORAGE", "memory")
            .parse()
            .with_context(|| "parse LUXE_STORAGE")?;
        let postgres = match std::env::var("LUXE_DATABASE_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: parse_env("LUXE_PG_MAX_CONNECTIONS", 10)?,
                acquire_timeout_ms: parse_env("LUXE_PG_ACQUIRE_TIMEOUT_MS", 5000)?,
            }),
            Err(_) => None,
        };
        let session = SessionConfig {
            secret: env_or("LUXE_SESSION_SECRET", DEV_SESSION_SECRET),
            issuer: env_or("LUXE_SESSION_ISSUER", "luxe-identity"),
            audience: env_or("LUXE_SESSION_AUDIENCE", "luxe-catalog"),
            cookie_name: env_or("LUXE_SESSION_COOKIE", "luxe.session-token"),
            leeway_secs: parse_env("LUXE_SESSION_LEEWAY_SECS", 30)?,
            ttl_secs: parse_env("LUXE_SESSION_TTL_SECS", 86_400)?,
            admin_username: env_or("LUXE_ADMIN_USERNAME", "admin"),
            admin_password_hash: std::env::var("LUXE_ADMIN_PASSWORD_HASH").ok(),
            manager_username: env_or("LUXE_MANAGER_USERNAME", "manager"),
            manager_password_hash: std::env::var("LUXE_MANAGER_PASSWORD_HASH").ok(),
        };
        let cloudinary = match (
            std::env::var("LUXE_CLOUDINARY_CLOUD_NAME"),
            std::env::var("LUXE_CLOUDINARY_API_KEY"),
            std::env::var("LUXE_CLOUDINARY_API_SECRET"),
        ) {
            (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                api_base: env_or("LUXE_CLOUDINARY_API_BASE", "https://api.cloudinary.com"),
            }),
            _ => None,
        };
        let media = MediaConfig {
            backend: env_or("LUXE_MEDIA_BACKEND", "memory")
                .parse()
                .with_context(|| "parse LUXE_MEDIA_BACKEND")?,
            cloudinary,
            folder: env_or("LUXE_MEDIA_FOLDER", "tonyluxe"),
            public_base_url: env_or("LUXE_MEDIA_PUBLIC_BASE_URL", "http://localhost:3000/media"),
            max_upload_bytes: parse_env("LUXE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        };
        let cors_origins = std::env::var("LUXE_CORS_ORIGINS")
            .map(|value| split_list(&value))
            .unwrap_or_default();
        let request_timeout = Duration::from_millis(parse_env("LUXE_REQUEST_TIMEOUT_MS", 30_000)?);

        let config = Self {
            bind_addr,
            metrics_bind,
            environment,
            storage,
            postgres,
            session,
            dev_auth_bypass: parse_env("LUXE_DEV_AUTH_BYPASS", false)?,
            media,
            cors_origins,
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("LUXE_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read LUXE_CONFIG: {path}"))?;
            let override_cfg: CatalogConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse catalog config yaml")?;
            config.apply_override(override_cfg)?;
            config.validate()?;
        }
        Ok(config)
    }

    fn apply_override(&mut self, cfg: CatalogConfigOverride) -> Result<()> {
        if let Some(value) = cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = cfg.environment {
            self.environment = value;
        }
        if let Some(value) = cfg.storage {
            self.storage = value;
        }
        if let Some(url) = cfg.database_url {
            let pg = self.postgres.get_or_insert_with(|| PostgresConfig {
                url: String::new(),
                max_connections: 10,
                acquire_timeout_ms: 5000,
            });
            pg.url = url;
        }
        if let Some(pg) = self.postgres.as_mut() {
            if let Some(value) = cfg.pg_max_connections {
                pg.max_connections = value;
            }
            if let Some(value) = cfg.pg_acquire_timeout_ms {
                pg.acquire_timeout_ms = value;
            }
        }
        if let Some(value) = cfg.session_secret {
            self.session.secret = value;
        }
        if let Some(value) = cfg.session_issuer {
            self.session.issuer = value;
        }
        if let Some(value) = cfg.session_audience {
            self.session.audience = value;
        }
        if let Some(value) = cfg.session_cookie {
            self.session.cookie_name = value;
        }
        if let Some(value) = cfg.session_leeway_secs {
            self.session.leeway_secs = value;
        }
        if let Some(value) = cfg.session_ttl_secs {
            self.session.ttl_secs = value;
        }
        if let Some(value) = cfg.admin_username {
            self.session.admin_username = value;
        }
        if let Some(value) = cfg.admin_password_hash {
            self.session.admin_password_hash = Some(value);
        }
        if let Some(value) = cfg.manager_username {
            self.session.manager_username = value;
        }
        if let Some(value) = cfg.manager_password_hash {
            self.session.manager_password_hash = Some(value);
        }
        if let Some(value) = cfg.dev_auth_bypass {
            self.dev_auth_bypass = value;
        }
        if let Some(value) = cfg.media_backend {
            self.media.backend = value;
        }
        if let Some(value) = cfg.media_folder {
            self.media.folder = value;
        }
        if let Some(value) = cfg.media_public_base_url {
            self.media.public_base_url = value;
        }
        if let Some(value) = cfg.max_upload_bytes {
            self.media.max_upload_bytes = value;
        }
        if let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            cfg.cloudinary_cloud_name,
            cfg.cloudinary_api_key,
            cfg.cloudinary_api_secret,
        ) {
            self.media.cloudinary = Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                api_base: "https://api.cloudinary.com".to_string(),
            });
        }
        if let (Some(cloudinary), Some(api_base)) =
            (self.media.cloudinary.as_mut(), cfg.cloudinary_api_base)
        {
            cloudinary.api_base = api_base;
        }
        if let Some(value) = cfg.cors_origins {
            self.cors_origins = value;
        }
        if let Some(value) = cfg.request_timeout_ms {
            self.request_timeout = Duration::from_millis(value);
        }
        Ok(())
    }

    /// Reject combinations that must never reach a running server.
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.session.secret == DEV_SESSION_SECRET {
            bail!("LUXE_SESSION_SECRET must be set in production");
        }
        if self.session.secret.len() < 16 {
            bail!("session secret must be at least 16 bytes");
        }
        if self.session.admin_username.trim().is_empty()
            || self.session.manager_username.trim().is_empty()
        {
            bail!("staff usernames must not be empty");
        }
        if self.session.admin_username == self.session.manager_username {
            bail!("admin and manager usernames must differ");
        }
        for (key, hash) in [
            ("admin password hash", &self.session.admin_password_hash),
            ("manager password hash", &self.session.manager_password_hash),
        ] {
            if let Some(hash) = hash {
                hash.parse::<bcrypt::HashParts>()
                    .map_err(|err| anyhow::anyhow!("{key} is not a bcrypt hash: {err}"))?;
            }
        }
        if self.media.backend == MediaBackend::Cloudinary && self.media.cloudinary.is_none() {
            bail!("cloudinary media backend requires cloud name, api key and api secret");
        }
        if self.media.max_upload_bytes == 0 {
            bail!("max upload bytes must be positive");
        }
        Ok(())
    }

    /// Whether the development auth bypass is honored. Never in production.
    pub fn dev_bypass_active(&self) -> bool {
        self.dev_auth_bypass && !self.environment.is_production()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const KEYS: &[&str] = &[
        "LUXE_BIND",
        "LUXE_METRICS_BIND",
        "LUXE_ENV",
        "LUXE_STORAGE",
        "LUXE_DATABASE_URL",
        "LUXE_SESSION_SECRET",
        "LUXE_SESSION_COOKIE",
        "LUXE_ADMIN_USERNAME",
        "LUXE_ADMIN_PASSWORD_HASH",
        "LUXE_MANAGER_USERNAME",
        "LUXE_MANAGER_PASSWORD_HASH",
        "LUXE_DEV_AUTH_BYPASS",
        "LUXE_MEDIA_BACKEND",
        "LUXE_MAX_UPLOAD_BYTES",
        "LUXE_CORS_ORIGINS",
        "LUXE_REQUEST_TIMEOUT_MS",
        "LUXE_CONFIG",
    ];

    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let saved = KEYS
                .iter()
                .map(|key| (*key, std::env::var(key).ok()))
                .collect();
            for key in KEYS {
                unsafe { std::env::remove_var(key) };
            }
            Self { saved }
        }

        fn set(&self, key: &str, value: &str) {
            unsafe { std::env::set_var(key, value) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                match value {
                    Some(value) => unsafe { std::env::set_var(key, value) },
                    None => unsafe { std::env::remove_var(key) },
                }
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_are_development_memory() {
        let _guard = EnvGuard::clean();
        let config = CatalogConfig::from_env().expect("config");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.media.backend, MediaBackend::Memory);
        assert_eq!(config.media.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.media.folder, "tonyluxe");
        assert!(config.cors_origins.is_empty());
        assert!(config.postgres.is_none());
        assert!(!config.dev_bypass_active());
    }

    #[test]
    #[serial]
    fn production_refuses_dev_secret() {
        let guard = EnvGuard::clean();
        guard.set("LUXE_ENV", "production");
        let err = CatalogConfig::from_env().expect_err("dev secret in production");
        assert!(err.to_string().contains("LUXE_SESSION_SECRET"));

        guard.set("LUXE_SESSION_SECRET", "a-real-production-secret-value");
        guard.set("LUXE_DEV_AUTH_BYPASS", "true");
        let config = CatalogConfig::from_env().expect("config");
        assert!(config.dev_auth_bypass);
        assert!(!config.dev_bypass_active());
    }

    #[test]
    #[serial]
    fn invalid_numbers_fail_with_context() {
        let guard = EnvGuard::clean();
        guard.set("LUXE_MAX_UPLOAD_BYTES", "ten");
        let err = CatalogConfig::from_env().expect_err("bad number");
        assert!(format!("{err:#}").contains("LUXE_MAX_UPLOAD_BYTES"));
    }

    #[test]
    #[serial]
    fn cloudinary_backend_requires_credentials() {
        let guard = EnvGuard::clean();
        guard.set("LUXE_MEDIA_BACKEND", "cloudinary");
        assert!(CatalogConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn cors_origins_are_split_and_trimmed() {
        let guard = EnvGuard::clean();
        guard.set("LUXE_CORS_ORIGINS", "https://a.test, https://b.test ,");
        let config = CatalogConfig::from_env().expect("config");
        assert_eq!(config.cors_origins, vec!["https://a.test", "https://b.test"]);
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let guard = EnvGuard::clean();
        let dir = std::env::temp_dir().join(format!("luxe-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("catalog.yaml");
        let mut file = std::fs::File::create(&path).expect("file");
        writeln!(
            file,
            "bind_addr: \"127.0.0.1:4000\"\nstorage: postgres\ndatabase_url: \"postgres://db/luxe\"\nsession_cookie: \"custom\"\nmax_upload_bytes: 1024\nrequest_timeout_ms: 500"
        )
        .expect("write");
        guard.set("LUXE_CONFIG", path.to_str().expect("path"));

        let config = CatalogConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.bind_addr.port(), 4000);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(
            config.postgres.as_ref().map(|pg| pg.url.as_str()),
            Some("postgres://db/luxe")
        );
        assert_eq!(config.session.cookie_name, "custom");
        assert_eq!(config.media.max_upload_bytes, 1024);
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    #[serial]
    fn staff_credentials_come_from_env() {
        let guard = EnvGuard::clean();
        let config = CatalogConfig::from_env().expect("config");
        assert_eq!(config.session.admin_username, "admin");
        assert_eq!(config.session.manager_username, "manager");
        assert!(config.session.admin_password_hash.is_none());

        let hash = bcrypt::hash("open-sesame", 4).expect("hash");
        guard.set("LUXE_ADMIN_USERNAME", "tony");
        guard.set("LUXE_ADMIN_PASSWORD_HASH", &hash);
        let config = CatalogConfig::from_env().expect("config");
        assert_eq!(config.session.admin_username, "tony");
        assert_eq!(config.session.admin_password_hash.as_deref(), Some(hash.as_str()));
        assert!(config.session.manager_password_hash.is_none());
    }

    #[test]
    #[serial]
    fn malformed_password_hash_is_rejected() {
        let guard = EnvGuard::clean();
        guard.set("LUXE_MANAGER_PASSWORD_HASH", "plaintext-password");
        let err = CatalogConfig::from_env().expect_err("not a bcrypt hash");
        assert!(err.to_string().contains("manager password hash"));

        guard.set("LUXE_MANAGER_PASSWORD_HASH", &bcrypt::hash("pw", 4).expect("hash"));
        guard.set("LUXE_MANAGER_USERNAME", "admin");
        let err = CatalogConfig::from_env().expect_err("shared username");
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    #[serial]
    fn yaml_sets_staff_credentials() {
        let guard = EnvGuard::clean();
        let hash = bcrypt::hash("hunter2", 4).expect("hash");
        let path = std::env::temp_dir().join(format!("luxe-staff-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            format!("manager_username: \"ops\"\nmanager_password_hash: \"{hash}\"\n"),
        )
        .expect("write");
        guard.set("LUXE_CONFIG", path.to_str().expect("path"));
        let config = CatalogConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.session.manager_username, "ops");
        assert_eq!(config.session.manager_password_hash.as_deref(), Some(hash.as_str()));
        assert_eq!(config.session.admin_username, "admin");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    #[serial]
    fn yaml_rejects_unknown_keys() {
        let guard = EnvGuard::clean();
        let path = std::env::temp_dir().join(format!("luxe-bad-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "bind_adr: \"127.0.0.1:4000\"\n").expect("write");
        guard.set("LUXE_CONFIG", path.to_str().expect("path"));
        assert!(CatalogConfig::from_env_or_yaml().is_err());
        let _ = std::fs::remove_file(path);
    }
}
