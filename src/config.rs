//! Configuration management for the cloud files server
//!
//! Settings are layered: built-in defaults, then an optional `config.toml`,
//! then `CLOUD_*` environment variables. The result is split into the
//! startup settings (network, store, auth) and the upload limits.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix, e.g. `CLOUD_STORE_ROOT`.
const ENV_PREFIX: &str = "CLOUD";

/// Name of the authentication cookie.
pub const AUTH_COOKIE_NAME: &str = "cloud_auth";

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub startup: StartupConfig,
    pub upload: UploadConfig,
}

/// Settings that are fixed for the lifetime of the process
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    // ═══ NETWORK ═══
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// HTTP port
    pub port: u16,

    /// Origins allowed by CORS. Empty disables the CORS layer.
    /// Environment: CLOUD_ALLOWED_ORIGINS (comma separated)
    pub allowed_origins: Vec<String>,

    // ═══ STORE ═══
    /// Directory every relative path is resolved against
    pub store_root: String,

    /// Directory where uploads are written before validation
    pub staging_dir: String,

    /// URL path the store root is served under
    pub static_mount: String,

    /// Prefix prepended to stored paths when building public URLs
    pub public_url_base: String,

    /// Upper bound on a recursive directory size walk
    pub dir_size_timeout_secs: u64,

    // ═══ AUTH ═══
    /// Disables the shared-secret cookie gate when false
    pub auth_enabled: bool,

    /// Password accepted by the login endpoint.
    /// Environment: CLOUD_APP_PASSWORD
    pub app_password: Option<String>,

    /// Value the auth cookie must carry
    pub auth_cookie_value: String,

    /// Adds the `Secure` attribute to the auth cookie
    pub secure_cookies: bool,
}

/// Upload limits and image processing settings
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Largest single uploaded file accepted into staging, in MB
    pub max_upload_size_mb: u64,

    /// Largest office/PDF document accepted into the store, in MB
    pub max_document_size_mb: u64,

    /// Images are downscaled so neither side exceeds this many pixels
    pub max_image_dimension: u32,

    /// JPEG quality used when re-encoding
    pub jpeg_quality: u8,
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        // Try production path first, then development path
        let config_paths = [
            "cloud-files-server/config", // Docker production: /app/cloud-files-server/config.toml
            "config",                    // Local development: ./config.toml
        ];

        let mut builder = Self::defaults(Config::builder())?;
        for config_path in config_paths {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            )
            .build()?;

        Self::from_settings(settings)
    }

    /// Deserialize both sections from an already built `Config`
    pub fn from_settings(settings: Config) -> Result<Self, ConfigError> {
        let config = ServerConfig {
            startup: settings.clone().try_deserialize()?,
            upload: settings.try_deserialize()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default configuration rooted at `store_root`, ignoring files and environment
    pub fn for_store_root(store_root: &str) -> Result<Self, ConfigError> {
        let settings = Self::defaults(Config::builder())?
            .set_override("store_root", store_root)?
            .build()?;
        Self::from_settings(settings)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 5000)?
            .set_default("allowed_origins", Vec::<String>::new())?
            .set_default("store_root", "./uploads")?
            .set_default("staging_dir", "./staging")?
            .set_default("static_mount", "/uploads")?
            .set_default("public_url_base", "/uploads")?
            .set_default("dir_size_timeout_secs", 30)?
            .set_default("auth_enabled", true)?
            .set_default("auth_cookie_value", "ok")?
            .set_default("secure_cookies", false)?
            .set_default("max_upload_size_mb", 1024)?
            .set_default("max_document_size_mb", 20)?
            .set_default("max_image_dimension", 2400)?
            .set_default("jpeg_quality", 90)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.startup.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.startup.store_root.trim().is_empty() {
            return Err(ConfigError::Message("store_root cannot be empty".into()));
        }

        if self.startup.staging_dir.trim().is_empty() {
            return Err(ConfigError::Message("staging_dir cannot be empty".into()));
        }

        if !self.startup.static_mount.starts_with('/') || self.startup.static_mount == "/" {
            return Err(ConfigError::Message(
                "static_mount must be an absolute URL path other than /".into(),
            ));
        }

        let cookie = &self.startup.auth_cookie_value;
        if cookie.is_empty() || cookie.contains([';', ',', ' ', '"', '\\', '%']) {
            return Err(ConfigError::Message(
                "auth_cookie_value must be non-empty and free of separators".into(),
            ));
        }

        if self.startup.dir_size_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "dir_size_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.upload.max_upload_size_mb == 0 || self.upload.max_document_size_mb == 0 {
            return Err(ConfigError::Message(
                "upload size limits must be greater than 0".into(),
            ));
        }

        if self.upload.max_image_dimension == 0 {
            return Err(ConfigError::Message(
                "max_image_dimension must be greater than 0".into(),
            ));
        }

        if !(1..=100).contains(&self.upload.jpeg_quality) {
            return Err(ConfigError::Message(
                "jpeg_quality must be between 1 and 100".into(),
            ));
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Get bind address and port as socket address
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn store_root_path(&self) -> PathBuf {
        PathBuf::from(&self.store_root)
    }

    pub fn staging_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.staging_dir)
    }

    /// Static mount without a trailing slash
    pub fn static_mount(&self) -> &str {
        self.static_mount.trim_end_matches('/')
    }

    /// Public URL for a store-relative path
    pub fn public_url(&self, relative_path: &str) -> String {
        format!(
            "{}/{}",
            self.public_url_base.trim_end_matches('/'),
            relative_path.trim_start_matches('/')
        )
    }

    pub fn dir_size_timeout(&self) -> Duration {
        Duration::from_secs(self.dir_size_timeout_secs)
    }
}

impl UploadConfig {
    /// Get maximum staged file size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    /// Get maximum document size in bytes
    pub fn max_document_size_bytes(&self) -> u64 {
        self.max_document_size_mb.saturating_mul(1024 * 1024)
    }
}
