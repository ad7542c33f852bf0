//! Client configuration
//!
//! A [`Configuration`] is resolved once per client from three layers, later
//! layers winning:
//!
//! 1. built-in defaults
//! 2. `MSX_*` environment variables
//! 3. explicit [`ConfigOverrides`] (constructed in code or parsed from TOML)
//!
//! The resolved value is immutable; construct a new client to change it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::msx_api::types::MsxError;

/// Prefix shared by every environment variable the SDK reads
pub const ENV_PREFIX: &str = "MSX_";

pub const DEFAULT_BASE_URL: &str = "https://api.mosaics.ai";
pub const DEFAULT_ORG_HEADER: &str = "X-Org-Id";
pub const DEFAULT_ALLOWED_READ_EXTS: [&str; 3] = [".csv", ".parquet", ".json"];
/// 1 GiB
pub const DEFAULT_MIN_STREAM_SIZE: u64 = 1024 * 1024 * 1024;

/// Resolved SDK configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Platform API base URL, without a trailing slash
    pub base_url: String,
    /// Name of the organization scoping header
    pub org_header: String,
    pub org_id: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    /// Scratch directory for dataset work
    pub temp_dir: PathBuf,
    /// Dataset file extensions accepted for upload, with leading dot
    pub allowed_read_exts: Vec<String>,
    /// Dataset files at least this large (bytes) are streamed from disk
    pub min_stream_size: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            org_header: DEFAULT_ORG_HEADER.to_string(),
            org_id: None,
            email: None,
            password: None,
            token: None,
            temp_dir: std::env::temp_dir(),
            allowed_read_exts: DEFAULT_ALLOWED_READ_EXTS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            min_stream_size: DEFAULT_MIN_STREAM_SIZE,
        }
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("base_url", &self.base_url)
            .field("org_header", &self.org_header)
            .field("org_id", &self.org_id)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("temp_dir", &self.temp_dir)
            .field("allowed_read_exts", &self.allowed_read_exts)
            .field("min_stream_size", &self.min_stream_size)
            .finish()
    }
}

/// Explicit configuration overrides
///
/// Every field is optional; set fields replace whatever the defaults and
/// environment produced.
///
/// ```
/// use msx_sdk::config::ConfigOverrides;
///
/// let overrides = ConfigOverrides::from_toml_str(r#"
///     base_url = "http://localhost:8080"
///     allowed_read_exts = [".csv"]
/// "#).unwrap();
/// assert_eq!(overrides.base_url.as_deref(), Some("http://localhost:8080"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub org_header: Option<String>,
    pub org_id: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub temp_dir: Option<PathBuf>,
    pub allowed_read_exts: Option<Vec<String>>,
    pub min_stream_size: Option<u64>,
}

impl ConfigOverrides {
    /// Parse overrides from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, MsxError> {
        toml::from_str(content)
            .map_err(|e| MsxError::Config(format!("Failed to parse overrides: {}", e)))
    }
}

impl Configuration {
    /// Resolve configuration from defaults and the process environment
    pub fn from_env() -> Result<Self, MsxError> {
        Self::resolve(&ConfigOverrides::default())
    }

    /// Resolve configuration from defaults, the process environment and `overrides`
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, MsxError> {
        Self::resolve_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolve configuration using `lookup` in place of the process environment
    ///
    /// `lookup` receives full variable names such as `MSX_BASE_URL`.
    pub fn resolve_with<F>(lookup: F, overrides: &ConfigOverrides) -> Result<Self, MsxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_env(&lookup)?;
        config.apply_overrides(overrides.clone());
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.allowed_read_exts = config
            .allowed_read_exts
            .iter()
            .map(|ext| normalize_extension(ext))
            .collect();

        tracing::debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), MsxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|value| !value.is_empty())
        };

        if let Some(base_url) = var("BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(org_header) = var("ORG_HEADER") {
            self.org_header = org_header;
        }
        if let Some(org_id) = var("ORG_ID") {
            self.org_id = Some(org_id);
        }
        if let Some(email) = var("EMAIL") {
            self.email = Some(email);
        }
        if let Some(password) = var("PASSWORD") {
            self.password = Some(password);
        }
        if let Some(token) = var("TOKEN") {
            self.token = Some(token);
        }
        if let Some(temp_dir) = var("TEMP_DIR") {
            self.temp_dir = PathBuf::from(temp_dir);
        }
        if let Some(exts) = var("ALLOWED_READ_EXTS") {
            self.allowed_read_exts = exts
                .split(',')
                .map(str::trim)
                .filter(|ext| !ext.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(size) = var("MIN_STREAM_SIZE") {
            self.min_stream_size = size.trim().parse().map_err(|e| {
                MsxError::Config(format!(
                    "{}MIN_STREAM_SIZE must be a byte count, got '{}': {}",
                    ENV_PREFIX, size, e
                ))
            })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            base_url,
            org_header,
            org_id,
            email,
            password,
            token,
            temp_dir,
            allowed_read_exts,
            min_stream_size,
        } = overrides;

        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(org_header) = org_header {
            self.org_header = org_header;
        }
        if org_id.is_some() {
            self.org_id = org_id;
        }
        if email.is_some() {
            self.email = email;
        }
        if password.is_some() {
            self.password = password;
        }
        if token.is_some() {
            self.token = token;
        }
        if let Some(temp_dir) = temp_dir {
            self.temp_dir = temp_dir;
        }
        if let Some(exts) = allowed_read_exts {
            self.allowed_read_exts = exts;
        }
        if let Some(size) = min_stream_size {
            self.min_stream_size = size;
        }
    }

    /// Whether a dataset file extension (with or without leading dot) may be uploaded
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = normalize_extension(ext);
        self.allowed_read_exts.iter().any(|allowed| *allowed == ext)
    }
}

/// Lower-case an extension and make sure it carries a leading dot
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
