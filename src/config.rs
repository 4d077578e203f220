//! Configuration file parser for `byline.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Environment variable that overrides `nonce_secret` from the file.
pub const NONCE_SECRET_ENV: &str = "BYLINE_NONCE_SECRET";

/// Category term IDs left out of the per-author listings unless configured
/// otherwise: the Chinese-language and "En Español" sections.
pub const DEFAULT_EXCLUDED_CATEGORIES: [i64; 2] = [75862, 9178];

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid site_url {0:?}: {1}")]
    InvalidSiteUrl(String, url::ParseError),

    #[error("No nonce secret configured: set BYLINE_NONCE_SECRET or nonce_secret in the config file")]
    MissingSecret,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `nonce_secret` to prevent secret leakage in logs.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind_addr: String,

    /// SQLite database holding the content tables and site options.
    pub database_path: String,

    /// Public site root; permalinks are `{site_url}?p={id}`.
    pub site_url: String,

    /// Content type that counts as an article.
    pub post_type: String,

    /// Category term IDs whose articles are left out of per-author listings.
    pub excluded_categories: Vec<i64>,

    /// Upper bound on one report's database work, in seconds.
    pub query_timeout_secs: u64,

    /// Lifetime of an issued anti-forgery token, in hours.
    pub nonce_lifetime_hours: u64,

    /// Key for anti-forgery tokens (alternative to BYLINE_NONCE_SECRET env var).
    /// Env var takes precedence over config file.
    pub nonce_secret: Option<String>,

    pub access: AccessConfig,
}

/// Who may view the report and change its range.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Header carrying the user name authenticated by the fronting proxy.
    pub user_header: String,

    /// User names allowed to manage the report. Empty means nobody.
    pub admins: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            user_header: "x-remote-user".to_string(),
            admins: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            database_path: "byline.db".to_string(),
            site_url: "http://localhost/".to_string(),
            post_type: "post".to_string(),
            excluded_categories: DEFAULT_EXCLUDED_CATEGORIES.to_vec(),
            query_timeout_secs: 10,
            nonce_lifetime_hours: 24,
            nonce_secret: None,
            access: AccessConfig::default(),
        }
    }
}

/// Mask nonce_secret in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("site_url", &self.site_url)
            .field("post_type", &self.post_type)
            .field("excluded_categories", &self.excluded_categories)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .field("nonce_lifetime_hours", &self.nonce_lifetime_hours)
            .field(
                "nonce_secret",
                &self.nonce_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("access", &self.access)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "bind_addr",
                "database_path",
                "site_url",
                "post_type",
                "excluded_categories",
                "query_timeout_secs",
                "nonce_lifetime_hours",
                "nonce_secret",
                "access",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            site_url = %config.site_url,
            admins = config.access.admins.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parsed `site_url`.
    pub fn site_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.site_url).map_err(|e| ConfigError::InvalidSiteUrl(self.site_url.clone(), e))
    }

    /// Nonce key: `BYLINE_NONCE_SECRET` if set and non-empty, else `nonce_secret`.
    pub fn nonce_secret(&self) -> Result<SecretString, ConfigError> {
        let from_env = std::env::var(NONCE_SECRET_ENV).ok().filter(|s| !s.is_empty());
        from_env
            .or_else(|| self.nonce_secret.clone().filter(|s| !s.is_empty()))
            .map(SecretString::from)
            .ok_or(ConfigError::MissingSecret)
    }
}

// ============================================================================
// Tests
// ============================================================================
