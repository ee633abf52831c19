//! Configuration management.
//!
//! Configuration is a YAML file resolved in three explicit steps:
//!
//! 1. the document is parsed into a [`serde_yaml::Value`] tree;
//! 2. `${VAR}` and `${VAR:-default}` placeholders in string values are
//!    substituted from an injectable environment lookup;
//! 3. the tree is deserialized into a [`FileConfig`] (every field optional)
//!    and merged over the built-in defaults into a validated [`Config`].
//!
//! Credentials never live in the file. They are read from the process
//! environment by [`credentials_from_env`].

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use svctag_core::CsvEncoding;
use svctag_fetch::{Backoff, Credentials, FetchSettings, RetryStrategy, TlsPolicy};
use tracing::{debug, info};

use crate::cache::DEFAULT_CACHE_TTL;
use crate::error::StoreError;

// ============================================================================
// Defaults
// ============================================================================

/// Production entitlement API base URL.
pub const DEFAULT_BASE_URL: &str = "https://apigtwb2c.us.dell.com/PROD/sbil/eapi/v5";

/// Production OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://apigtwb2c.us.dell.com/auth/oauth/v2/token";

/// Environment variable holding the client identifier.
pub const CLIENT_ID_VAR: &str = "DELL_API_CLIENT_ID";

/// Environment variable holding the client secret.
pub const CLIENT_SECRET_VAR: &str = "DELL_API_CLIENT_SECRET";

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "svctag.yaml";

const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: f64 = 5.0;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex")
});

// ============================================================================
// File Config (as written)
// ============================================================================

/// Configuration as written in YAML. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Remote API endpoints.
    pub api: ApiSection,
    /// Transport settings.
    pub http: HttpSection,
    /// Response cache settings.
    pub cache: CacheSection,
    /// CSV import/export settings.
    pub csv: CsvSection,
    /// Batch processing settings.
    pub batch: BatchSection,
    /// REST server settings.
    pub server: ServerSection,
}

/// `api:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSection {
    /// Entitlement API base URL.
    pub base_url: Option<String>,
    /// OAuth2 token endpoint.
    pub token_url: Option<String>,
}

/// `http:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSection {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: Option<f64>,
    /// Retry policy.
    pub retry: RetrySection,
    /// TLS policy.
    pub tls: TlsSection,
}

/// `http.retry:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    /// Total attempts including the first.
    pub max_attempts: Option<u32>,
    /// Base delay in seconds.
    pub delay_secs: Option<f64>,
    /// `fixed` or `linear`.
    pub backoff: Option<Backoff>,
}

/// TLS verification mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Verify server certificates.
    #[default]
    Verify,
    /// Accept any certificate.
    Insecure,
}

/// `http.tls:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsSection {
    /// Verification mode.
    pub mode: Option<TlsMode>,
    /// Extra trusted roots (PEM).
    pub ca_bundle: Option<PathBuf>,
}

/// `cache:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    /// Entry lifetime in seconds. `0` disables the cache.
    pub ttl_secs: Option<u64>,
}

/// `csv:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvSection {
    /// Output delimiter, one ASCII character. `\t` is accepted for tab.
    pub delimiter: Option<String>,
    /// Output encoding.
    pub encoding: Option<CsvEncoding>,
}

/// `batch:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSection {
    /// Concurrent lookups.
    pub concurrency: Option<usize>,
}

/// `server:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
}

// ============================================================================
// Resolved Config
// ============================================================================

/// Fully resolved, validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Entitlement API base URL, without trailing slash.
    pub base_url: String,
    /// OAuth2 token endpoint.
    pub token_url: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Base retry delay.
    pub retry_delay: Duration,
    /// Retry delay growth.
    pub backoff: Backoff,
    /// TLS verification mode.
    pub tls_mode: TlsMode,
    /// Extra trusted roots.
    pub ca_bundle: Option<PathBuf>,
    /// Response cache TTL. Zero disables caching.
    pub cache_ttl: Duration,
    /// CSV output delimiter.
    pub csv_delimiter: u8,
    /// CSV output encoding.
    pub csv_encoding: CsvEncoding,
    /// Concurrent lookups in a batch.
    pub concurrency: usize,
    /// REST server bind host.
    pub server_host: String,
    /// REST server bind port.
    pub server_port: u16,
    /// File the configuration was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_secs_f64(DEFAULT_RETRY_DELAY_SECS),
            backoff: Backoff::Fixed,
            tls_mode: TlsMode::Verify,
            ca_bundle: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            csv_delimiter: b',',
            csv_encoding: CsvEncoding::Utf8,
            concurrency: DEFAULT_CONCURRENCY,
            server_host: DEFAULT_HOST.to_string(),
            server_port: DEFAULT_PORT,
            source: None,
        }
    }
}

impl Config {
    /// Returns the per-user config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("svctag").join("config.yaml"))
    }

    /// Finds the config file to load.
    ///
    /// Order: `explicit`, then `./svctag.yaml`, then the per-user path.
    /// An explicit path that does not exist is an error; the implicit
    /// locations are simply skipped.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>, StoreError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(StoreError::NotFound(path.to_path_buf()));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok(Some(local));
        }

        Ok(Self::default_path().filter(|p| p.exists()))
    }

    /// Loads configuration using the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, StoreError> {
        Self::load_with_env(explicit, &process_env)
    }

    /// Loads configuration with an injectable environment lookup.
    pub fn load_with_env(
        explicit: Option<&Path>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        let Some(path) = Self::locate(explicit)? else {
            debug!("No config file found, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path)?;
        let mut config = Self::from_yaml_str(&content, env)?;
        config.source = Some(path);

        info!(path = ?config.source, "Loaded configuration");
        Ok(config)
    }

    /// Parses and resolves a YAML document.
    pub fn from_yaml_str(
        content: &str,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        // An empty document means "all defaults".
        let mut tree: Value = serde_yaml::from_str(content)?;
        if tree.is_null() {
            tree = Value::Mapping(serde_yaml::Mapping::new());
        }
        resolve_placeholders(&mut tree, env)?;
        let file: FileConfig = serde_yaml::from_value(tree)?;
        Self::from_file(file)
    }

    /// Merges a file config over the defaults and validates the result.
    pub fn from_file(file: FileConfig) -> Result<Self, StoreError> {
        let defaults = Self::default();

        let base_url = file.api.base_url.unwrap_or(defaults.base_url);
        let base_url = validate_url("api.base_url", &base_url)?
            .trim_end_matches('/')
            .to_string();
        let token_url = file.api.token_url.unwrap_or(defaults.token_url);
        validate_url("api.token_url", &token_url)?;

        let timeout = match file.http.timeout_secs {
            Some(secs) => seconds("http.timeout_secs", secs)?,
            None => defaults.timeout,
        };
        if timeout.is_zero() {
            return Err(StoreError::Config(
                "http.timeout_secs must be greater than zero".to_string(),
            ));
        }

        let max_attempts = file.http.retry.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(StoreError::Config(
                "http.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        let retry_delay = match file.http.retry.delay_secs {
            Some(secs) => seconds("http.retry.delay_secs", secs)?,
            None => defaults.retry_delay,
        };

        let concurrency = file.batch.concurrency.unwrap_or(defaults.concurrency);
        if concurrency == 0 {
            return Err(StoreError::Config(
                "batch.concurrency must be at least 1".to_string(),
            ));
        }

        let csv_delimiter = match file.csv.delimiter.as_deref() {
            Some(raw) => parse_delimiter(raw)?,
            None => defaults.csv_delimiter,
        };

        Ok(Self {
            base_url,
            token_url,
            timeout,
            max_attempts,
            retry_delay,
            backoff: file.http.retry.backoff.unwrap_or(defaults.backoff),
            tls_mode: file.http.tls.mode.unwrap_or(defaults.tls_mode),
            ca_bundle: file.http.tls.ca_bundle,
            cache_ttl: file
                .cache
                .ttl_secs
                .map_or(defaults.cache_ttl, Duration::from_secs),
            csv_delimiter,
            csv_encoding: file.csv.encoding.unwrap_or(defaults.csv_encoding),
            concurrency,
            server_host: file.server.host.unwrap_or(defaults.server_host),
            server_port: file.server.port.unwrap_or(defaults.server_port),
            source: None,
        })
    }

    /// Converts back to the file representation, fully populated.
    pub fn to_file_config(&self) -> FileConfig {
        FileConfig {
            api: ApiSection {
                base_url: Some(self.base_url.clone()),
                token_url: Some(self.token_url.clone()),
            },
            http: HttpSection {
                timeout_secs: Some(self.timeout.as_secs_f64()),
                retry: RetrySection {
                    max_attempts: Some(self.max_attempts),
                    delay_secs: Some(self.retry_delay.as_secs_f64()),
                    backoff: Some(self.backoff),
                },
                tls: TlsSection {
                    mode: Some(self.tls_mode),
                    ca_bundle: self.ca_bundle.clone(),
                },
            },
            cache: CacheSection {
                ttl_secs: Some(self.cache_ttl.as_secs()),
            },
            csv: CsvSection {
                delimiter: Some(display_delimiter(self.csv_delimiter)),
                encoding: Some(self.csv_encoding),
            },
            batch: BatchSection {
                concurrency: Some(self.concurrency),
            },
            server: ServerSection {
                host: Some(self.server_host.clone()),
                port: Some(self.server_port),
            },
        }
    }

    /// Renders the resolved configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, StoreError> {
        Ok(serde_yaml::to_string(&self.to_file_config())?)
    }

    /// Returns the TLS policy.
    pub fn tls_policy(&self) -> TlsPolicy {
        match self.tls_mode {
            TlsMode::Verify => TlsPolicy::Verify {
                ca_bundle: self.ca_bundle.clone(),
            },
            TlsMode::Insecure => TlsPolicy::Insecure,
        }
    }

    /// Returns the retry policy.
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.max_attempts)
            .with_delay(self.retry_delay)
            .with_backoff(self.backoff)
    }

    /// Returns transport settings.
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings::default()
            .with_timeout(self.timeout)
            .with_retry(self.retry_strategy())
            .with_tls(self.tls_policy())
    }

    /// Returns the REST server bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Reads a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Loads `.env` from the working directory (or a parent) into the process
/// environment. Variables already set are left untouched.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded .env");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable .env");
            None
        }
    }
}

/// Reads API credentials from `env`.
pub fn credentials_from_env(
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Credentials, StoreError> {
    let read = |name: &str| {
        env(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| StoreError::MissingCredential(name.to_string()))
    };
    Ok(Credentials::new(read(CLIENT_ID_VAR)?, read(CLIENT_SECRET_VAR)?))
}

/// Substitutes `${VAR}` and `${VAR:-default}` in every string of `value`.
///
/// A string that is exactly one placeholder is re-read as a YAML scalar, so
/// `port: ${PORT:-5000}` yields a number.
pub fn resolve_placeholders(
    value: &mut Value,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<(), StoreError> {
    match value {
        Value::String(s) => {
            if !s.contains("${") {
                return Ok(());
            }
            let whole = PLACEHOLDER
                .find(s)
                .is_some_and(|m| m.start() == 0 && m.end() == s.len());
            let substituted = substitute(s, env)?;
            *value = if whole {
                serde_yaml::from_str::<Value>(&substituted)
                    .ok()
                    .filter(|v| !matches!(v, Value::Mapping(_) | Value::Sequence(_)))
                    .unwrap_or(Value::String(substituted))
            } else {
                Value::String(substituted)
            };
        }
        Value::Sequence(items) => {
            for item in items {
                resolve_placeholders(item, env)?;
            }
        }
        Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                resolve_placeholders(item, env)?;
            }
        }
        Value::Tagged(tagged) => resolve_placeholders(&mut tagged.value, env)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

fn substitute(input: &str, env: &dyn Fn(&str) -> Option<String>) -> Result<String, StoreError> {
    let mut missing = None;
    let out = PLACEHOLDER.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        match (env(name), caps.get(2)) {
            (Some(v), _) => v,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(StoreError::UndefinedVariable(name)),
        None => Ok(out.into_owned()),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn validate_url<'a>(field: &str, raw: &'a str) -> Result<&'a str, StoreError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| StoreError::Config(format!("{field}: invalid URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(StoreError::Config(format!(
            "{field}: unsupported scheme '{}'",
            parsed.scheme()
        )));
    }
    Ok(raw)
}

fn seconds(field: &str, secs: f64) -> Result<Duration, StoreError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| StoreError::Config(format!("{field}: invalid duration {secs}")))
}

/// Parses a one-character delimiter. Accepts the escape `\t` and the word
/// `tab`.
pub fn parse_delimiter(raw: &str) -> Result<u8, StoreError> {
    match raw {
        "\\t" | "\t" | "tab" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        s => Err(StoreError::Config(format!(
            "csv.delimiter must be a single ASCII character, got '{s}'"
        ))),
    }
}

fn display_delimiter(delimiter: u8) -> String {
    if delimiter == b'\t' {
        "\\t".to_string()
    } else {
        char::from(delimiter).to_string()
    }
}
