//! Configuration management for s3test.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::quirk::Quirk;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "S3TEST_CONFIG";

/// Main configuration for the harness.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Console logging configuration.
    pub logging: LoggingConfig,
    /// Per-case diagnostics configuration.
    pub diagnostics: DiagnosticsConfig,
    /// Named targets that can be used instead of a URI.
    pub profiles: BTreeMap<String, Profile>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::Error::Io)?;
        Self::parse(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed.
    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration from `path`, or from the default location when none is given.
    ///
    /// An explicit path must exist. The default location
    /// (`$HOME/.config/s3test/config.toml`) is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config").join("s3test").join("config.toml"))
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }
}

/// A named target definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Endpoint URL, e.g. `http://localhost:9000`.
    pub endpoint: String,
    /// Bucket the cases run against.
    pub bucket: String,
    /// Signing region.
    pub region: String,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Optional session token for temporary credentials.
    pub session_token: Option<String>,
    /// Create the bucket before each case and delete it afterwards.
    pub create_bucket: bool,
    /// Address buckets by path instead of virtual host.
    pub path_style: bool,
    /// Known deviations of this server.
    pub quirks: Vec<Quirk>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: String::new(),
            region: crate::target::DEFAULT_REGION.to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            session_token: None,
            create_bucket: false,
            path_style: true,
            quirks: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::Pretty }
    }
}

/// Per-case diagnostics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Root directory for wire and error logs. Disabled when unset.
    pub log_dir: Option<PathBuf>,
    /// Filter directive selecting the events written to `wire.log`.
    pub wire_filter: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { log_dir: None, wire_filter: "s3test::wire=trace".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.diagnostics.log_dir.is_none());
        assert_eq!(config.diagnostics.wire_filter, "s3test::wire=trace");
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"
format = "json"

[diagnostics]
log_dir = "/tmp/s3test"

[profiles.minio]
endpoint = "http://localhost:9000"
bucket = "s3test"
access_key = "minioadmin"
secret_key = "minioadmin"
create_bucket = true
quirks = ["CHECKSUMS_NOT_SUPPORTED", "storage-class-not-kept"]
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.diagnostics.log_dir, Some(PathBuf::from("/tmp/s3test")));

        let profile = config.profile("minio").unwrap();
        assert_eq!(profile.bucket, "s3test");
        assert_eq!(profile.region, "us-east-1");
        assert!(profile.create_bucket);
        assert!(profile.path_style);
        assert_eq!(profile.quirks, vec![Quirk::ChecksumsNotSupported, Quirk::StorageClassNotKept]);
    }

    #[test]
    fn test_parse_unknown_quirk_in_profile() {
        let toml = r#"
[profiles.broken]
quirks = ["NOPE"]
"#;
        let err = Config::parse(toml).unwrap_err();
        assert!(err.to_string().contains("unknown quirk"));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"info\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
