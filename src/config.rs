//! Configuration types.
//!
//! Everything here deserializes from TOML. Sizes accept human-readable
//! strings such as `"64KB"` or `"1MB"` as well as plain integers.
//!
//! ```toml
//! [fileset]
//! buffer_size = "256KB"
//! thread_name = "merge-io"
//!
//! [scan]
//! chunk_size = "4KB"
//! mode = "per-file"
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

use crate::fileset::{DEFAULT_BUFFER_SIZE, DEFAULT_THREAD_NAME, FilesetBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fileset settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesetConfig {
    /// Size of each buffer. Every file gets two.
    #[serde(
        default = "FilesetConfig::default_buffer_size",
        deserialize_with = "deserialize_size"
    )]
    pub buffer_size: usize,

    /// Name of the background I/O thread.
    #[serde(default = "FilesetConfig::default_thread_name")]
    pub thread_name: String,
}

impl Default for FilesetConfig {
    fn default() -> Self {
        Self {
            buffer_size: Self::default_buffer_size(),
            thread_name: Self::default_thread_name(),
        }
    }
}

impl FilesetConfig {
    fn default_buffer_size() -> usize {
        DEFAULT_BUFFER_SIZE
    }

    fn default_thread_name() -> String {
        DEFAULT_THREAD_NAME.to_string()
    }

    /// Check the settings without creating anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "fileset.buffer_size must be non-zero".to_string(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::Invalid(
                "fileset.thread_name must not contain NUL".to_string(),
            ));
        }
        Ok(())
    }

    /// A builder carrying these settings.
    pub fn builder(&self) -> FilesetBuilder {
        FilesetBuilder::new()
            .buffer_size(self.buffer_size)
            .thread_name(self.thread_name.clone())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (overridden by `RUST_LOG`).
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Include the event target (module path).
    #[serde(default)]
    pub target: bool,

    /// Include thread names.
    #[serde(default = "default_true")]
    pub thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: LogFormat::default(),
            timestamps: true,
            target: false,
            thread_names: true,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

fn default_true() -> bool {
    true
}

/// How the scan tool drives its consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// One consumer thread per file.
    #[default]
    PerFile,
    /// A single thread reading one chunk from each file in turn.
    RoundRobin,
}

/// Scan tool consumer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanSection {
    /// Bytes requested per read call.
    #[serde(
        default = "ScanSection::default_chunk_size",
        deserialize_with = "deserialize_size"
    )]
    pub chunk_size: usize,

    /// Consumer layout.
    #[serde(default)]
    pub mode: ScanMode,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            mode: ScanMode::default(),
        }
    }
}

impl ScanSection {
    fn default_chunk_size() -> usize {
        64 * 1024
    }
}

/// Top-level configuration for the `dbufio-scan` tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub fileset: FilesetConfig,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScanConfig {
    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fileset.validate()?;
        if self.scan.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "scan.chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Deserialize a size from an integer or a string such as "1MB".
fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Bytes(usize),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Bytes(n) => Ok(n),
        Size::Text(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a size string like "1GB", "512MB", "4KB" into bytes.
///
/// Units are binary. A fractional count is accepted only when it names a
/// whole number of bytes ("1.5K" is 1536, "1.5B" is an error).
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".to_string());
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num_str, suffix) = s.split_at(num_end);

    let shift = match suffix.trim().to_uppercase().as_str() {
        "" | "B" => 0,
        "KB" | "K" | "KIB" => 10,
        "MB" | "M" | "MIB" => 20,
        "GB" | "G" | "GIB" => 30,
        "TB" | "T" | "TIB" => 40,
        other => return Err(format!("unknown size suffix '{other}'")),
    };

    let (whole, frac) = num_str.split_once('.').unwrap_or((num_str, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(format!("invalid number '{num_str}'"));
    }

    let too_large = || format!("size '{s}' does not fit in memory");
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| too_large())?
    };

    // Exact fixed-point arithmetic: value = (whole + frac / 10^k) << shift.
    let digits = frac.len() as u32;
    if digits > 30 {
        return Err(format!("too many decimal places in '{num_str}'"));
    }
    let scale = 10u128.pow(digits);
    let frac: u128 = if frac.is_empty() {
        0
    } else {
        frac.parse().map_err(|_| format!("invalid number '{num_str}'"))?
    };

    let scaled = whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac))
        .and_then(|n| n.checked_mul(1u128 << shift))
        .ok_or_else(too_large)?;
    if scaled % scale != 0 {
        return Err(format!("size '{s}' is not a whole number of bytes"));
    }
    usize::try_from(scaled / scale).map_err(|_| too_large())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096"), Ok(4096));
        assert_eq!(parse_size("4KB"), Ok(4096));
        assert_eq!(parse_size("1mb"), Ok(1024 * 1024));
        assert_eq!(parse_size(" 2 MiB "), Ok(2 * 1024 * 1024));
        assert_eq!(parse_size("1.5K"), Ok(1536));
        assert_eq!(parse_size("2TB"), Ok(2 << 40));
        assert_eq!(parse_size(".5K"), Ok(512));
        assert!(parse_size("").is_err());
        assert!(parse_size("12XB").is_err());
        assert!(parse_size("KB").is_err());
        assert!(parse_size(".").is_err());
        assert!(parse_size("1.2.3K").is_err());
    }

    #[test]
    fn test_parse_size_rejects_partial_bytes() {
        assert!(parse_size("1.5").is_err());
        assert!(parse_size("0.3K").is_err());
        assert_eq!(parse_size("0.25K"), Ok(256));
    }

    #[test]
    fn test_parse_size_rejects_overflow() {
        assert!(parse_size("99999999999999999999999999999999999999999").is_err());
        assert!(parse_size("18446744073709551616").is_err());
        assert!(parse_size("99999999999TB").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::parse("").unwrap();
        assert_eq!(config.fileset.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.fileset.thread_name, DEFAULT_THREAD_NAME);
        assert_eq!(config.scan.chunk_size, 64 * 1024);
        assert_eq!(config.scan.mode, ScanMode::PerFile);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_parse_full() {
        let config = ScanConfig::parse(
            r#"
            [fileset]
            buffer_size = "256KB"
            thread_name = "merge-io"

            [scan]
            chunk_size = 100
            mode = "round-robin"

            [logging]
            level = "debug"
            format = "json"
            timestamps = false
            "#,
        )
        .unwrap();

        assert_eq!(config.fileset.buffer_size, 256 * 1024);
        assert_eq!(config.fileset.thread_name, "merge-io");
        assert_eq!(config.scan.chunk_size, 100);
        assert_eq!(config.scan.mode, ScanMode::RoundRobin);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.logging.timestamps);
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let err = ScanConfig::parse("[fileset]\nbuffer_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ScanConfig::parse("[scan]\nchunk_size = \"0KB\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_size() {
        let err = ScanConfig::parse("[fileset]\nbuffer_size = \"lots\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_builder_from_config() {
        let config = FilesetConfig {
            buffer_size: 16,
            thread_name: "cfg-io".to_string(),
        };
        let fileset = config
            .builder()
            .build(vec![std::io::Cursor::new(b"hello".to_vec())])
            .unwrap();
        assert_eq!(fileset.buffer_size(), 16);
        fileset.destroy().unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScanConfig::load("/nonexistent/dbufio.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
