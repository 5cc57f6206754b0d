//! CLI configuration file (`sav.toml`)
//!
//! ```toml
//! [codec]
//! max_chunk_size = 131072
//! batch_size = 5000
//! compression_level = 6
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nether_sav::CodecConfig;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "sav.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub codec: CodecConfig,
}

/// Returns the platform-specific configuration directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.nethercore", "", "sav")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Load `explicit`, else `sav.toml` in the config directory, else defaults.
///
/// An explicit path must exist; the default location is optional.
pub fn load(explicit: Option<&Path>) -> Result<CliConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_dir().map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.exists() => path,
            _ => return Ok(CliConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: CliConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Codec overrides given on the command line
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct CodecOverrides {
    /// Uncompressed bytes per chunk
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// pathNames requested per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// zlib compression level (0-9)
    #[arg(long)]
    pub compression_level: Option<u32>,
}

impl CodecOverrides {
    pub fn apply(&self, mut codec: CodecConfig) -> CodecConfig {
        if let Some(max_chunk_size) = self.max_chunk_size {
            codec.max_chunk_size = max_chunk_size;
        }
        if let Some(batch_size) = self.batch_size {
            codec.batch_size = batch_size;
        }
        if let Some(level) = self.compression_level {
            codec.compression_level = level;
        }
        codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize_empty() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial_codec() {
        let config: CliConfig = toml::from_str(
            r#"
[codec]
max_chunk_size = 4096
"#,
        )
        .unwrap();
        assert_eq!(config.codec.max_chunk_size, 4096);
        assert_eq!(config.codec.batch_size, 5000); // default
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = CliConfig {
            codec: CodecConfig {
                max_chunk_size: 65_536,
                batch_size: 100,
                compression_level: 9,
            },
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[codec]\ncompression_level = 1\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.codec.compression_level, 1);
        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = CodecOverrides {
            max_chunk_size: Some(1024),
            batch_size: None,
            compression_level: Some(0),
        };
        let codec = overrides.apply(CodecConfig::default());
        assert_eq!(codec.max_chunk_size, 1024);
        assert_eq!(codec.batch_size, 5000);
        assert_eq!(codec.compression_level, 0);
    }
}
