// In: src/config.rs

//! The single source of truth for JONX codec configuration.
//!
//! `JonxConfig` is created once at the application boundary (a front end's
//! settings, a JSON document, or `JonxConfig::default()`) and passed by reference
//! into every encode, decode and preview call. There is no process-wide
//! compressor: the estimate path and the real encoder read the compression
//! level from the same value, so their sizes always agree.

use serde::{Deserialize, Serialize};

use crate::error::{JonxError, Result};

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// Defines the trade-off between compression speed and final container size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionProfile {
    /// Prioritizes speed over size (zstd level 3).
    Fast,

    /// The level the container format has always been written with (zstd level 7).
    #[default]
    Balanced,

    /// Prioritizes the smallest container at the cost of CPU time (zstd level 19).
    HighCompression,
}

impl CompressionProfile {
    /// The zstd level this profile resolves to.
    pub fn zstd_level(self) -> i32 {
        match self {
            CompressionProfile::Fast => 3,
            CompressionProfile::Balanced => 7,
            CompressionProfile::HighCompression => 19,
        }
    }
}

//==================================================================================
// II. The Unified JonxConfig
//==================================================================================

/// The unified configuration for encoding, decoding and previewing containers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct JonxConfig {
    /// The profile guiding the compression/speed trade-off.
    #[serde(default)]
    pub profile: CompressionProfile,

    /// An explicit zstd level. When set, it overrides `profile`.
    #[serde(default)]
    pub compression_level: Option<i32>,

    /// If true, a sort index is written for every numeric column.
    #[serde(default = "default_true")]
    pub build_indexes: bool,

    /// If true, per-column packing and compression run on the rayon pool.
    /// The output bytes are identical either way.
    #[serde(default)]
    pub parallel_columns: bool,
}

impl Default for JonxConfig {
    fn default() -> Self {
        Self {
            profile: CompressionProfile::default(),
            compression_level: None,
            build_indexes: true,
            parallel_columns: false,
        }
    }
}

impl JonxConfig {
    /// Parses a configuration from a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: JonxConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy of this config that uses the given profile.
    pub fn with_profile(mut self, profile: CompressionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Returns a copy of this config with an explicit zstd level.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// The effective zstd level.
    pub fn zstd_level(&self) -> i32 {
        self.compression_level
            .unwrap_or_else(|| self.profile.zstd_level())
    }

    /// Checks that the effective level is one zstd accepts.
    pub fn validate(&self) -> Result<()> {
        let level = self.zstd_level();
        let range = zstd::compression_level_range();
        if !range.contains(&level) {
            return Err(JonxError::InvalidInput(format!(
                "Compression level {} is outside the supported range {}..={}",
                level,
                range.start(),
                range.end()
            )));
        }
        Ok(())
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_matches_balanced_profile() {
        let config = JonxConfig::default();
        assert_eq!(config.zstd_level(), 7);
        assert!(config.build_indexes);
        assert!(!config.parallel_columns);
    }

    #[test]
    fn test_explicit_level_overrides_profile() {
        let config = JonxConfig::default()
            .with_profile(CompressionProfile::HighCompression)
            .with_compression_level(5);
        assert_eq!(config.zstd_level(), 5);
    }

    #[test]
    fn test_from_json_str_fills_defaults() {
        let config = JonxConfig::from_json_str(r#"{"profile": "fast"}"#).unwrap();
        assert_eq!(config.profile, CompressionProfile::Fast);
        assert_eq!(config.zstd_level(), 3);
        assert!(config.build_indexes);
    }

    #[test]
    fn test_out_of_range_level_is_rejected() {
        let result = JonxConfig::from_json_str(r#"{"compression_level": 1000}"#);
        assert!(matches!(result, Err(JonxError::InvalidInput(_))));
    }
}
