//! Configuration for archive patching

use crate::compression::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{ArchiveError, ArchiveResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a replacement target is matched against entry paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMatch {
    /// Compare against the last `/` segment of each path
    #[default]
    BaseName,
    /// Compare against the whole path
    FullPath,
}

impl TargetMatch {
    /// Check whether `path` matches `target` under this mode
    pub fn matches(self, path: &str, target: &str) -> bool {
        match self {
            Self::BaseName => base_name(path) == target,
            Self::FullPath => path == target,
        }
    }
}

/// Last `/`-separated segment of a logical path
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Configuration for archive operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// How replacement targets are resolved
    pub target_match: TargetMatch,

    /// zlib level used when compressing replacement content (0-9)
    pub compression_level: u32,

    /// Refuse a replacement unless packing holds before and after it
    ///
    /// Off by default: the offset shift is applied whatever the layout, and
    /// callers run [`crate::check_packing`] themselves to decide how to proceed.
    pub verify_packing: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            target_match: TargetMatch::BaseName,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            verify_packing: false,
        }
    }
}

impl ArchiveConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target matching mode
    #[must_use]
    pub const fn with_target_match(mut self, target_match: TargetMatch) -> Self {
        self.target_match = target_match;
        self
    }

    /// Set the compression level
    #[must_use]
    pub const fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Enable or disable packing verification around replacements
    #[must_use]
    pub const fn with_verify_packing(mut self, enable: bool) -> Self {
        self.verify_packing = enable;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> ArchiveResult<()> {
        if self.compression_level > 9 {
            return Err(ArchiveError::Config(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> ArchiveResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ArchiveResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
