use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::detection::DetectorConfig;
use crate::document::SegmentationConfig;
use crate::pipeline::PipelineConfig;
use crate::providers::bible_api::DEFAULT_ENDPOINT;
use crate::scripture::NormalizerConfig;

/// Application configuration module
/// This module handles loading, validating and saving the `conf.json`
/// settings. Every field has a serde default, so a partial file is valid.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Where verse text comes from
    #[serde(default)]
    pub lookup: LookupConfig,

    #[serde(default)]
    pub scorer: ScorerConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Verse lookup backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupProvider {
    /// bible-api.com style HTTP service
    #[default]
    BibleApi,
    /// Local JSON map of reference to text
    JsonFile,
}

impl LookupProvider {
    pub fn display_name(&self) -> &str {
        match self {
            Self::BibleApi => "Bible API",
            Self::JsonFile => "JSON file",
        }
    }
}

impl std::fmt::Display for LookupProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BibleApi => write!(f, "bible_api"),
            Self::JsonFile => write!(f, "json_file"),
        }
    }
}

impl std::str::FromStr for LookupProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "bible_api" => Ok(Self::BibleApi),
            "json_file" => Ok(Self::JsonFile),
            _ => Err(anyhow!("Invalid lookup provider: {}", s)),
        }
    }
}

/// Verse lookup settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LookupConfig {
    #[serde(default)]
    pub provider: LookupProvider,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Translation requested when a candidate names none
    #[serde(default)]
    pub translation: Option<String>,

    /// Required for the `json_file` provider
    #[serde(default)]
    pub verses_file: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_retry_count")]
    pub max_retries: u32,

    /// Base backoff time, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub backoff_base_ms: u64,

    /// Requests per minute; none means unlimited
    #[serde(default)]
    pub rate_limit: Option<u32>,

    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            provider: LookupProvider::default(),
            endpoint: default_endpoint(),
            translation: None,
            verses_file: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_retry_count(),
            backoff_base_ms: default_retry_backoff_ms(),
            rate_limit: None,
            cache: default_true(),
        }
    }
}

/// Similarity scorer settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScorerConfig {
    /// Deadline for one similarity request
    #[serde(default = "default_scorer_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_scorer_timeout_ms(),
            max_concurrent_requests: default_concurrent_requests(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_scorer_timeout_ms() -> u64 {
    5000
}

fn default_concurrent_requests() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration from `path`, writing a default file there
    /// first if none exists.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .context(format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).context(format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.detector.validate().map_err(|e| anyhow!(e))?;
        self.segmentation.validate().map_err(|e| anyhow!(e))?;

        match self.lookup.provider {
            LookupProvider::BibleApi => {
                url::Url::parse(&self.lookup.endpoint)
                    .context(format!("Invalid lookup endpoint: {}", self.lookup.endpoint))?;
            }
            LookupProvider::JsonFile => {
                let file = self
                    .lookup
                    .verses_file
                    .as_ref()
                    .ok_or_else(|| anyhow!("lookup.verses_file is required for the json_file provider"))?;
                if !file.is_file() {
                    return Err(anyhow!("Verses file not found: {}", file.display()));
                }
            }
        }

        if self.lookup.timeout_secs == 0 || self.scorer.timeout_ms == 0 {
            return Err(anyhow!("Timeouts must be greater than zero"));
        }
        if self.scorer.max_concurrent_requests == 0 {
            return Err(anyhow!("scorer.max_concurrent_requests must be at least 1"));
        }

        Ok(())
    }

    /// Pipeline settings derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            normalizer: self.normalizer.clone(),
            detector: self.detector.clone(),
            segmentation: self.segmentation.clone(),
            translation: self.lookup.translation.clone(),
            // Cover every retry of the HTTP lookup, backoff included.
            lookup_timeout_ms: self.lookup.timeout_secs * 1000 * (self.lookup.max_retries as u64 + 1)
                + self.lookup.backoff_base_ms * ((1u64 << self.lookup.max_retries.min(16)) - 1),
            scorer_timeout_ms: self.scorer.timeout_ms,
            max_concurrent_requests: self.scorer.max_concurrent_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_partialJson_shouldFillDefaults() {
        let config: Config = serde_json::from_str(r#"{"segmentation": {"similarity_threshold": 0.2}}"#).unwrap();
        assert_eq!(config.segmentation.similarity_threshold, 0.2);
        assert_eq!(config.segmentation.min_sentences_per_paragraph, 3);
        assert_eq!(config.lookup.provider, LookupProvider::BibleApi);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_jsonProviderWithoutFile_shouldFail() {
        let mut config = Config::default();
        config.lookup.provider = LookupProvider::JsonFile;
        assert!(config.validate().is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        config.lookup.verses_file = Some(file.path().to_path_buf());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_outOfRangeThreshold_shouldFail() {
        let mut config = Config::default();
        config.detector.confidence_floor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_loadOrCreate_missingFile_shouldWriteDefaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.json");
        let config = Config::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.lookup.endpoint, DEFAULT_ENDPOINT);

        let reloaded = Config::load_or_create(&path).unwrap();
        assert_eq!(reloaded.detector.confidence_floor, config.detector.confidence_floor);
    }

    #[test]
    fn test_lookupProvider_fromStr_shouldAcceptDashes() {
        assert_eq!("json-file".parse::<LookupProvider>().unwrap(), LookupProvider::JsonFile);
        assert!("ollama".parse::<LookupProvider>().is_err());
    }
}
