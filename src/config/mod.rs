use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analysis::client::DEFAULT_BASE_URL;
use crate::analysis::poll::PollPolicy;
use crate::matcher::MatchWeights;
use crate::ClipscoutError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// AssemblyAI API configuration
    pub api: ApiConfig,

    /// Segment ranking configuration
    pub matching: MatchingConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL
    pub base_url: String,

    /// API key; the --api-key flag and ASSEMBLYAI_API_KEY take precedence
    pub api_key: Option<String>,

    /// Seconds to wait before the first status check
    pub poll_initial_interval_secs: u64,

    /// Upper bound on the interval between status checks
    pub poll_max_interval_secs: u64,

    /// Status checks before giving up on a transcript
    pub poll_max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Weight of the topic term in segment scores
    pub topic_weight: f64,

    /// Weight of the sentiment term in segment scores
    pub sentiment_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Keep audio files after analysis
    pub keep_audio: bool,

    /// Reuse analyses for already-seen audio content
    pub cache_enabled: bool,

    /// Default output format
    pub default_output_format: String,
}

impl Default for Config {
    fn default() -> Self {
        let weights = MatchWeights::default();
        let poll = PollPolicy::default();

        Self {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key: None,
                poll_initial_interval_secs: poll.initial_interval_secs,
                poll_max_interval_secs: poll.max_interval_secs,
                poll_max_attempts: poll.max_attempts,
            },
            matching: MatchingConfig {
                topic_weight: weights.topic_weight,
                sentiment_weight: weights.sentiment_weight,
            },
            app: AppConfig {
                keep_audio: false,
                cache_enabled: true,
                default_output_format: "text".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("clipscout").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(ClipscoutError::Config("API base URL must not be empty".into()).into());
        }

        if self.api.poll_max_attempts == 0 {
            return Err(
                ClipscoutError::Config("poll_max_attempts must be at least 1".into()).into(),
            );
        }

        self.match_weights().validate()?;

        Ok(())
    }

    /// Resolve the API key: flag/environment first, then the config file
    pub fn resolve_api_key(&self, cli_key: Option<String>) -> Result<String> {
        if let Some(key) = cli_key.filter(|k| !k.trim().is_empty()) {
            return Ok(key);
        }

        if let Some(key) = self.api.api_key.clone().filter(|k| !k.trim().is_empty()) {
            return Ok(key);
        }

        Err(ClipscoutError::Config(
            "No API key configured. Pass --api-key, set ASSEMBLYAI_API_KEY, or add it to the config file.".into(),
        )
        .into())
    }

    /// Polling behavior for transcript status checks
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_interval_secs: self.api.poll_initial_interval_secs,
            max_interval_secs: self.api.poll_max_interval_secs,
            max_attempts: self.api.poll_max_attempts,
        }
    }

    /// Score weights for the segment ranking
    pub fn match_weights(&self) -> MatchWeights {
        MatchWeights {
            topic_weight: self.matching.topic_weight,
            sentiment_weight: self.matching.sentiment_weight,
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  API Base URL: {}", self.api.base_url);
        println!(
            "  API Key: {}",
            if self.api.api_key.is_some() {
                "configured"
            } else {
                "not set"
            }
        );
        println!(
            "  Polling: every {}-{}s, up to {} checks",
            self.api.poll_initial_interval_secs,
            self.api.poll_max_interval_secs,
            self.api.poll_max_attempts
        );
        println!(
            "  Match Weights: topic {}, sentiment {}",
            self.matching.topic_weight, self.matching.sentiment_weight
        );
        println!("  Keep Audio: {}", self.app.keep_audio);
        println!("  Cache Enabled: {}", self.app.cache_enabled);
        println!("  Default Format: {}", self.app.default_output_format);
    }
}
