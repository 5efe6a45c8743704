//! Clipscout - find the moments of a video worth your time
//!
//! This library downloads the audio track of a video (YouTube, Twitter/X, direct
//! media URLs, or local files), sends it to AssemblyAI for transcription with
//! topic detection and sentiment analysis, and ranks the returned segments
//! against user-supplied topic/sentiment preferences.

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod matcher;
pub mod output;
pub mod utils;

pub use analysis::{Analysis, AnalysisPipeline, Segment, Sentiment};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{AudioInfo, MediaExtractor};
pub use matcher::{rank, MatchWeights, Preference, Recommendation};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error conditions raised by the clipscout pipeline
#[derive(thiserror::Error, Debug)]
pub enum ClipscoutError {
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Audio download failed: {0}")]
    DownloadFailed(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Analysis timed out after {attempts} status checks (~{waited_secs}s)")]
    AnalysisTimeout { attempts: u32, waited_secs: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
