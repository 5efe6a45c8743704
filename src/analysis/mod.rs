use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::TempDir;
use uuid::Uuid;

use crate::cache::AnalysisCache;
use crate::config::Config;
use crate::extractors::{AudioInfo, ExtractorRegistry};
use crate::ClipscoutError;

pub mod assemble;
pub mod client;
pub mod poll;
pub mod response;

use client::AssemblyAiClient;

/// Sentiment polarity of a segment or preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl FromStr for Sentiment {
    type Err = ClipscoutError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(ClipscoutError::InvalidInput(format!(
                "unknown sentiment '{other}', expected one of: positive, negative, neutral"
            ))),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A topic detected in a segment, with the service's relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicLabel {
    /// Taxonomy label, e.g. "Technology&Computing>ArtificialIntelligence"
    pub label: String,

    /// Relevance score (0.0 to 1.0)
    pub relevance: f64,
}

/// Dominant sentiment of a segment with its vote share
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: Sentiment,

    /// Share of the sentiment vote won by the label (0.0 to 1.0)
    pub confidence: f64,
}

/// A contiguous stretch of the audio with its detected topics and sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in milliseconds
    pub start_ms: u64,

    /// End offset in milliseconds
    pub end_ms: u64,

    /// Chapter summary, or the span text when built from topic spans
    pub text: String,

    /// Detected topics, ordered by descending relevance
    pub topics: Vec<TopicLabel>,

    /// Dominant sentiment over the segment
    pub sentiment: SentimentScore,
}

/// Metadata about the analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Remote transcript ID
    pub transcript_id: String,

    /// Audio duration in seconds, as reported by the service
    pub audio_duration_secs: Option<f64>,

    /// Wall-clock time spent on upload and polling, in seconds
    pub processing_duration_secs: Option<f64>,

    /// Timestamp when the analysis completed
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Complete analysis of one audio source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Annotated segments in timeline order
    pub segments: Vec<Segment>,

    /// Full transcript text
    pub transcript: String,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

/// Per-invocation knobs for the pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Copy the downloaded audio into the current directory
    pub save_audio: bool,

    /// Skip the analysis cache for this run
    pub no_cache: bool,
}

/// Result of running the pipeline on one source
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub analysis: Analysis,

    /// Information about the resolved audio source
    pub audio_info: AudioInfo,

    /// Path to the preserved audio file (if requested)
    pub audio_path: Option<PathBuf>,

    /// Whether the analysis was served from the local cache
    pub from_cache: bool,
}

/// Main analysis pipeline: resolve source, download, analyze, assemble
pub struct AnalysisPipeline {
    config: Config,
    extractor_registry: ExtractorRegistry,
    client: AssemblyAiClient,
    cache: AnalysisCache,
    temp_dir: TempDir,
    quiet: bool,
}

impl AnalysisPipeline {
    /// Create a new analysis pipeline
    pub fn new(config: Config, api_key: String) -> Result<Self> {
        let client = AssemblyAiClient::new(&config.api.base_url, api_key);
        let cache = AnalysisCache::new(config.app.cache_enabled)?;

        // Downloaded audio lives here and is removed on drop
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;

        Ok(Self {
            config,
            extractor_registry: ExtractorRegistry::new(),
            client,
            cache,
            temp_dir,
            quiet: false,
        })
    }

    /// Suppress progress indicators
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.client = self.client.with_hidden_progress(quiet);
        self.quiet = quiet;
        self
    }

    fn spinner(&self) -> ProgressBar {
        if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        }
    }

    /// Analyze audio from a URL or local file path
    pub async fn analyze_source(
        &self,
        input: &str,
        options: &AnalyzeOptions,
    ) -> Result<AnalysisOutcome> {
        tracing::info!("Resolving audio source: {}", input);
        let audio_info = self.extractor_registry.extract_audio_info(input).await?;

        let audio_path = self.download_audio(&audio_info).await?;

        let use_cache = self.cache.enabled() && !options.no_cache;
        let fingerprint = if use_cache {
            Some(self.cache.fingerprint(&audio_path)?)
        } else {
            None
        };

        let (analysis, from_cache) = match fingerprint.and_then(|fp| self.cache.load(fp)) {
            Some(cached) => {
                tracing::info!(
                    "Reusing cached analysis from {}",
                    cached.metadata.completed_at.format("%Y-%m-%d %H:%M UTC")
                );
                (cached, true)
            }
            None => {
                let analysis = self.run_remote_analysis(&audio_path).await?;
                if let Some(fp) = fingerprint {
                    if let Err(e) = self.cache.store(fp, &analysis) {
                        tracing::warn!("Failed to write analysis cache: {e:#}");
                    }
                }
                (analysis, false)
            }
        };

        let preserved_audio_path = if options.save_audio || self.config.app.keep_audio {
            Some(self.preserve_audio_file(&audio_path, &audio_info)?)
        } else {
            None
        };

        Ok(AnalysisOutcome {
            analysis,
            audio_info,
            audio_path: preserved_audio_path,
            from_cache,
        })
    }

    /// Upload the audio, wait for the transcript, and assemble segments
    async fn run_remote_analysis(&self, audio_path: &Path) -> Result<Analysis> {
        let started = std::time::Instant::now();

        let upload_url = self.client.upload_file(audio_path).await?;
        let transcript_id = self.client.submit_transcript(&upload_url).await?;
        let transcript = self
            .client
            .wait_for_completion(&transcript_id, &self.config.poll_policy())
            .await?;

        let segments = assemble::build_segments(&transcript);
        if segments.is_empty() {
            tracing::warn!("Analysis produced no segments for this audio");
        } else {
            tracing::info!("Assembled {} segments", segments.len());
        }

        Ok(Analysis {
            segments,
            transcript: transcript.text.clone().unwrap_or_default(),
            metadata: AnalysisMetadata {
                transcript_id: transcript.id,
                audio_duration_secs: transcript.audio_duration,
                processing_duration_secs: Some(started.elapsed().as_secs_f64()),
                completed_at: chrono::Utc::now(),
            },
        })
    }

    /// Download audio file to temporary location
    async fn download_audio(&self, audio_info: &AudioInfo) -> Result<PathBuf> {
        let filename = format!(
            "audio_{}.{}",
            &Uuid::new_v4().to_string()[..8],
            audio_info.format.as_str()
        );
        let audio_path = self.temp_dir.path().join(filename);

        tracing::info!("Downloading audio to: {}", audio_path.display());

        // yt-dlp handles its own download for YouTube sources
        if let Some(source_url) = audio_info.download_url.strip_prefix("yt-dlp://") {
            let youtube_extractor = crate::extractors::youtube::YoutubeExtractor::new();

            let progress = self.spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap(),
            );
            progress.set_message("Downloading audio with yt-dlp...");

            youtube_extractor
                .download_audio_direct(source_url, &audio_path)
                .await?;

            progress.finish_with_message("Download complete");
            return Ok(audio_path);
        }

        // Local files are staged (and converted if needed) instead of downloaded
        if let Some(source_path) = audio_info.download_url.strip_prefix("local-file://") {
            let local_extractor = crate::extractors::local::LocalFileExtractor::new();
            let format = local_extractor
                .prepare_audio(Path::new(source_path), &audio_path)
                .await?;
            if format != audio_info.format {
                tracing::debug!("Local file converted to {}", format.as_str());
            }
            return Ok(audio_path);
        }

        // Create progress bar for regular downloads
        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(audio_info.file_size.unwrap_or(0))
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                )
                .unwrap(),
        );
        progress.set_message("Downloading audio...");

        let response = reqwest::get(&audio_info.download_url).await?;

        if !response.status().is_success() {
            return Err(ClipscoutError::DownloadFailed(format!(
                "HTTP {} from {}",
                response.status(),
                audio_info.download_url
            ))
            .into());
        }

        let total_size = response.content_length().unwrap_or(0);
        progress.set_length(total_size);

        let mut file = fs_err::File::create(&audio_path)?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        use std::io::Write;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }

        progress.finish_with_message("Download complete");

        Ok(audio_path)
    }

    /// Preserve audio file in user's directory
    fn preserve_audio_file(&self, temp_path: &Path, audio_info: &AudioInfo) -> Result<PathBuf> {
        let filename = audio_info
            .title
            .as_ref()
            .map(|title| {
                format!(
                    "{}.{}",
                    crate::utils::sanitize_filename(title),
                    audio_info.format.as_str()
                )
            })
            .unwrap_or_else(|| {
                format!(
                    "audio_{}.{}",
                    chrono::Utc::now().format("%Y%m%d_%H%M%S"),
                    audio_info.format.as_str()
                )
            });

        let output_path = std::env::current_dir()?.join(filename);
        fs_err::copy(temp_path, &output_path)?;

        tracing::info!("Saved audio to: {}", output_path.display());
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_parses_case_insensitively() {
        assert_eq!("positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!("NEGATIVE".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert_eq!(" Neutral ".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_rejects_unknown_label() {
        let err = "excited".parse::<Sentiment>().unwrap_err();
        assert!(matches!(err, ClipscoutError::InvalidInput(_)));
        assert!(err.to_string().contains("excited"));
    }

    #[test]
    fn test_sentiment_display_roundtrip() {
        for sentiment in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral] {
            assert_eq!(sentiment.to_string().parse::<Sentiment>().unwrap(), sentiment);
        }
    }

    #[test]
    fn test_sentiment_serde_uses_lowercase() {
        let json = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
        let back: Sentiment = serde_json::from_str("\"neutral\"").unwrap();
        assert_eq!(back, Sentiment::Neutral);
    }

    #[test]
    fn test_analysis_serde_roundtrip() {
        let analysis = Analysis {
            segments: vec![Segment {
                start_ms: 0,
                end_ms: 5000,
                text: "intro".into(),
                topics: vec![TopicLabel {
                    label: "Technology&Computing".into(),
                    relevance: 0.8,
                }],
                sentiment: SentimentScore {
                    label: Sentiment::Positive,
                    confidence: 0.9,
                },
            }],
            transcript: "hello".into(),
            metadata: AnalysisMetadata {
                transcript_id: "tr_1".into(),
                audio_duration_secs: Some(5.0),
                processing_duration_secs: Some(1.5),
                completed_at: chrono::Utc::now(),
            },
        };

        let json = serde_json::to_string(&analysis).unwrap();
        let back: Analysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back.segments, analysis.segments);
        assert_eq!(back.transcript, analysis.transcript);
    }
}
