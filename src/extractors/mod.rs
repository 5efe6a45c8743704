use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub mod direct;
pub mod local;
pub mod twitter;
pub mod youtube;

use crate::{ClipscoutError, Result};

/// Information about an audio source resolved from user input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Direct download URL for the audio (may use a pseudo scheme for
    /// tool-driven downloads, e.g. `yt-dlp://...`)
    pub download_url: String,

    /// Duration in seconds if known before download
    pub duration_seconds: Option<f64>,

    /// Title or description of the media
    pub title: Option<String>,

    /// Audio format (mp3, m4a, wav, etc.)
    pub format: AudioFormat,

    /// File size in bytes if available
    pub file_size: Option<u64>,

    /// Original URL or path that was given
    pub original_url: String,
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
    Webm,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Webm => "webm",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "aac" => Some(AudioFormat::M4a),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            "webm" => Some(AudioFormat::Webm),
            _ => None,
        }
    }
}

/// Trait for resolving audio from different platforms
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve audio information from a URL
    async fn extract_audio_info(&self, url: &str) -> Result<AudioInfo>;

    /// Check if this extractor supports the given URL
    fn supports_url(&self, url: &str) -> bool;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;

    /// Download audio to a local file
    async fn download_audio(&self, audio_info: &AudioInfo, output_path: &Path) -> Result<()> {
        let response = reqwest::get(&audio_info.download_url).await.map_err(|e| {
            ClipscoutError::DownloadFailed(format!("request for audio failed: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(ClipscoutError::DownloadFailed(format!(
                "HTTP {} fetching audio",
                response.status()
            ))
            .into());
        }

        let content = response.bytes().await.map_err(|e| {
            ClipscoutError::DownloadFailed(format!("reading audio body failed: {e}"))
        })?;
        fs_err::write(output_path, content)?;

        Ok(())
    }
}

/// Registry for routing inputs to the right extractor
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn MediaExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new registry with the default extractors
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: Vec::new(),
        };

        registry.register(Box::new(youtube::YoutubeExtractor::new()));
        registry.register(Box::new(twitter::TwitterExtractor::new()));
        registry.register(Box::new(direct::DirectExtractor::new()));

        registry
    }

    /// Register an extractor
    pub fn register(&mut self, extractor: Box<dyn MediaExtractor>) {
        self.extractors.push(extractor);
    }

    /// Find an extractor that supports the given URL
    pub fn find_extractor(&self, url: &str) -> Option<&dyn MediaExtractor> {
        self.extractors
            .iter()
            .find(|extractor| extractor.supports_url(url))
            .map(|boxed| boxed.as_ref())
    }

    /// List all supported platforms
    pub fn list_platforms(&self) -> Vec<&'static str> {
        self.extractors
            .iter()
            .map(|extractor| extractor.platform_name())
            .collect()
    }

    /// Check if input is a local file path rather than a URL
    pub fn is_local_file(&self, input: &str) -> bool {
        if input.starts_with("http://") || input.starts_with("https://") {
            return false;
        }

        let path = Path::new(input);
        if path.exists() {
            return true;
        }

        // Not on disk, but shaped like a path
        let has_extension = path.extension().is_some();
        let has_path_separators = input.contains('/') || input.contains('\\');
        let starts_with_dot = input.starts_with("./") || input.starts_with(".\\");

        has_extension || has_path_separators || starts_with_dot
    }

    /// Resolve audio info using the appropriate extractor
    pub async fn extract_audio_info(&self, input: &str) -> Result<AudioInfo> {
        if self.is_local_file(input) {
            let local_extractor = local::LocalFileExtractor::new();
            return local_extractor.extract_audio_info(input).await;
        }

        validate_url(input)?;

        let extractor = self
            .find_extractor(input)
            .ok_or_else(|| ClipscoutError::UnsupportedSource(input.to_string()))?;

        extractor.extract_audio_info(input).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate that an input is a well-formed http(s) URL
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| ClipscoutError::InvalidInput(format!("not a valid URL: {url}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(
            ClipscoutError::InvalidInput("URL must use HTTP or HTTPS protocol".into()).into(),
        );
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_roundtrip() {
        assert_eq!(AudioFormat::from_extension("MP3"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_extension("aac"), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::from_extension("txt"), None);
        assert_eq!(AudioFormat::Ogg.as_str(), "ogg");
    }

    #[test]
    fn test_is_local_file() {
        let registry = ExtractorRegistry::new();
        assert!(!registry.is_local_file("https://youtube.com/watch?v=abc"));
        assert!(!registry.is_local_file("http://example.com/a.mp3"));
        assert!(registry.is_local_file("./recording.mp3"));
        assert!(registry.is_local_file("audio/session.wav"));
        assert!(registry.is_local_file("talk.m4a"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not-a-url").is_err());
    }

    #[test]
    fn test_registry_routing() {
        let registry = ExtractorRegistry::new();

        let yt = registry
            .find_extractor("https://www.youtube.com/watch?v=abc123")
            .expect("youtube extractor");
        assert_eq!(yt.platform_name(), "YouTube");

        let tw = registry
            .find_extractor("https://x.com/user/status/1")
            .expect("twitter extractor");
        assert_eq!(tw.platform_name(), "Twitter/X");

        let direct = registry
            .find_extractor("https://cdn.example.com/talk.mp3")
            .expect("direct extractor");
        assert_eq!(direct.platform_name(), "Direct URL");

        assert!(registry.find_extractor("https://example.com/page").is_none());
    }

    #[test]
    fn test_registered_mock_takes_precedence() {
        let mut mock = MockMediaExtractor::new();
        mock.expect_supports_url().return_const(true);
        mock.expect_platform_name().return_const("Mock");
        mock.expect_extract_audio_info().returning(|url| {
            Ok(AudioInfo {
                download_url: url.to_string(),
                duration_seconds: Some(12.0),
                title: Some("mocked".into()),
                format: AudioFormat::Mp3,
                file_size: None,
                original_url: url.to_string(),
            })
        });

        let mut registry = ExtractorRegistry {
            extractors: Vec::new(),
        };
        registry.register(Box::new(mock));

        let info =
            tokio_test::block_on(registry.extract_audio_info("https://anything.example/clip"))
                .expect("mock extraction");
        assert_eq!(info.title.as_deref(), Some("mocked"));
        assert_eq!(registry.list_platforms(), vec!["Mock"]);
    }
}
