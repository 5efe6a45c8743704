use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioFormat, AudioInfo, MediaExtractor};
use crate::{ClipscoutError, Result};

/// YouTube audio extractor using yt-dlp
pub struct YoutubeExtractor {
    yt_dlp_path: String,
}

impl YoutubeExtractor {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Get video metadata using yt-dlp
    async fn get_video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", url);

        let result = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipscoutError::ToolNotFound("yt-dlp".into()).into());
            }
            Err(e) => {
                return Err(
                    ClipscoutError::DownloadFailed(format!("yt-dlp execution failed: {e}")).into(),
                );
            }
        };

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ClipscoutError::DownloadFailed(format!("yt-dlp failed: {error}")).into());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }

    /// Download audio directly with yt-dlp, extracting to mp3
    pub async fn download_audio_direct(&self, url: &str, output_path: &Path) -> Result<AudioFormat> {
        tracing::debug!("Downloading audio directly for: {}", url);

        let result = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &output_path.to_string_lossy(),
                "--extract-audio",
                "--audio-format",
                "mp3",
                // Lowest bitrate is plenty for speech analysis
                "--audio-quality",
                "9",
                "--format",
                "worstaudio[acodec^=mp4a]/worstaudio[ext=m4a]/worstaudio[ext=mp3]/worstaudio",
                "--no-playlist",
                "--concurrent-fragments",
                "4",
                "--newline",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipscoutError::ToolNotFound("yt-dlp".into()).into());
            }
            Err(e) => {
                return Err(
                    ClipscoutError::DownloadFailed(format!("yt-dlp execution failed: {e}")).into(),
                );
            }
        };

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(
                ClipscoutError::DownloadFailed(format!("audio download failed: {error}")).into(),
            );
        }

        Ok(AudioFormat::Mp3)
    }
}

#[async_trait]
impl MediaExtractor for YoutubeExtractor {
    async fn extract_audio_info(&self, url: &str) -> Result<AudioInfo> {
        let info = self.get_video_info(url).await?;

        let title = info["title"].as_str().map(|s| s.to_string());
        let duration_seconds = info["duration"].as_f64();

        // The actual download happens through download_audio_direct(); the
        // pseudo scheme tells the pipeline to hand the URL back to yt-dlp.
        let download_url = format!("yt-dlp://{url}");

        Ok(AudioInfo {
            download_url,
            duration_seconds,
            title,
            format: AudioFormat::Mp3,
            file_size: None,
            original_url: url.to_string(),
        })
    }

    fn supports_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        url_lower.contains("youtube.com/watch")
            || url_lower.contains("youtu.be/")
            || url_lower.contains("youtube.com/embed/")
            || url_lower.contains("youtube.com/v/")
            || url_lower.contains("m.youtube.com/")
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}

impl Default for YoutubeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_url() {
        let extractor = YoutubeExtractor::new();
        assert!(extractor.supports_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(extractor.supports_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(extractor.supports_url("https://m.youtube.com/watch?v=abc"));
        assert!(!extractor.supports_url("https://vimeo.com/12345"));
        assert!(!extractor.supports_url("https://x.com/user/status/1"));
    }
}
