use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioFormat, AudioInfo, MediaExtractor};
use crate::{ClipscoutError, Result};

/// Twitter/X audio extractor using yt-dlp
pub struct TwitterExtractor {
    yt_dlp_path: String,
}

impl TwitterExtractor {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Get post metadata using yt-dlp
    async fn get_post_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting post info for: {}", url);

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
            return Err(ClipscoutError::DownloadFailed(format!(
                "yt-dlp failed to extract Twitter content: {error}"
            ))
            .into());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }

    /// Resolve the best audio URL for the post
    async fn get_audio_url(&self, url: &str) -> Result<String> {
        tracing::debug!("Getting audio URL for Twitter content: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--get-url", "--format", "bestaudio/best", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ClipscoutError::DownloadFailed(format!(
                "failed to get audio URL from Twitter: {error}"
            ))
            .into());
        }

        let audio_url = String::from_utf8(output.stdout)?.trim().to_string();

        Ok(audio_url)
    }
}

#[async_trait]
impl MediaExtractor for TwitterExtractor {
    async fn extract_audio_info(&self, url: &str) -> Result<AudioInfo> {
        let info = self.get_post_info(url).await?;

        // Posts rarely have a title; fall back to a trimmed description.
        // Truncation counts chars, not bytes, as descriptions often carry emoji.
        let title = info["description"]
            .as_str()
            .or_else(|| info["title"].as_str())
            .map(|s| {
                let cleaned = s.replace('\n', " ").trim().to_string();
                if cleaned.chars().count() > 100 {
                    let truncated: String = cleaned.chars().take(97).collect();
                    format!("{truncated}...")
                } else {
                    cleaned
                }
            });

        let duration_seconds = info["duration"].as_f64();
        let download_url = self.get_audio_url(url).await?;

        let format = if download_url.contains(".m4a") {
            AudioFormat::M4a
        } else {
            AudioFormat::Mp3
        };

        Ok(AudioInfo {
            download_url,
            duration_seconds,
            title,
            format,
            file_size: None,
            original_url: url.to_string(),
        })
    }

    fn supports_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        url_lower.contains("twitter.com/")
            || url_lower.contains("x.com/")
            || url_lower.contains("mobile.twitter.com/")
            || url_lower.contains("m.twitter.com/")
    }

    fn platform_name(&self) -> &'static str {
        "Twitter/X"
    }
}

impl Default for TwitterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_url() {
        let extractor = TwitterExtractor::new();
        assert!(extractor.supports_url("https://twitter.com/user/status/123"));
        assert!(extractor.supports_url("https://x.com/user/status/123"));
        assert!(extractor.supports_url("https://mobile.twitter.com/user/status/123"));
        assert!(!extractor.supports_url("https://youtube.com/watch?v=abc"));
    }
}
