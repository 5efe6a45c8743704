use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

use super::{AudioFormat, AudioInfo, MediaExtractor};
use crate::{ClipscoutError, Result};

/// Extractor for audio/video files already on disk
pub struct LocalFileExtractor;

impl LocalFileExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Check that the file exists, is a file, and is non-empty
    async fn validate_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ClipscoutError::DownloadFailed(format!(
                "file does not exist: {}",
                path.display()
            ))
            .into());
        }

        if !path.is_file() {
            return Err(ClipscoutError::DownloadFailed(format!(
                "path is not a file: {}",
                path.display()
            ))
            .into());
        }

        match fs::metadata(path).await {
            Ok(metadata) if metadata.len() == 0 => Err(ClipscoutError::DownloadFailed(format!(
                "file is empty: {}",
                path.display()
            ))
            .into()),
            Ok(_) => Ok(()),
            Err(e) => Err(ClipscoutError::DownloadFailed(format!(
                "cannot access file {}: {e}",
                path.display()
            ))
            .into()),
        }
    }

    /// Probe duration and audio streams with ffprobe
    async fn get_file_info(&self, path: &Path) -> Result<(Option<f64>, String)> {
        let result = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &path.to_string_lossy(),
            ])
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipscoutError::ToolNotFound("ffprobe".into()).into());
            }
            Err(e) => {
                return Err(
                    ClipscoutError::DownloadFailed(format!("ffprobe failed: {e}")).into(),
                );
            }
        };

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ClipscoutError::DownloadFailed(format!(
                "ffprobe could not analyze file: {error}"
            ))
            .into());
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;

        let duration = info["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok());

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Local File")
            .to_string();

        let empty_vec = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty_vec);
        let has_audio = streams
            .iter()
            .any(|stream| stream["codec_type"].as_str() == Some("audio"));

        if !has_audio {
            return Err(ClipscoutError::DownloadFailed(format!(
                "file has no audio streams: {}",
                path.display()
            ))
            .into());
        }

        Ok((duration, title))
    }

    /// Determine audio format from the file extension
    fn get_audio_format(&self, path: &Path) -> AudioFormat {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension)
            // Video or unknown containers get converted to mp3
            .unwrap_or(AudioFormat::Mp3)
    }

    /// Copy or convert the local file to the target path
    pub async fn prepare_audio(&self, source_path: &Path, target_path: &Path) -> Result<AudioFormat> {
        tracing::debug!(
            "Preparing local audio file: {} -> {}",
            source_path.display(),
            target_path.display()
        );

        let is_plain_audio = matches!(
            source_path.extension().and_then(|ext| ext.to_str()),
            Some("mp3") | Some("m4a") | Some("aac")
        );

        if is_plain_audio {
            // Uploadable as-is
            fs::copy(source_path, target_path).await?;
            Ok(self.get_audio_format(source_path))
        } else {
            self.convert_to_mp3(source_path, target_path).await?;
            Ok(AudioFormat::Mp3)
        }
    }

    /// Convert a media file to mp3 using ffmpeg
    async fn convert_to_mp3(&self, source_path: &Path, target_path: &Path) -> Result<()> {
        tracing::debug!("Converting {} to mp3", source_path.display());

        let result = Command::new("ffmpeg")
            .args([
                "-i",
                &source_path.to_string_lossy(),
                "-vn",
                "-acodec",
                "mp3",
                "-ab",
                "128k",
                "-y",
                &target_path.to_string_lossy(),
            ])
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClipscoutError::ToolNotFound("ffmpeg".into()).into());
            }
            Err(e) => {
                return Err(ClipscoutError::DownloadFailed(format!("ffmpeg failed: {e}")).into());
            }
        };

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(ClipscoutError::DownloadFailed(format!(
                "ffmpeg conversion failed: {error}"
            ))
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl MediaExtractor for LocalFileExtractor {
    async fn extract_audio_info(&self, path: &str) -> Result<AudioInfo> {
        let file_path = Path::new(path);

        self.validate_file(file_path).await?;

        let (duration_seconds, title) = self.get_file_info(file_path).await?;

        let metadata = fs::metadata(file_path).await?;
        let file_size = Some(metadata.len());

        let format = self.get_audio_format(file_path);

        // Absolute path avoids surprises when the pipeline changes directories
        let absolute_path = file_path
            .canonicalize()
            .unwrap_or_else(|_| file_path.to_path_buf());
        let download_url = format!("local-file://{}", absolute_path.display());

        Ok(AudioInfo {
            download_url,
            duration_seconds,
            title: Some(title),
            format,
            file_size,
            original_url: path.to_string(),
        })
    }

    fn supports_url(&self, _url: &str) -> bool {
        // Local files are routed by the registry's path heuristic, not by URL
        false
    }

    fn platform_name(&self) -> &'static str {
        "Local File"
    }
}

impl Default for LocalFileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        let extractor = LocalFileExtractor::new();
        assert_eq!(
            extractor.get_audio_format(Path::new("talk.WAV")),
            AudioFormat::Wav
        );
        assert_eq!(
            extractor.get_audio_format(Path::new("clip.mkv")),
            AudioFormat::Mp3
        );
        assert_eq!(
            extractor.get_audio_format(Path::new("no_extension")),
            AudioFormat::Mp3
        );
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let extractor = LocalFileExtractor::new();
        let err = extractor
            .validate_file(Path::new("/definitely/not/here.mp3"))
            .await
            .expect_err("missing file must fail");
        assert!(matches!(
            err.downcast_ref::<ClipscoutError>(),
            Some(ClipscoutError::DownloadFailed(_))
        ));
    }
}
