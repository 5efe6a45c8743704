//! Thin HTTP client for the AssemblyAI v2 API.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use tokio::time::sleep;

use super::poll::PollPolicy;
use super::response::{TranscriptCreated, TranscriptResponse, TranscriptStatus, UploadResponse};
use crate::{ClipscoutError, Result};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";

/// Client for the AssemblyAI transcript API
pub struct AssemblyAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    hide_progress: bool,
}

impl AssemblyAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            hide_progress: false,
        }
    }

    /// Suppress the polling spinner (for quiet runs)
    pub fn with_hidden_progress(mut self, hidden: bool) -> Self {
        self.hide_progress = hidden;
        self
    }

    /// Upload a local audio file, returning the service-side URL
    pub async fn upload_file(&self, path: &Path) -> Result<String> {
        tracing::info!("Uploading audio file: {}", path.display());

        let content = fs_err::read(path)?;

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(content)
            .send()
            .await
            .context("upload request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClipscoutError::AnalysisFailed(format!(
                "upload rejected with HTTP {status}: {body}"
            ))
            .into());
        }

        let upload: UploadResponse = response
            .json()
            .await
            .context("decoding upload response")?;

        Ok(upload.upload_url)
    }

    /// Create a transcript job with topic detection and sentiment analysis
    pub async fn submit_transcript(&self, audio_url: &str) -> Result<String> {
        tracing::info!("Submitting transcript job");

        let payload = json!({
            "audio_url": audio_url,
            "auto_chapters": true,
            "iab_categories": true,
            "sentiment_analysis": true,
        });

        let response = self
            .http
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("transcript request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClipscoutError::AnalysisFailed(format!(
                "transcript request rejected with HTTP {status}: {body}"
            ))
            .into());
        }

        let created: TranscriptCreated = response
            .json()
            .await
            .context("decoding transcript creation response")?;

        tracing::info!("Transcript job created: {}", created.id);
        Ok(created.id)
    }

    /// Fetch the current state of a transcript job
    pub async fn fetch_transcript(&self, id: &str) -> Result<TranscriptResponse> {
        let response = self
            .http
            .get(format!("{}/transcript/{id}", self.base_url))
            .header("authorization", &self.api_key)
            .send()
            .await
            .context("transcript status request failed")?
            .error_for_status()
            .context("transcript status request rejected")?;

        let transcript: TranscriptResponse = response
            .json()
            .await
            .context("decoding transcript response")?;

        Ok(transcript)
    }

    /// Poll the job until it completes, fails remotely, or the policy's
    /// attempt budget runs out
    pub async fn wait_for_completion(
        &self,
        id: &str,
        policy: &PollPolicy,
    ) -> Result<TranscriptResponse> {
        let progress = if self.hide_progress {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        progress.set_message("Waiting for analysis...");

        let start_time = std::time::Instant::now();

        for attempt in 1..=policy.max_attempts {
            let transcript = self.fetch_transcript(id).await?;

            match transcript.status {
                TranscriptStatus::Completed => {
                    progress.finish_with_message("Analysis completed");
                    return Ok(transcript);
                }
                TranscriptStatus::Error => {
                    progress.finish_with_message("Analysis failed");
                    let reason = transcript
                        .error
                        .unwrap_or_else(|| "unknown remote error".to_string());
                    return Err(ClipscoutError::AnalysisFailed(reason).into());
                }
                TranscriptStatus::Queued | TranscriptStatus::Processing => {
                    progress.set_message(format!(
                        "Analysis {} ({}s elapsed, check #{attempt})",
                        transcript.status.as_str(),
                        start_time.elapsed().as_secs(),
                    ));
                    // No point waiting again once the last check has been spent
                    if attempt < policy.max_attempts {
                        sleep(policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        progress.finish_with_message("Analysis timed out");
        Err(ClipscoutError::AnalysisTimeout {
            attempts: policy.max_attempts,
            waited_secs: policy.total_budget_secs(),
        }
        .into())
    }
}
