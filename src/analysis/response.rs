//! Wire types for the AssemblyAI v2 transcript API.
//!
//! Only the fields the pipeline consumes are modeled; everything else in the
//! service's responses is ignored. Span times are kept as `i64` milliseconds
//! here so that malformed values can be skipped during assembly instead of
//! failing the whole deserialization.

use serde::Deserialize;

/// Response to `POST /upload`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub upload_url: String,
}

/// Response to `POST /transcript` (job creation)
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptCreated {
    pub id: String,
    pub status: TranscriptStatus,
}

/// Job lifecycle states reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl TranscriptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptStatus::Queued => "queued",
            TranscriptStatus::Processing => "processing",
            TranscriptStatus::Completed => "completed",
            TranscriptStatus::Error => "error",
        }
    }
}

/// Response to `GET /transcript/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptResponse {
    pub id: String,
    pub status: TranscriptStatus,

    /// Populated when `status` is `error`
    #[serde(default)]
    pub error: Option<String>,

    /// Full transcript text
    #[serde(default)]
    pub text: Option<String>,

    /// Audio duration in seconds
    #[serde(default)]
    pub audio_duration: Option<f64>,

    /// Auto-chapter summaries (requested via `auto_chapters`)
    #[serde(default)]
    pub chapters: Option<Vec<Chapter>>,

    /// Topic detection results (requested via `iab_categories`)
    #[serde(default)]
    pub iab_categories_result: Option<IabCategoriesResult>,

    /// Per-sentence sentiment (requested via `sentiment_analysis`)
    #[serde(default)]
    pub sentiment_analysis_results: Option<Vec<SentimentResult>>,
}

/// One auto-generated chapter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chapter {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub gist: String,
}

impl Chapter {
    /// Best available description for the chapter
    pub fn display_text(&self) -> &str {
        if !self.summary.is_empty() {
            &self.summary
        } else if !self.headline.is_empty() {
            &self.headline
        } else {
            &self.gist
        }
    }
}

/// Topic detection envelope
#[derive(Debug, Clone, Deserialize)]
pub struct IabCategoriesResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub results: Vec<IabSpan>,
}

/// A text span with detected topic labels
#[derive(Debug, Clone, Deserialize)]
pub struct IabSpan {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub labels: Vec<IabLabel>,
    pub timestamp: SpanTimestamp,
}

/// One detected IAB taxonomy label with its relevance in [0, 1]
#[derive(Debug, Clone, Deserialize)]
pub struct IabLabel {
    pub relevance: f64,
    pub label: String,
}

/// Millisecond time range of a span
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SpanTimestamp {
    pub start: i64,
    pub end: i64,
}

/// One sentence-level sentiment classification
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentResult {
    #[serde(default)]
    pub text: String,
    pub start: i64,
    pub end: i64,
    /// POSITIVE, NEGATIVE or NEUTRAL
    pub sentiment: String,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_lowercase() {
        let status: TranscriptStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, TranscriptStatus::Processing);
        assert_eq!(status.as_str(), "processing");
    }

    #[test]
    fn test_minimal_transcript_response() {
        // A freshly queued job carries none of the result fields
        let json = r#"{"id":"abc123","status":"queued"}"#;
        let resp: TranscriptResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, "abc123");
        assert_eq!(resp.status, TranscriptStatus::Queued);
        assert!(resp.chapters.is_none());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_chapter_display_text_fallbacks() {
        let mut chapter = Chapter {
            start: 0,
            end: 1000,
            summary: String::new(),
            headline: "A headline".into(),
            gist: "a gist".into(),
        };
        assert_eq!(chapter.display_text(), "A headline");
        chapter.headline.clear();
        assert_eq!(chapter.display_text(), "a gist");
        chapter.summary = "Full summary".into();
        assert_eq!(chapter.display_text(), "Full summary");
    }
}
