//! Assembly of annotated segments from a completed transcript.
//!
//! The service reports chapters, topic spans, and sentence sentiments as three
//! independent streams over the audio timeline. Assembly joins them: chapters
//! define the segment windows (topic spans stand in when the service produced
//! no chapters), topic labels are attached by span overlap keeping the highest
//! relevance per label, and each window's dominant sentiment is decided by a
//! confidence-weighted vote over the overlapping sentence sentiments.

use std::collections::BTreeMap;
use tracing::warn;

use super::response::{IabSpan, SentimentResult, TranscriptResponse};
use super::{Segment, Sentiment, SentimentScore, TopicLabel};

/// A candidate segment window in milliseconds
struct Window {
    start_ms: u64,
    end_ms: u64,
    text: String,
}

/// Build segments from a completed transcript response.
///
/// Returns an empty vector when the service produced neither chapters nor
/// topic spans; that is a valid (if unhelpful) analysis, not an error.
pub fn build_segments(response: &TranscriptResponse) -> Vec<Segment> {
    let iab_spans: &[IabSpan] = response
        .iab_categories_result
        .as_ref()
        .map(|r| r.results.as_slice())
        .unwrap_or(&[]);
    let sentiments: &[SentimentResult] =
        response.sentiment_analysis_results.as_deref().unwrap_or(&[]);

    let mut windows = windows_from_chapters(response);
    if windows.is_empty() {
        if response.chapters.as_ref().is_some_and(|c| !c.is_empty()) {
            warn!("All chapters had malformed time ranges");
        } else {
            warn!("No chapters in transcript, falling back to topic spans");
        }
        windows = windows_from_iab(iab_spans);
    }

    windows.sort_by_key(|w| (w.start_ms, w.end_ms));

    windows
        .into_iter()
        .map(|window| {
            let topics = topics_for(&window, iab_spans);
            let sentiment = dominant_sentiment(&window, sentiments);
            Segment {
                start_ms: window.start_ms,
                end_ms: window.end_ms,
                text: window.text,
                topics,
                sentiment,
            }
        })
        .collect()
}

/// Validate a millisecond span: non-negative, start strictly before end
fn valid_span(start: i64, end: i64) -> Option<(u64, u64)> {
    if start >= 0 && end > start {
        Some((start as u64, end as u64))
    } else {
        None
    }
}

fn windows_from_chapters(response: &TranscriptResponse) -> Vec<Window> {
    response
        .chapters
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter_map(|chapter| match valid_span(chapter.start, chapter.end) {
            Some((start_ms, end_ms)) => Some(Window {
                start_ms,
                end_ms,
                text: chapter.display_text().to_string(),
            }),
            None => {
                warn!(
                    "Skipping chapter with malformed range {}..{}",
                    chapter.start, chapter.end
                );
                None
            }
        })
        .collect()
}

fn windows_from_iab(iab_spans: &[IabSpan]) -> Vec<Window> {
    iab_spans
        .iter()
        .filter_map(|span| {
            match valid_span(span.timestamp.start, span.timestamp.end) {
                Some((start_ms, end_ms)) => Some(Window {
                    start_ms,
                    end_ms,
                    text: span.text.clone(),
                }),
                None => {
                    warn!(
                        "Skipping topic span with malformed range {}..{}",
                        span.timestamp.start, span.timestamp.end
                    );
                    None
                }
            }
        })
        .collect()
}

/// Half-open overlap test between a window and a raw millisecond span
fn overlaps(window: &Window, start: i64, end: i64) -> bool {
    match valid_span(start, end) {
        Some((s, e)) => s < window.end_ms && e > window.start_ms,
        None => false,
    }
}

/// Collect topic labels overlapping the window, keeping the maximum relevance
/// seen per label, ordered by descending relevance (label name breaks ties)
fn topics_for(window: &Window, iab_spans: &[IabSpan]) -> Vec<TopicLabel> {
    let mut by_label: BTreeMap<&str, f64> = BTreeMap::new();

    for span in iab_spans {
        if !overlaps(window, span.timestamp.start, span.timestamp.end) {
            continue;
        }
        for label in &span.labels {
            let entry = by_label.entry(label.label.as_str()).or_insert(0.0);
            if label.relevance > *entry {
                *entry = label.relevance;
            }
        }
    }

    let mut topics: Vec<TopicLabel> = by_label
        .into_iter()
        .map(|(label, relevance)| TopicLabel {
            label: label.to_string(),
            relevance,
        })
        .collect();

    topics.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| a.label.cmp(&b.label))
    });

    topics
}

/// Confidence-weighted sentiment vote over the spans overlapping the window.
///
/// The winner's confidence is its share of the total vote mass, so a window
/// that is uniformly positive gets confidence 1.0 while a contested one gets
/// proportionally less. No overlapping spans yields neutral with confidence 0.
fn dominant_sentiment(window: &Window, sentiments: &[SentimentResult]) -> SentimentScore {
    let mut votes: [f64; 3] = [0.0; 3];

    for result in sentiments {
        if !overlaps(window, result.start, result.end) {
            continue;
        }
        match result.sentiment.parse::<Sentiment>() {
            Ok(sentiment) => votes[sentiment as usize] += result.confidence.max(0.0),
            Err(_) => {
                warn!("Ignoring unrecognized sentiment label: {}", result.sentiment);
            }
        }
    }

    let total: f64 = votes.iter().sum();
    if total <= 0.0 {
        return SentimentScore {
            label: Sentiment::Neutral,
            confidence: 0.0,
        };
    }

    // Strict comparison keeps the first label in declaration order on ties
    let mut best = Sentiment::Neutral;
    let mut best_votes = 0.0;
    for sentiment in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral] {
        if votes[sentiment as usize] > best_votes {
            best = sentiment;
            best_votes = votes[sentiment as usize];
        }
    }

    SentimentScore {
        label: best,
        confidence: best_votes / total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::response::TranscriptResponse;

    fn fixture() -> TranscriptResponse {
        serde_json::from_str(
            r#"{
                "id": "tr_1",
                "status": "completed",
                "text": "full transcript",
                "audio_duration": 60.0,
                "chapters": [
                    {"start": 0, "end": 30000, "summary": "Intro about machine learning", "headline": "ML intro", "gist": "ml"},
                    {"start": 30000, "end": 60000, "summary": "Football recap", "headline": "Sports", "gist": "sports"}
                ],
                "iab_categories_result": {
                    "status": "success",
                    "results": [
                        {
                            "text": "machine learning is great",
                            "labels": [
                                {"relevance": 0.9, "label": "Technology&Computing>ArtificialIntelligence"},
                                {"relevance": 0.4, "label": "Science>Computing"}
                            ],
                            "timestamp": {"start": 0, "end": 25000}
                        },
                        {
                            "text": "the match last night",
                            "labels": [
                                {"relevance": 0.8, "label": "Sports>Soccer"},
                                {"relevance": 0.6, "label": "Technology&Computing>ArtificialIntelligence"}
                            ],
                            "timestamp": {"start": 31000, "end": 59000}
                        }
                    ]
                },
                "sentiment_analysis_results": [
                    {"text": "love it", "start": 0, "end": 10000, "sentiment": "POSITIVE", "confidence": 0.9},
                    {"text": "hate the ads", "start": 10000, "end": 20000, "sentiment": "NEGATIVE", "confidence": 0.3},
                    {"text": "it was fine", "start": 35000, "end": 55000, "sentiment": "NEUTRAL", "confidence": 0.7}
                ]
            }"#,
        )
        .expect("fixture must deserialize")
    }

    #[test]
    fn test_segments_from_chapters() {
        let segments = build_segments(&fixture());
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].start_ms, 0);
        assert_eq!(segments[0].end_ms, 30000);
        assert_eq!(segments[0].text, "Intro about machine learning");

        assert_eq!(segments[1].start_ms, 30000);
        assert_eq!(segments[1].text, "Football recap");
    }

    #[test]
    fn test_topics_attached_by_overlap_with_max_relevance() {
        let segments = build_segments(&fixture());

        let first_topics = &segments[0].topics;
        assert_eq!(first_topics.len(), 2);
        assert_eq!(
            first_topics[0].label,
            "Technology&Computing>ArtificialIntelligence"
        );
        assert_eq!(first_topics[0].relevance, 0.9);
        assert_eq!(first_topics[1].label, "Science>Computing");

        // Second chapter only overlaps the second span
        let second_topics = &segments[1].topics;
        assert_eq!(second_topics.len(), 2);
        assert_eq!(second_topics[0].label, "Sports>Soccer");
        assert_eq!(second_topics[0].relevance, 0.8);
    }

    #[test]
    fn test_dominant_sentiment_weighted_vote() {
        let segments = build_segments(&fixture());

        // 0.9 positive vs 0.3 negative in the first chapter
        assert_eq!(segments[0].sentiment.label, Sentiment::Positive);
        assert!((segments[0].sentiment.confidence - 0.75).abs() < 1e-9);

        // Only the neutral span overlaps the second chapter
        assert_eq!(segments[1].sentiment.label, Sentiment::Neutral);
        assert!((segments[1].sentiment.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_to_topic_spans_without_chapters() {
        let mut response = fixture();
        response.chapters = None;

        let segments = build_segments(&response);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_ms, 0);
        assert_eq!(segments[0].end_ms, 25000);
        assert_eq!(segments[0].text, "machine learning is great");
        assert_eq!(segments[1].start_ms, 31000);
    }

    #[test]
    fn test_malformed_chapter_skipped() {
        let mut response = fixture();
        if let Some(chapters) = response.chapters.as_mut() {
            chapters[0].start = 30000;
            chapters[0].end = 30000; // zero-length, invalid
        }

        let segments = build_segments(&response);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Football recap");
    }

    #[test]
    fn test_unknown_sentiment_label_ignored() {
        let mut response = fixture();
        if let Some(results) = response.sentiment_analysis_results.as_mut() {
            results[0].sentiment = "EXCITED".into();
        }

        let segments = build_segments(&response);
        // Only the 0.3 negative vote remains in the first chapter
        assert_eq!(segments[0].sentiment.label, Sentiment::Negative);
        assert!((segments[0].sentiment.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_signal_defaults_to_neutral() {
        let mut response = fixture();
        response.sentiment_analysis_results = None;

        let segments = build_segments(&response);
        assert_eq!(segments[0].sentiment.label, Sentiment::Neutral);
        assert_eq!(segments[0].sentiment.confidence, 0.0);
    }

    #[test]
    fn test_empty_response_yields_no_segments() {
        let response: TranscriptResponse =
            serde_json::from_str(r#"{"id":"tr_2","status":"completed"}"#).unwrap();
        assert!(build_segments(&response).is_empty());
    }
}
