use serde_json::json;

use crate::analysis::{AnalysisOutcome, Segment, TopicLabel};
use crate::output::Report;
use crate::utils::{format_duration, format_file_size, format_timestamp_ms};

/// Render a report as human-readable text
pub fn format_as_text(report: &Report<'_>) -> String {
    match report {
        Report::Recommendations {
            outcome,
            recommendations,
            preference,
        } => {
            let mut out = String::new();
            out.push_str(&source_header("Recommendations", outcome));
            out.push_str(&format!(
                "Preference: topics [{}], sentiment {}\n",
                preference.topics.join(", "),
                preference.sentiment
            ));
            out.push('\n');

            if recommendations.is_empty() {
                out.push_str("No segments to recommend.\n");
                return out;
            }

            for recommendation in *recommendations {
                let segment = &recommendation.segment;
                out.push_str(&format!(
                    "#{}  [{}]  score {:.2}\n",
                    recommendation.rank,
                    time_range(segment),
                    recommendation.score
                ));
                out.push_str(&format!("    {}\n", segment.text));
                out.push_str(&format!(
                    "    Sentiment: {} ({:.0}%)\n",
                    segment.sentiment.label,
                    segment.sentiment.confidence * 100.0
                ));
                if !segment.topics.is_empty() {
                    out.push_str(&format!("    Topics: {}\n", topics_line(&segment.topics)));
                }
                if !recommendation.matched_topics.is_empty() {
                    out.push_str(&format!(
                        "    Matched: {}\n",
                        recommendation.matched_topics.join(", ")
                    ));
                }
                out.push('\n');
            }
            out
        }
        Report::Segments { outcome } => {
            let mut out = String::new();
            out.push_str(&source_header("Segments", outcome));
            out.push('\n');

            if outcome.analysis.segments.is_empty() {
                out.push_str("No segments were detected.\n");
                return out;
            }

            for segment in &outcome.analysis.segments {
                out.push_str(&format!(
                    "[{}]  {} ({:.0}%)\n",
                    time_range(segment),
                    segment.sentiment.label,
                    segment.sentiment.confidence * 100.0
                ));
                out.push_str(&format!("    {}\n", segment.text));
                if !segment.topics.is_empty() {
                    out.push_str(&format!("    Topics: {}\n", topics_line(&segment.topics)));
                }
                out.push('\n');
            }
            out
        }
    }
}

/// Render a report as pretty-printed JSON
pub fn format_as_json(report: &Report<'_>) -> anyhow::Result<String> {
    let value = match report {
        Report::Recommendations {
            outcome,
            recommendations,
            preference,
        } => json!({
            "source": source_json(outcome),
            "preference": preference,
            "recommendations": recommendations,
        }),
        Report::Segments { outcome } => json!({
            "source": source_json(outcome),
            "segments": outcome.analysis.segments,
        }),
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

/// Render a report as a Markdown table
pub fn format_as_markdown(report: &Report<'_>) -> String {
    match report {
        Report::Recommendations {
            outcome,
            recommendations,
            ..
        } => {
            let mut out = format!("# Recommendations for {}\n\n", source_name(outcome));
            out.push_str("| Rank | Time | Score | Sentiment | Matched Topics | Summary |\n");
            out.push_str("|-----:|------|------:|-----------|----------------|---------|\n");
            for recommendation in *recommendations {
                let segment = &recommendation.segment;
                out.push_str(&format!(
                    "| {} | {} | {:.2} | {} | {} | {} |\n",
                    recommendation.rank,
                    time_range(segment),
                    recommendation.score,
                    segment.sentiment.label,
                    markdown_escape(&recommendation.matched_topics.join(", ")),
                    markdown_escape(&segment.text),
                ));
            }
            out
        }
        Report::Segments { outcome } => {
            let mut out = format!("# Segments for {}\n\n", source_name(outcome));
            out.push_str("| Time | Sentiment | Topics | Summary |\n");
            out.push_str("|------|-----------|--------|---------|\n");
            for segment in &outcome.analysis.segments {
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    time_range(segment),
                    segment.sentiment.label,
                    markdown_escape(&topics_line(&segment.topics)),
                    markdown_escape(&segment.text),
                ));
            }
            out
        }
    }
}

/// Render a report as CSV
pub fn format_as_csv(report: &Report<'_>) -> String {
    match report {
        Report::Recommendations {
            recommendations, ..
        } => {
            let mut out = String::from(
                "rank,start_ms,end_ms,score,sentiment,sentiment_confidence,matched_topics,summary\n",
            );
            for recommendation in *recommendations {
                let segment = &recommendation.segment;
                out.push_str(&format!(
                    "{},{},{},{:.4},{},{:.4},{},{}\n",
                    recommendation.rank,
                    segment.start_ms,
                    segment.end_ms,
                    recommendation.score,
                    segment.sentiment.label,
                    segment.sentiment.confidence,
                    csv_escape(&recommendation.matched_topics.join("; ")),
                    csv_escape(&segment.text),
                ));
            }
            out
        }
        Report::Segments { outcome } => {
            let mut out =
                String::from("start_ms,end_ms,sentiment,sentiment_confidence,topics,summary\n");
            for segment in &outcome.analysis.segments {
                let topics = segment
                    .topics
                    .iter()
                    .map(|t| t.label.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                out.push_str(&format!(
                    "{},{},{},{:.4},{},{}\n",
                    segment.start_ms,
                    segment.end_ms,
                    segment.sentiment.label,
                    segment.sentiment.confidence,
                    csv_escape(&topics),
                    csv_escape(&segment.text),
                ));
            }
            out
        }
    }
}

fn source_name(outcome: &AnalysisOutcome) -> String {
    outcome
        .audio_info
        .title
        .clone()
        .unwrap_or_else(|| outcome.audio_info.original_url.clone())
}

fn source_header(heading: &str, outcome: &AnalysisOutcome) -> String {
    let mut out = format!("{} for: {}\n", heading, source_name(outcome));
    out.push_str(&format!("Source: {}\n", outcome.audio_info.original_url));

    match (
        outcome.audio_info.duration_seconds,
        outcome.audio_info.file_size,
    ) {
        (Some(duration), Some(size)) => out.push_str(&format!(
            "Duration: {} ({})\n",
            format_duration(duration),
            format_file_size(size)
        )),
        (Some(duration), None) => {
            out.push_str(&format!("Duration: {}\n", format_duration(duration)))
        }
        _ => {}
    }

    let cached = if outcome.from_cache { " (cached)" } else { "" };
    out.push_str(&format!(
        "Segments analyzed: {}{}\n",
        outcome.analysis.segments.len(),
        cached
    ));
    out
}

fn source_json(outcome: &AnalysisOutcome) -> serde_json::Value {
    json!({
        "title": outcome.audio_info.title,
        "url": outcome.audio_info.original_url,
        "duration_seconds": outcome.audio_info.duration_seconds,
        "transcript_id": outcome.analysis.metadata.transcript_id,
        "completed_at": outcome.analysis.metadata.completed_at,
        "from_cache": outcome.from_cache,
    })
}

fn time_range(segment: &Segment) -> String {
    format!(
        "{} - {}",
        format_timestamp_ms(segment.start_ms),
        format_timestamp_ms(segment.end_ms)
    )
}

fn topics_line(topics: &[TopicLabel]) -> String {
    topics
        .iter()
        .take(3)
        .map(|t| format!("{} ({:.2})", t.label, t.relevance))
        .collect::<Vec<_>>()
        .join(", ")
}

fn markdown_escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        Analysis, AnalysisMetadata, AnalysisOutcome, Sentiment, SentimentScore,
    };
    use crate::extractors::{AudioFormat, AudioInfo};
    use crate::matcher::{rank, MatchWeights, Preference, Recommendation};

    fn fixture_outcome() -> AnalysisOutcome {
        let segments = vec![
            Segment {
                start_ms: 130_000,
                end_ms: 285_000,
                text: "Intro about machine learning".into(),
                topics: vec![TopicLabel {
                    label: "Technology&Computing>ArtificialIntelligence".into(),
                    relevance: 0.9,
                }],
                sentiment: SentimentScore {
                    label: Sentiment::Positive,
                    confidence: 0.75,
                },
            },
            Segment {
                start_ms: 285_000,
                end_ms: 500_000,
                text: "Football recap, with commentary".into(),
                topics: vec![TopicLabel {
                    label: "Sports>Soccer".into(),
                    relevance: 0.8,
                }],
                sentiment: SentimentScore {
                    label: Sentiment::Neutral,
                    confidence: 1.0,
                },
            },
        ];

        AnalysisOutcome {
            analysis: Analysis {
                segments,
                transcript: "full text".into(),
                metadata: AnalysisMetadata {
                    transcript_id: "tr_9".into(),
                    audio_duration_secs: Some(500.0),
                    processing_duration_secs: Some(20.0),
                    completed_at: chrono::Utc::now(),
                },
            },
            audio_info: AudioInfo {
                download_url: "yt-dlp://https://youtube.com/watch?v=abc".into(),
                duration_seconds: Some(500.0),
                title: Some("Tech & Football".into()),
                format: AudioFormat::Mp3,
                file_size: Some(4_200_000),
                original_url: "https://youtube.com/watch?v=abc".into(),
            },
            audio_path: None,
            from_cache: false,
        }
    }

    fn fixture_report(outcome: &AnalysisOutcome) -> (Vec<Recommendation>, Preference) {
        let preference = Preference::new("artificial intelligence", "positive").unwrap();
        let recommendations = rank(
            &outcome.analysis.segments,
            &preference,
            &MatchWeights::default(),
        );
        (recommendations, preference)
    }

    #[test]
    fn test_text_output_lists_ranked_segments() {
        let outcome = fixture_outcome();
        let (recommendations, preference) = fixture_report(&outcome);

        let text = format_as_text(&Report::Recommendations {
            outcome: &outcome,
            recommendations: &recommendations,
            preference: &preference,
        });

        assert!(text.contains("Recommendations for: Tech & Football"));
        assert!(text.contains("#1  [02:10 - 04:45]"));
        assert!(text.contains("Intro about machine learning"));
        assert!(text.contains("Matched: Technology&Computing>ArtificialIntelligence"));
    }

    #[test]
    fn test_text_output_for_empty_ranking() {
        let mut outcome = fixture_outcome();
        outcome.analysis.segments.clear();
        let preference = Preference::new("AI", "positive").unwrap();

        let text = format_as_text(&Report::Recommendations {
            outcome: &outcome,
            recommendations: &[],
            preference: &preference,
        });

        assert!(text.contains("No segments to recommend."));
    }

    #[test]
    fn test_json_output_roundtrips() {
        let outcome = fixture_outcome();
        let (recommendations, preference) = fixture_report(&outcome);

        let json = format_as_json(&Report::Recommendations {
            outcome: &outcome,
            recommendations: &recommendations,
            preference: &preference,
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["recommendations"][0]["rank"], 1);
        assert_eq!(value["source"]["transcript_id"], "tr_9");
        assert_eq!(value["preference"]["sentiment"], "positive");
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let mut outcome = fixture_outcome();
        outcome.analysis.segments[0].text = "a | b".into();
        let (recommendations, preference) = fixture_report(&outcome);

        let markdown = format_as_markdown(&Report::Recommendations {
            outcome: &outcome,
            recommendations: &recommendations,
            preference: &preference,
        });

        assert!(markdown.starts_with("# Recommendations for"));
        assert!(markdown.contains("a \\| b"));
    }

    #[test]
    fn test_csv_quotes_fields_with_commas() {
        let outcome = fixture_outcome();

        let csv = format_as_csv(&Report::Segments { outcome: &outcome });

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("start_ms,"));
        assert!(lines[2].contains("\"Football recap, with commentary\""));
    }
}
