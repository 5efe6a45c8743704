//! Ranking of analyzed segments against user preferences.
//!
//! Scores combine a topic term (sum of relevance over detected topics that
//! match a preferred topic) and a sentiment term (exact match, or a reduced
//! credit when one side is neutral). Every segment is scored and returned;
//! callers decide how many recommendations to show.

use serde::{Deserialize, Serialize};

use crate::analysis::{Segment, Sentiment};
use crate::{ClipscoutError, Result};

/// Credit for a sentiment pairing where exactly one side is neutral
pub const ADJACENT_SENTIMENT_BONUS: f64 = 0.25;

/// What the user wants to hear about, and in what mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    /// Preferred topics, trimmed and deduplicated (may be empty)
    pub topics: Vec<String>,

    /// Preferred sentiment
    pub sentiment: Sentiment,
}

impl Preference {
    /// Build a preference from a comma-separated topic list and a sentiment
    /// label. Topics are trimmed and case-insensitively deduplicated; empty
    /// entries are dropped. An empty topic list is valid and yields a
    /// sentiment-only ranking.
    pub fn new(topics: &str, sentiment: &str) -> Result<Self> {
        let sentiment: Sentiment = sentiment.parse()?;

        let mut seen: Vec<String> = Vec::new();
        let mut cleaned: Vec<String> = Vec::new();
        for topic in topics.split(',') {
            let topic = topic.trim();
            if topic.is_empty() {
                continue;
            }
            let folded = topic.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            cleaned.push(topic.to_string());
        }

        Ok(Self {
            topics: cleaned,
            sentiment,
        })
    }
}

/// Relative weight of the topic and sentiment terms in the final score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub topic_weight: f64,
    pub sentiment_weight: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            topic_weight: 0.7,
            sentiment_weight: 0.3,
        }
    }
}

impl MatchWeights {
    /// Reject weights that cannot produce a meaningful ordering
    pub fn validate(&self) -> Result<()> {
        if !self.topic_weight.is_finite() || !self.sentiment_weight.is_finite() {
            return Err(ClipscoutError::Config(format!(
                "match weights must be finite (topic: {}, sentiment: {})",
                self.topic_weight, self.sentiment_weight
            ))
            .into());
        }
        if self.topic_weight < 0.0 || self.sentiment_weight < 0.0 {
            return Err(ClipscoutError::Config(format!(
                "match weights must be non-negative (topic: {}, sentiment: {})",
                self.topic_weight, self.sentiment_weight
            ))
            .into());
        }
        if self.topic_weight + self.sentiment_weight <= 0.0 {
            return Err(
                ClipscoutError::Config("match weights must not both be zero".into()).into(),
            );
        }
        Ok(())
    }
}

/// A scored segment with its 1-based position in the ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub segment: Segment,

    /// Combined topic/sentiment score (higher is better)
    pub score: f64,

    /// 1-based rank after sorting
    pub rank: usize,

    /// Labels of the detected topics that matched a preferred topic
    pub matched_topics: Vec<String>,
}

/// Score every segment against the preference and sort best-first.
///
/// Ordering is deterministic: descending score, then ascending start time.
/// Segments are never filtered out, so the result always has the same length
/// as the input.
pub fn rank(segments: &[Segment], preference: &Preference, weights: &MatchWeights) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = segments
        .iter()
        .map(|segment| {
            let (topic_term, matched_topics) = topic_term(segment, preference);
            let sentiment_term = sentiment_term(segment.sentiment.label, preference.sentiment);
            let score =
                weights.topic_weight * topic_term + weights.sentiment_weight * sentiment_term;
            Recommendation {
                segment: segment.clone(),
                score,
                rank: 0,
                matched_topics,
            }
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.segment.start_ms.cmp(&b.segment.start_ms))
    });

    for (index, recommendation) in recommendations.iter_mut().enumerate() {
        recommendation.rank = index + 1;
    }

    recommendations
}

/// Sum of relevance over detected topics matching any preferred topic,
/// together with the labels that matched
fn topic_term(segment: &Segment, preference: &Preference) -> (f64, Vec<String>) {
    let mut term = 0.0;
    let mut matched = Vec::new();

    for topic in &segment.topics {
        if preference
            .topics
            .iter()
            .any(|preferred| topic_matches(preferred, &topic.label))
        {
            term += topic.relevance;
            matched.push(topic.label.clone());
        }
    }

    (term, matched)
}

/// Sentiment credit: full on exact match, partial when exactly one side is
/// neutral, none for opposed polarities
fn sentiment_term(segment: Sentiment, preferred: Sentiment) -> f64 {
    if segment == preferred {
        1.0
    } else if segment == Sentiment::Neutral || preferred == Sentiment::Neutral {
        ADJACENT_SENTIMENT_BONUS
    } else {
        0.0
    }
}

/// Whether a detected taxonomy label satisfies a preferred topic.
///
/// Both sides are normalized (lowercased, non-alphanumerics stripped) so
/// "Artificial Intelligence" matches the "ArtificialIntelligence" component.
/// A preference matches on the whole label, on any ">"-separated component,
/// or as a substring of the label.
fn topic_matches(preferred: &str, label: &str) -> bool {
    let preferred = normalize(preferred);
    if preferred.is_empty() {
        return false;
    }

    let whole = normalize(label);
    if whole == preferred {
        return true;
    }

    if label
        .split('>')
        .any(|component| normalize(component) == preferred)
    {
        return true;
    }

    whole.contains(&preferred)
}

/// Case-fold and drop everything that is not a letter or digit
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
