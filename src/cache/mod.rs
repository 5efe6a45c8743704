//! On-disk cache of completed analyses, keyed by audio content.
//!
//! The key is an xxh3 hash of the downloaded audio bytes, so re-running the
//! tool against the same video (or the same local file under a new name) skips
//! the upload and polling round trip entirely. Entries are plain JSON files; a
//! missing or unreadable entry is treated as a cache miss, never an error.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::analysis::Analysis;

pub struct AnalysisCache {
    dir: PathBuf,
    enabled: bool,
}

impl AnalysisCache {
    /// Create a cache rooted at the platform cache directory
    pub fn new(enabled: bool) -> Result<Self> {
        if !enabled {
            return Ok(Self {
                dir: PathBuf::new(),
                enabled,
            });
        }

        let dir = dirs::cache_dir()
            .context("Could not determine cache directory")?
            .join("clipscout")
            .join("analysis");

        Ok(Self { dir, enabled })
    }

    /// Create a cache rooted at an explicit directory
    pub fn with_dir(dir: PathBuf, enabled: bool) -> Self {
        Self { dir, enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Content fingerprint of an audio file
    pub fn fingerprint(&self, path: &Path) -> Result<u64> {
        let bytes = fs_err::read(path)?;
        Ok(xxh3_64(&bytes))
    }

    fn entry_path(&self, fingerprint: u64) -> PathBuf {
        self.dir.join(format!("{fingerprint:016x}.json"))
    }

    /// Look up a cached analysis. Any read or parse failure is a miss.
    pub fn load(&self, fingerprint: u64) -> Option<Analysis> {
        let path = self.entry_path(fingerprint);
        let content = match fs_err::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache entry at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(analysis) => {
                debug!("Cache hit: {}", path.display());
                Some(analysis)
            }
            Err(e) => {
                warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write an analysis under its fingerprint
    pub fn store(&self, fingerprint: u64, analysis: &Analysis) -> Result<()> {
        fs_err::create_dir_all(&self.dir)?;

        let path = self.entry_path(fingerprint);
        let content =
            serde_json::to_string_pretty(analysis).context("Failed to serialize analysis")?;
        fs_err::write(&path, content)?;

        debug!("Stored analysis at {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisMetadata, Segment, Sentiment, SentimentScore};
    use std::io::Write;

    fn sample_analysis() -> Analysis {
        Analysis {
            segments: vec![Segment {
                start_ms: 0,
                end_ms: 1000,
                text: "hello".into(),
                topics: vec![],
                sentiment: SentimentScore {
                    label: Sentiment::Neutral,
                    confidence: 0.0,
                },
            }],
            transcript: "hello".into(),
            metadata: AnalysisMetadata {
                transcript_id: "tr_42".into(),
                audio_duration_secs: Some(1.0),
                processing_duration_secs: None,
                completed_at: chrono::Utc::now(),
            },
        }
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::with_dir(dir.path().to_path_buf(), true);

        let analysis = sample_analysis();
        cache.store(0xfeed, &analysis).unwrap();

        let loaded = cache.load(0xfeed).expect("entry should be present");
        assert_eq!(loaded.segments, analysis.segments);
        assert_eq!(loaded.metadata.transcript_id, "tr_42");
    }

    #[test]
    fn test_missing_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::with_dir(dir.path().to_path_buf(), true);
        assert!(cache.load(0xdead).is_none());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::with_dir(dir.path().to_path_buf(), true);

        let path = cache.entry_path(0xbeef);
        fs_err::create_dir_all(dir.path()).unwrap();
        let mut file = fs_err::File::create(&path).unwrap();
        file.write_all(b"{ not json").unwrap();

        assert!(cache.load(0xbeef).is_none());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::with_dir(dir.path().to_path_buf(), true);

        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        let c = dir.path().join("c.mp3");
        fs_err::write(&a, b"same bytes").unwrap();
        fs_err::write(&b, b"same bytes").unwrap();
        fs_err::write(&c, b"other bytes").unwrap();

        assert_eq!(
            cache.fingerprint(&a).unwrap(),
            cache.fingerprint(&b).unwrap()
        );
        assert_ne!(
            cache.fingerprint(&a).unwrap(),
            cache.fingerprint(&c).unwrap()
        );
    }
}
