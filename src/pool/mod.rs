//! Clip pool inventory
//!
//! Discovers rendered speech clips in a directory and estimates how much
//! material the pool holds. Discovery order is deterministic (lexicographic
//! by file name) so scheduling is reproducible across runs.
//!
//! Clip durations are measured lazily: only a bounded sample is probed to
//! estimate the aggregate, since the estimate feeds a best-effort duration
//! target, never channel alignment.

use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::engine::AudioEngine;
use crate::error::{Result, SusurrusError};

/// File suffixes recognized as audio clips.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg"];

/// How many clips to probe when estimating average duration.
const PROBE_SAMPLE_SIZE: usize = 5;

/// One discovered clip. Immutable once discovered; owned by the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// File stem, unique within the pool directory
    pub id: String,
    pub path: PathBuf,
    /// Measured duration in seconds, if this clip has been probed
    pub duration: Option<f64>,
}

/// Duration estimate derived from a probed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolEstimate {
    pub sampled: usize,
    pub avg_clip_secs: f64,
    /// `avg_clip_secs × pool size`, before any repetition
    pub total_secs: f64,
}

/// Deterministically ordered collection of clips.
#[derive(Debug, Clone)]
pub struct ClipPool {
    clips: Vec<Clip>,
}

impl ClipPool {
    /// Scan a directory (non-recursive) for audio clips.
    ///
    /// Returns `EmptyPool` if nothing matches; the run cannot proceed
    /// without material.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut clips: Vec<Clip> = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !has_audio_extension(path) {
                continue;
            }

            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("discovered clip {}", path.display());
            clips.push(Clip {
                id,
                path: path.to_path_buf(),
                duration: None,
            });
        }

        if clips.is_empty() {
            return Err(SusurrusError::EmptyPool {
                dir: dir.display().to_string(),
            });
        }

        info!("found {} clips in {}", clips.len(), dir.display());
        Ok(ClipPool { clips })
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Estimate average and aggregate duration by probing up to
    /// [`PROBE_SAMPLE_SIZE`] clips. Measured durations are recorded on the
    /// sampled clips.
    pub fn estimate<E: AudioEngine>(&mut self, engine: &E) -> Result<PoolEstimate> {
        let sample = self.clips.len().min(PROBE_SAMPLE_SIZE);
        let mut total = 0.0;
        for clip in &mut self.clips[..sample] {
            let secs = engine.probe(&clip.path)?;
            clip.duration = Some(secs);
            total += secs;
        }

        let avg = total / sample as f64;
        let estimate = PoolEstimate {
            sampled: sample,
            avg_clip_secs: avg,
            total_secs: avg * self.clips.len() as f64,
        };
        info!(
            "pool estimate: {} clips, avg {:.1}s, total ~{:.0}s (sampled {})",
            self.clips.len(),
            estimate.avg_clip_secs,
            estimate.total_secs,
            estimate.sampled
        );
        Ok(estimate)
    }
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FixedProbe {
        secs: f64,
        calls: std::cell::Cell<usize>,
    }

    impl AudioEngine for FixedProbe {
        fn probe(&self, _path: &Path) -> Result<f64> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.secs)
        }

        fn concatenate(&self, _inputs: &[PathBuf], _output: &Path) -> Result<()> {
            unreachable!("inventory never concatenates")
        }

        fn render(&self, _job: &crate::engine::RenderJob) -> Result<()> {
            unreachable!("inventory never renders")
        }
    }

    fn touch_clips(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_scan_orders_lexicographically() {
        let dir = tempfile::tempdir().unwrap();
        touch_clips(
            dir.path(),
            &["clip_003.mp3", "clip_001.mp3", "clip_002.mp3"],
        );

        let pool = ClipPool::scan(dir.path()).unwrap();
        let ids: Vec<&str> = pool.clips().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["clip_001", "clip_002", "clip_003"]);
    }

    #[test]
    fn test_scan_ignores_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        touch_clips(
            dir.path(),
            &["clip_001.mp3", "notes.txt", "concat_list.txt", "b.wav"],
        );
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let pool = ClipPool::scan(dir.path()).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_empty_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClipPool::scan(dir.path()).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_POOL");
    }

    #[test]
    fn test_estimate_probes_bounded_sample() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..8).map(|i| format!("clip_{:03}.mp3", i)).collect();
        for name in &names {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let mut pool = ClipPool::scan(dir.path()).unwrap();
        let engine = FixedProbe {
            secs: 4.0,
            calls: std::cell::Cell::new(0),
        };
        let estimate = pool.estimate(&engine).unwrap();

        assert_eq!(engine.calls.get(), 5);
        assert_eq!(estimate.sampled, 5);
        assert!((estimate.avg_clip_secs - 4.0).abs() < 1e-9);
        assert!((estimate.total_secs - 32.0).abs() < 1e-9);

        // Sampled clips carry their measured duration; the rest stay lazy.
        assert_eq!(pool.clips()[0].duration, Some(4.0));
        assert_eq!(pool.clips()[7].duration, None);
    }

    #[test]
    fn test_estimate_small_pool() {
        let dir = tempfile::tempdir().unwrap();
        touch_clips(dir.path(), &["clip_001.mp3", "clip_002.mp3"]);

        let mut pool = ClipPool::scan(dir.path()).unwrap();
        let engine = FixedProbe {
            secs: 3.0,
            calls: std::cell::Cell::new(0),
        };
        let estimate = pool.estimate(&engine).unwrap();
        assert_eq!(estimate.sampled, 2);
        assert!((estimate.total_secs - 6.0).abs() < 1e-9);
    }
}
