//! Render pipeline
//!
//! Sequences one run: inventory → duration planning → layer scheduling →
//! layer track building → graph compilation and rendering for each requested
//! output. Everything executes on a single logical thread; every engine
//! invocation is synchronous and blocking.
//!
//! Each render request walks an explicit phase machine
//! (`Planned → TracksBuilt → GraphCompiled → Rendered | Failed`). All
//! intermediate layer tracks live in a run-scoped temporary directory that
//! is removed on every exit path, so no duplicated cleanup blocks and no
//! partial-success state: a render either yields one fully valid output file
//! at the configured path or nothing at all.

pub mod channels;
pub mod spatial;
pub mod tracks;

use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::TempDir;

use crate::config::{OutputSpec, SpatialConfig};
use crate::engine::AudioEngine;
use crate::error::Result;
use crate::pool::ClipPool;
use crate::schedule::{self, LayerPlan};

pub use tracks::LayerTrack;

/// Phases of one render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Planned,
    TracksBuilt,
    GraphCompiled,
    Rendered,
    Failed,
}

/// Tracks one render request through its phases and logs transitions.
///
/// If the request is dropped before reaching `Rendered`, it is marked
/// `Failed`; `Failed` is reachable from any phase.
struct RenderRequest {
    label: &'static str,
    phase: RenderPhase,
}

impl RenderRequest {
    fn new(label: &'static str) -> Self {
        info!("{}: planned", label);
        Self {
            label,
            phase: RenderPhase::Planned,
        }
    }

    fn advance(&mut self, next: RenderPhase) {
        info!("{}: {:?} -> {:?}", self.label, self.phase, next);
        self.phase = next;
    }
}

impl Drop for RenderRequest {
    fn drop(&mut self) {
        if self.phase != RenderPhase::Rendered {
            self.phase = RenderPhase::Failed;
            warn!("{}: failed", self.label);
        }
    }
}

/// Run-scoped temporary file set.
///
/// All layer tracks and not-yet-persisted render outputs live here; the
/// directory (and everything in it) is removed when the scope drops,
/// success or failure.
pub struct RunScope {
    workdir: TempDir,
}

impl RunScope {
    pub fn new() -> Result<Self> {
        let workdir = tempfile::Builder::new().prefix("susurrus-").tempdir()?;
        Ok(Self { workdir })
    }

    pub fn path(&self) -> &Path {
        self.workdir.path()
    }
}

/// Outputs persisted by a successful run.
#[derive(Debug, Default)]
pub struct RenderOutcome {
    pub stereo: Option<PathBuf>,
    pub channels: Option<PathBuf>,
    pub plans: Vec<LayerPlan>,
}

/// Execute one full run against the given engine.
///
/// Config and output validation happen eagerly, before the clip pool is
/// scanned and before any engine invocation. A sibling output already
/// rendered successfully earlier in the run survives a later compiler's
/// failure.
pub fn run<E: AudioEngine>(
    engine: &E,
    clips_dir: &Path,
    config: &SpatialConfig,
    outputs: &OutputSpec,
) -> Result<RenderOutcome> {
    config.validate()?;
    outputs.validate()?;

    let mut pool = ClipPool::scan(clips_dir)?;
    // Without a target the estimate is never consulted, so a run that only
    // needs the stereo path stays probe-free.
    let repeat_factor = if config.target_duration_minutes.is_some() {
        let estimate = pool.estimate(engine)?;
        schedule::plan_repeat_factor(config, &estimate)
    } else {
        1
    };
    let plans = schedule::schedule_layers(&pool, config, repeat_factor)?;

    let scope = RunScope::new()?;
    let built = tracks::build_layer_tracks(engine, &plans, scope.path())?;

    let mut outcome = RenderOutcome {
        plans: plans.clone(),
        ..Default::default()
    };

    if let Some(stereo_path) = &outputs.stereo {
        let mut request = RenderRequest::new("stereo mix");
        request.advance(RenderPhase::TracksBuilt);

        let staged = scope.path().join("stereo_mix.mp3");
        request.advance(RenderPhase::GraphCompiled);
        spatial::render_stereo(engine, &plans, &built, &staged)?;
        persist_output(&staged, stereo_path)?;
        request.advance(RenderPhase::Rendered);

        info!("stereo soundscape written to {}", stereo_path.display());
        outcome.stereo = Some(stereo_path.clone());
    }

    if let Some(channels_path) = &outputs.channels {
        let mut request = RenderRequest::new("channel join");
        request.advance(RenderPhase::TracksBuilt);

        let staged = scope.path().join("channels.wav");
        request.advance(RenderPhase::GraphCompiled);
        channels::render_channels(engine, &plans, &built, &staged)?;
        persist_output(&staged, channels_path)?;
        request.advance(RenderPhase::Rendered);

        info!("multichannel asset written to {}", channels_path.display());
        outcome.channels = Some(channels_path.clone());
    }

    Ok(outcome)
}

/// Move a fully rendered file from the run scope to its user-visible path.
///
/// The run scope usually sits on a different filesystem than the output, so
/// a direct rename can fail. In that case the file is copied to a sibling
/// name in the destination directory first and renamed into place; the
/// user-visible path only ever receives a same-filesystem rename, so a copy
/// that dies mid-write leaves its truncated bytes in the sibling, never at
/// the configured location.
fn persist_output(staged: &Path, final_path: &Path) -> Result<()> {
    if let Some(parent) = final_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if std::fs::rename(staged, final_path).is_ok() {
        return Ok(());
    }

    let sibling = staging_sibling(final_path);
    let staged_copy = std::fs::copy(staged, &sibling).and_then(|_| {
        std::fs::rename(&sibling, final_path)
    });
    if let Err(e) = staged_copy {
        let _ = std::fs::remove_file(&sibling);
        return Err(e.into());
    }
    let _ = std::fs::remove_file(staged);
    Ok(())
}

/// Sibling temp name next to the final path, e.g. `mix.mp3.part`.
fn staging_sibling(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
