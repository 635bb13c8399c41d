//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command. Commands construct the
//! ffmpeg-backed engine; everything else goes through the library pipeline.

use std::path::Path;

use log::info;

use crate::config::{OutputSpec, SpatialConfig};
use crate::engine::FfmpegEngine;
use crate::error::Result;
use crate::pool::ClipPool;
use crate::render;
use crate::schedule;

/// Schedule layers and render the requested outputs.
pub fn render(
    clips: &Path,
    config_path: &Path,
    stereo_out: Option<&Path>,
    channels_out: Option<&Path>,
    target_minutes: Option<f64>,
) -> Result<()> {
    info!("rendering soundscape from {}", clips.display());

    let mut config = SpatialConfig::from_file(config_path)?;
    if let Some(minutes) = target_minutes {
        config.target_duration_minutes = Some(minutes);
    }

    let outputs = OutputSpec {
        stereo: stereo_out.map(Path::to_path_buf),
        channels: channels_out.map(Path::to_path_buf),
    };

    let engine = FfmpegEngine::locate()?;
    let outcome = render::run(&engine, clips, &config, &outputs)?;

    if let Some(path) = &outcome.stereo {
        println!("Stereo soundscape: {}", path.display());
    }
    if let Some(path) = &outcome.channels {
        println!("Multichannel asset: {}", path.display());
    }

    Ok(())
}

/// Print the layer schedules a render would use, without rendering.
///
/// Probes the pool sample (the duration planner needs the estimate) but
/// never builds tracks or invokes a render.
pub fn plan(clips: &Path, config_path: &Path) -> Result<()> {
    let config = SpatialConfig::from_file(config_path)?;

    let engine = FfmpegEngine::locate()?;
    let mut pool = ClipPool::scan(clips)?;
    let estimate = pool.estimate(&engine)?;
    let repeat_factor = schedule::plan_repeat_factor(&config, &estimate);
    let plans = schedule::schedule_layers(&pool, &config, repeat_factor)?;

    println!(
        "Pool: {} clips, ~{:.0}s total (avg {:.1}s, sampled {})",
        pool.len(),
        estimate.total_secs,
        estimate.avg_clip_secs,
        estimate.sampled
    );
    println!("Repeat factor: {}", repeat_factor);
    println!();

    for plan in &plans {
        println!(
            "Layer {} | pan {:+.2} | vol {:.2} | offset {:.1}s | {} clips",
            plan.layer_index,
            plan.pan_position,
            plan.volume,
            plan.time_offset_secs,
            plan.clip_sequence.len()
        );
        let preview: Vec<&str> = plan
            .clip_sequence
            .iter()
            .take(8)
            .map(|c| c.id.as_str())
            .collect();
        let ellipsis = if plan.clip_sequence.len() > 8 { " ..." } else { "" };
        println!("  {}{}", preview.join(", "), ellipsis);
    }

    Ok(())
}

/// List the discovered clip pool in schedule order.
pub fn pool(clips: &Path) -> Result<()> {
    let pool = ClipPool::scan(clips)?;

    println!("{} clips in {}:", pool.len(), clips.display());
    for clip in pool.clips() {
        println!("  {}", clip.path.display());
    }

    Ok(())
}
