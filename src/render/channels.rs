//! Channel graph compiler (multichannel path)
//!
//! Produces an editable, unmixed asset: one original layer per output
//! channel, intended for downstream manual mixing. No panning and no mixing
//! happen here: channel `k` is layer `k` verbatim, delayed by its offset
//! and padded with silence so every channel ends at exactly the same sample.
//!
//! Padding works from measured post-concat durations, never estimates: each
//! built track is probed, and the shared duration is the maximum of
//! `duration + offset` over all layers. If any track cannot be measured the
//! render is abandoned before the engine is asked to join anything.

use std::path::Path;

use log::info;

use crate::engine::{AudioEngine, OutputEncoding, RenderJob};
use crate::error::Result;
use crate::graph::{FilterOp, ProcessingGraph};
use crate::render::tracks::LayerTrack;
use crate::schedule::LayerPlan;

/// Shared channel duration: `max(duration_i + offset_i)` over all layers.
pub fn shared_duration(durations: &[f64], offsets: &[f64]) -> f64 {
    durations
        .iter()
        .zip(offsets)
        .map(|(d, o)| d + o)
        .fold(0.0, f64::max)
}

/// Compile the multichannel graph over `plans.len()` source streams.
///
/// Per layer `i`: `[i:a] Delay → Pad(shared) → [q<i>]`; all padded streams
/// feed one Join node labeled `out`.
pub fn compile_channel_graph(plans: &[LayerPlan], measured_secs: &[f64]) -> ProcessingGraph {
    let offsets: Vec<f64> = plans.iter().map(|p| p.time_offset_secs).collect();
    let shared = shared_duration(measured_secs, &offsets);

    let mut graph = ProcessingGraph::new();
    let mut padded = Vec::with_capacity(plans.len());
    for (i, plan) in plans.iter().enumerate() {
        let millis = (plan.time_offset_secs * 1000.0).round() as u64;
        graph.push(format!("{i}:a"), FilterOp::Delay { millis }, format!("d{i}"));
        graph.push(
            format!("d{i}"),
            FilterOp::Pad {
                whole_duration_secs: shared,
            },
            format!("q{i}"),
        );
        padded.push(format!("q{i}"));
    }

    graph.push_many(padded, FilterOp::Join { inputs: plans.len() }, "out");
    graph
}

/// Probe every built track, compile the channel graph, and render it to an
/// N-channel PCM asset in a single engine invocation.
///
/// `output` should live inside the run's working directory; the caller
/// persists it to the user-visible path only after success, so a failed
/// join never leaves a partial file at the configured location.
pub fn render_channels<E: AudioEngine>(
    engine: &E,
    plans: &[LayerPlan],
    tracks: &[LayerTrack],
    output: &Path,
) -> Result<()> {
    debug_assert_eq!(plans.len(), tracks.len());

    let mut measured = Vec::with_capacity(tracks.len());
    for track in tracks {
        measured.push(engine.probe(&track.path)?);
    }

    let offsets: Vec<f64> = plans.iter().map(|p| p.time_offset_secs).collect();
    info!(
        "channel-aligning {} layers to {:.2}s",
        plans.len(),
        shared_duration(&measured, &offsets)
    );

    let job = RenderJob {
        inputs: tracks.iter().map(|t| t.path.clone()).collect(),
        graph: compile_channel_graph(plans, &measured),
        output_label: "out".to_string(),
        encoding: OutputEncoding::PcmWav,
        output: output.to_path_buf(),
    };
    engine.render(&job)
}
