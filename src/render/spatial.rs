//! Spatial graph compiler (stereo path)
//!
//! Compiles one processing graph that delays, scales, and pans every layer
//! track, then mixes all layers into a single stereo master. The mix uses a
//! `duration = longest` policy (the output is as long as the longest
//! offset-adjusted layer, never the sum) with a short dropout transition so
//! an ending layer fades instead of clicking.

use std::path::Path;

use log::info;

use crate::engine::{AudioEngine, OutputEncoding, RenderJob};
use crate::error::Result;
use crate::graph::{FilterOp, ProcessingGraph};
use crate::render::tracks::LayerTrack;
use crate::schedule::LayerPlan;

/// Fade length when a layer's material runs out before the mix ends.
const DROPOUT_TRANSITION_SECS: u32 = 2;

/// Linear pan law.
///
/// `pan = -1` puts everything left, `0` splits equally, `+1` puts everything
/// right; `volume` scales both sides uniformly.
pub fn pan_gains(pan: f64, volume: f64) -> (f64, f64) {
    let left = (1.0 - pan) / 2.0 * volume;
    let right = (1.0 + pan) / 2.0 * volume;
    (left, right)
}

/// Compile the stereo graph over `plans.len()` source streams.
///
/// Per layer `i`: `[i:a] Delay → Volume → Pan → [p<i>]`; all panned streams
/// feed one Mix node labeled `out`.
pub fn compile_spatial_graph(plans: &[LayerPlan]) -> ProcessingGraph {
    let mut graph = ProcessingGraph::new();
    let mut panned = Vec::with_capacity(plans.len());

    for (i, plan) in plans.iter().enumerate() {
        let (left_gain, right_gain) = pan_gains(plan.pan_position, plan.volume);
        let millis = (plan.time_offset_secs * 1000.0).round() as u64;

        graph.push(format!("{i}:a"), FilterOp::Delay { millis }, format!("d{i}"));
        graph.push(
            format!("d{i}"),
            FilterOp::Volume { gain: plan.volume },
            format!("v{i}"),
        );
        graph.push(
            format!("v{i}"),
            FilterOp::Pan {
                left_gain,
                right_gain,
            },
            format!("p{i}"),
        );
        panned.push(format!("p{i}"));
    }

    graph.push_many(
        panned,
        FilterOp::Mix {
            inputs: plans.len(),
            dropout_transition_secs: DROPOUT_TRANSITION_SECS,
        },
        "out",
    );
    graph
}

/// Compile and render the stereo mix in a single engine invocation.
///
/// `output` should live inside the run's working directory; the caller
/// persists it to the user-visible path only after success.
pub fn render_stereo<E: AudioEngine>(
    engine: &E,
    plans: &[LayerPlan],
    tracks: &[LayerTrack],
    output: &Path,
) -> Result<()> {
    debug_assert_eq!(plans.len(), tracks.len());

    let graph = compile_spatial_graph(plans);
    for plan in plans {
        let side = if plan.pan_position < -0.3 {
            "left"
        } else if plan.pan_position > 0.3 {
            "right"
        } else {
            "center"
        };
        info!(
            "layer {}: {} | vol {:.2} | offset {:.1}s",
            plan.layer_index, side, plan.volume, plan.time_offset_secs
        );
    }

    let job = RenderJob {
        inputs: tracks.iter().map(|t| t.path.clone()).collect(),
        graph,
        output_label: "out".to_string(),
        encoding: OutputEncoding::Mp3HighQuality,
        output: output.to_path_buf(),
    };
    engine.render(&job)
}
