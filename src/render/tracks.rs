//! Layer track builder
//!
//! Compiles each layer's ordered clip sequence into one continuous
//! concatenated track via the external engine, using lossless stream copy.
//! No per-clip gaps are inserted here; the only gap a layer ever gets is its
//! whole-layer time offset, applied later by the graph compilers.

use std::path::{Path, PathBuf};

use log::info;

use crate::engine::AudioEngine;
use crate::error::Result;
use crate::schedule::LayerPlan;

/// A temporary concatenated track for one layer.
///
/// Lives inside the run's working directory; the file name embeds the layer
/// index so tracks never collide within a run.
#[derive(Debug, Clone)]
pub struct LayerTrack {
    pub layer_index: usize,
    pub path: PathBuf,
}

/// Build one track per plan, in layer order.
///
/// A concatenation failure is fatal for the whole mixing run: a mix missing
/// one layer's material is never produced. Already-built tracks are owned by
/// the run scope and removed with it.
pub fn build_layer_tracks<E: AudioEngine>(
    engine: &E,
    plans: &[LayerPlan],
    workdir: &Path,
) -> Result<Vec<LayerTrack>> {
    let mut tracks = Vec::with_capacity(plans.len());

    for plan in plans {
        let path = workdir.join(format!("layer_{}.mp3", plan.layer_index));
        let inputs: Vec<PathBuf> = plan
            .clip_sequence
            .iter()
            .map(|clip| clip.path.clone())
            .collect();

        info!(
            "building layer {} track ({} clips)",
            plan.layer_index,
            inputs.len()
        );
        engine.concatenate(&inputs, &path)?;

        tracks.push(LayerTrack {
            layer_index: plan.layer_index,
            path,
        });
    }

    Ok(tracks)
}
