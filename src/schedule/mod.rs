//! Duration planning and layer scheduling
//!
//! The planner decides how many times the clip pool is logically repeated to
//! approximate an optional target duration. The scheduler then derives one
//! [`LayerPlan`] per configured layer: an ordered clip sequence plus the
//! layer's pan, volume, and time offset copied positionally from the config.
//!
//! Scheduling is fully deterministic: shuffles use a PCG32 generator seeded
//! per layer (see [`rng`]), so the same pool and config always produce the
//! same schedules.

pub mod rng;

use log::{info, warn};
use rand::seq::SliceRandom;

use crate::config::{OrderPolicy, SpatialConfig};
use crate::error::{Result, SusurrusError};
use crate::pool::{Clip, ClipPool, PoolEstimate};

/// One layer's schedule and mix parameters.
#[derive(Debug, Clone)]
pub struct LayerPlan {
    pub layer_index: usize,
    /// Ordered clips, played back-to-back with no inserted gaps
    pub clip_sequence: Vec<Clip>,
    /// Stereo position in [-1, 1]; only meaningful for the stereo path
    pub pan_position: f64,
    /// Linear volume scale, >= 0
    pub volume: f64,
    /// Whole-layer start delay in seconds
    pub time_offset_secs: f64,
}

/// How many times the pool is logically concatenated with itself.
///
/// Targets are best-effort: the real output duration is always the true sum
/// of real clips. Repetition is the only lever, and it is minimal: the pool
/// never repeats when the estimate already meets the target.
pub fn plan_repeat_factor(config: &SpatialConfig, estimate: &PoolEstimate) -> usize {
    let target_minutes = match config.target_duration_minutes {
        Some(t) => t,
        None => return 1,
    };

    if !config.reuse {
        // Disjoint partitions cannot be repeated without breaking
        // disjointness; proceed with the material as-is.
        warn!(
            "target duration {:.1}min ignored: repetition requires reuse=true",
            target_minutes
        );
        return 1;
    }

    let target_secs = target_minutes * 60.0;
    if estimate.total_secs <= 0.0 {
        return 1;
    }
    if estimate.total_secs >= target_secs {
        return 1;
    }

    let factor = (target_secs / estimate.total_secs).ceil() as usize;
    info!(
        "repeating pool x{} to approximate {:.1}min (estimate {:.0}s per pass)",
        factor, target_minutes, estimate.total_secs
    );
    factor.max(1)
}

/// Derive one [`LayerPlan`] per configured layer.
///
/// With `reuse = true` every layer sees the whole (possibly repeated) pool;
/// with `reuse = false` the pool is split into contiguous near-equal
/// partitions and layer `i` receives partition `i`. The config must already
/// be validated; the only check here is that a partitioned pool has at least
/// one clip per layer.
pub fn schedule_layers(
    pool: &ClipPool,
    config: &SpatialConfig,
    repeat_factor: usize,
) -> Result<Vec<LayerPlan>> {
    if !config.reuse && config.num_layers > pool.len() {
        return Err(SusurrusError::config(format!(
            "cannot partition {} clips into {} disjoint layers",
            pool.len(),
            config.num_layers
        )));
    }

    let mut plans = Vec::with_capacity(config.num_layers);
    for i in 0..config.num_layers {
        let clip_sequence = if config.reuse {
            full_pool_sequence(pool, config, repeat_factor, i)
        } else {
            partition_sequence(pool, config, i)
        };
        debug_assert!(!clip_sequence.is_empty());

        plans.push(LayerPlan {
            layer_index: i,
            clip_sequence,
            pan_position: config.pan_positions[i],
            volume: config.volumes[i],
            time_offset_secs: config.time_offsets[i],
        });
    }

    info!(
        "scheduled {} layers ({} clips each, reuse={}, shuffle={})",
        plans.len(),
        plans.iter().map(|p| p.clip_sequence.len()).max().unwrap_or(0),
        config.reuse,
        config.shuffle
    );
    Ok(plans)
}

fn full_pool_sequence(
    pool: &ClipPool,
    config: &SpatialConfig,
    repeat_factor: usize,
    layer_index: usize,
) -> Vec<Clip> {
    let mut sequence: Vec<Clip> = Vec::with_capacity(pool.len() * repeat_factor);
    for _ in 0..repeat_factor {
        sequence.extend_from_slice(pool.clips());
    }

    if config.shuffle {
        shuffle_for_layer(&mut sequence, config.seed, layer_index);
    } else if config.order_policy == OrderPolicy::Rotated {
        sequence.rotate_left(layer_index % pool.len());
    }
    sequence
}

fn partition_sequence(pool: &ClipPool, config: &SpatialConfig, layer_index: usize) -> Vec<Clip> {
    let chunk = pool.len() / config.num_layers;
    let start = layer_index * chunk;
    // Last partition absorbs the remainder.
    let end = if layer_index == config.num_layers - 1 {
        pool.len()
    } else {
        start + chunk
    };

    let mut sequence = pool.clips()[start..end].to_vec();
    if config.shuffle {
        shuffle_for_layer(&mut sequence, config.seed, layer_index);
    }
    sequence
}

fn shuffle_for_layer(sequence: &mut [Clip], base_seed: u64, layer_index: usize) {
    let seed = rng::derive_layer_seed(base_seed, layer_index as u32);
    sequence.shuffle(&mut rng::create_rng(seed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use test_case::test_case;

    fn make_pool(n: usize) -> (tempfile::TempDir, ClipPool) {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..n {
            std::fs::write(dir.path().join(format!("clip_{:03}.mp3", i)), b"").unwrap();
        }
        let pool = ClipPool::scan(dir.path()).unwrap();
        (dir, pool)
    }

    fn make_config(num_layers: usize) -> SpatialConfig {
        SpatialConfig {
            num_layers,
            pan_positions: vec![0.0; num_layers],
            volumes: vec![1.0; num_layers],
            time_offsets: vec![0.0; num_layers],
            shuffle: true,
            reuse: true,
            target_duration_minutes: None,
            order_policy: OrderPolicy::Identical,
            seed: 0,
        }
    }

    fn estimate(total_secs: f64) -> PoolEstimate {
        PoolEstimate {
            sampled: 5,
            avg_clip_secs: total_secs / 10.0,
            total_secs,
        }
    }

    fn id_counts(clips: &[Clip]) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for clip in clips {
            *counts.entry(clip.id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    // === Duration planner ===

    #[test]
    fn test_no_target_means_single_pass() {
        let config = make_config(3);
        assert_eq!(plan_repeat_factor(&config, &estimate(120.0)), 1);
    }

    #[test_case(30.0, 600.0, 3 ; "short pool repeats")]
    #[test_case(10.0, 600.0, 1 ; "estimate already meets target")]
    #[test_case(10.0, 599.9, 2 ; "just short of target rounds up")]
    #[test_case(20.0, 400.0, 3 ; "exact division stays minimal")]
    fn test_repeat_factor(target_min: f64, est_secs: f64, expected: usize) {
        let mut config = make_config(3);
        config.target_duration_minutes = Some(target_min);
        assert_eq!(plan_repeat_factor(&config, &estimate(est_secs)), expected);
    }

    #[test]
    fn test_repeat_factor_meets_target_property() {
        let mut config = make_config(3);
        for target_min in [5.0, 17.0, 30.0, 90.0] {
            for est_secs in [45.0, 120.0, 333.0, 7200.0] {
                config.target_duration_minutes = Some(target_min);
                let factor = plan_repeat_factor(&config, &estimate(est_secs));
                let target_secs = target_min * 60.0;
                if est_secs >= target_secs {
                    assert_eq!(factor, 1, "never repeats unnecessarily");
                } else {
                    assert!(factor as f64 * est_secs >= target_secs);
                    assert!((factor - 1) as f64 * est_secs < target_secs, "minimal");
                }
            }
        }
    }

    #[test]
    fn test_no_reuse_ignores_target() {
        let mut config = make_config(3);
        config.reuse = false;
        config.target_duration_minutes = Some(60.0);
        assert_eq!(plan_repeat_factor(&config, &estimate(30.0)), 1);
    }

    // === Layer scheduler, reuse = true ===

    #[test]
    fn test_each_layer_is_a_permutation_of_the_pool() {
        let (_dir, pool) = make_pool(9);
        let config = make_config(3);
        let plans = schedule_layers(&pool, &config, 1).unwrap();

        assert_eq!(plans.len(), 3);
        let pool_counts = id_counts(pool.clips());
        for plan in &plans {
            assert_eq!(plan.clip_sequence.len(), 9);
            assert_eq!(id_counts(&plan.clip_sequence), pool_counts);
        }
    }

    #[test]
    fn test_shuffled_layers_differ() {
        let (_dir, pool) = make_pool(9);
        let config = make_config(3);
        let plans = schedule_layers(&pool, &config, 1).unwrap();

        let orders: Vec<Vec<&str>> = plans
            .iter()
            .map(|p| p.clip_sequence.iter().map(|c| c.id.as_str()).collect())
            .collect();
        assert_ne!(orders[0], orders[1]);
        assert_ne!(orders[1], orders[2]);
        assert_ne!(orders[0], orders[2]);
    }

    #[test]
    fn test_rerun_reproduces_identical_schedules() {
        let (_dir, pool) = make_pool(9);
        let config = make_config(3);

        let first = schedule_layers(&pool, &config, 2).unwrap();
        let second = schedule_layers(&pool, &config, 2).unwrap();
        for (a, b) in first.iter().zip(&second) {
            let ids_a: Vec<&str> = a.clip_sequence.iter().map(|c| c.id.as_str()).collect();
            let ids_b: Vec<&str> = b.clip_sequence.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(ids_a, ids_b);
        }
    }

    #[test]
    fn test_repeat_factor_multiplies_sequence() {
        let (_dir, pool) = make_pool(4);
        let config = make_config(2);
        let plans = schedule_layers(&pool, &config, 3).unwrap();

        for plan in &plans {
            assert_eq!(plan.clip_sequence.len(), 12);
            // Every clip appears exactly repeat_factor times.
            for count in id_counts(&plan.clip_sequence).values() {
                assert_eq!(*count, 3);
            }
        }
    }

    #[test]
    fn test_no_shuffle_identical_policy() {
        let (_dir, pool) = make_pool(5);
        let mut config = make_config(3);
        config.shuffle = false;

        let plans = schedule_layers(&pool, &config, 1).unwrap();
        let base: Vec<&str> = pool.clips().iter().map(|c| c.id.as_str()).collect();
        for plan in &plans {
            let ids: Vec<&str> = plan.clip_sequence.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(ids, base);
        }
    }

    #[test]
    fn test_no_shuffle_rotated_policy() {
        let (_dir, pool) = make_pool(5);
        let mut config = make_config(3);
        config.shuffle = false;
        config.order_policy = OrderPolicy::Rotated;

        let plans = schedule_layers(&pool, &config, 1).unwrap();
        let base: Vec<&str> = pool.clips().iter().map(|c| c.id.as_str()).collect();
        for (i, plan) in plans.iter().enumerate() {
            let ids: Vec<&str> = plan.clip_sequence.iter().map(|c| c.id.as_str()).collect();
            let mut expected = base.clone();
            expected.rotate_left(i);
            assert_eq!(ids, expected, "layer {} rotation", i);
        }
    }

    // === Layer scheduler, reuse = false ===

    #[test]
    fn test_partitions_are_disjoint_and_cover_pool() {
        let (_dir, pool) = make_pool(10);
        let mut config = make_config(3);
        config.reuse = false;
        config.shuffle = false;

        let plans = schedule_layers(&pool, &config, 1).unwrap();
        assert_eq!(plans[0].clip_sequence.len(), 3);
        assert_eq!(plans[1].clip_sequence.len(), 3);
        // Last partition absorbs the remainder.
        assert_eq!(plans[2].clip_sequence.len(), 4);

        let mut all: Vec<&str> = plans
            .iter()
            .flat_map(|p| p.clip_sequence.iter().map(|c| c.id.as_str()))
            .collect();
        all.sort_unstable();
        let mut expected: Vec<&str> = pool.clips().iter().map(|c| c.id.as_str()).collect();
        expected.sort_unstable();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_partitions_shuffle_within_layer() {
        let (_dir, pool) = make_pool(12);
        let mut config = make_config(2);
        config.reuse = false;

        let plans = schedule_layers(&pool, &config, 1).unwrap();
        let first_half = id_counts(&pool.clips()[..6]);
        assert_eq!(id_counts(&plans[0].clip_sequence), first_half);
    }

    #[test]
    fn test_more_layers_than_clips_rejected() {
        let (_dir, pool) = make_pool(2);
        let mut config = make_config(3);
        config.reuse = false;

        let err = schedule_layers(&pool, &config, 1).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    // === Positional parameters ===

    #[test]
    fn test_parameters_copied_positionally() {
        let (_dir, pool) = make_pool(3);
        let mut config = make_config(3);
        config.pan_positions = vec![-0.6, 0.0, 0.5];
        config.volumes = vec![0.7, 0.8, 0.6];
        config.time_offsets = vec![0.0, 5.0, 12.0];

        let plans = schedule_layers(&pool, &config, 1).unwrap();
        assert_eq!(plans[1].layer_index, 1);
        assert_eq!(plans[1].pan_position, 0.0);
        assert_eq!(plans[1].volume, 0.8);
        assert_eq!(plans[1].time_offset_secs, 5.0);
        assert_eq!(plans[2].pan_position, 0.5);
    }
}
