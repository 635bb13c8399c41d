//! Susurrus - Layered Conversation Soundscape Compiler
//!
//! Susurrus turns a directory of independently rendered short speech clips
//! into synchronized multi-layer audio: a perceptual stereo "positioned
//! conversation" mix, an editable unmixed multichannel asset, or both,
//! optionally stretched toward a target total duration by reusing the pool.
//!
//! # Architecture
//!
//! The pipeline runs in dependency order:
//! - [`pool`] discovers clips and estimates how much material exists
//! - [`schedule`] decides pool repetition and derives per-layer clip
//!   sequences with pan/volume/offset parameters
//! - [`render`] builds per-layer concatenated tracks, compiles a
//!   processing [`graph`], and drives the external [`engine`]
//!
//! All signal processing is delegated: the crate only decides *what* to
//! process and compiles those decisions into a graph the external engine
//! executes in a single invocation.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod pool;
pub mod render;
pub mod schedule;

pub use error::{Result, SusurrusError};
