//! External audio engine boundary
//!
//! All signal processing is delegated to an external engine through the
//! [`AudioEngine`] trait: lossless concatenation, duration probing, and
//! rendering of a compiled [`ProcessingGraph`]. The shipped implementation
//! shells out to ffmpeg/ffprobe; tests substitute a mock.
//!
//! Invocations are synchronous and blocking, exit code 0 means success, and
//! failures are never retried: a non-zero exit is treated as a deterministic
//! consequence of a bad graph or bad input.

use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;

use crate::error::{Result, SusurrusError};
use crate::graph::ProcessingGraph;

/// Encoding applied to a rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// High-quality compressed stereo (libmp3lame, VBR q2)
    Mp3HighQuality,
    /// Uncompressed 16-bit PCM, channel count preserved
    PcmWav,
}

/// One render request: input files, a compiled graph, and where the labeled
/// output stream goes.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub inputs: Vec<PathBuf>,
    pub graph: ProcessingGraph,
    pub output_label: String,
    pub encoding: OutputEncoding,
    pub output: PathBuf,
}

/// The three operations this system needs from its audio collaborator.
pub trait AudioEngine {
    /// Measure a file's duration in seconds.
    fn probe(&self, path: &Path) -> Result<f64>;

    /// Concatenate files in order into one track using lossless stream copy.
    fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;

    /// Execute a compiled processing graph in a single invocation.
    fn render(&self, job: &RenderJob) -> Result<()>;
}

/// ffmpeg/ffprobe-backed engine.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegEngine {
    /// Locate ffmpeg and ffprobe.
    ///
    /// `SUSURRUS_FFMPEG` / `SUSURRUS_FFPROBE` override the executables;
    /// otherwise both are resolved from PATH.
    pub fn locate() -> Result<Self> {
        Ok(Self {
            ffmpeg: resolve_tool("ffmpeg", "SUSURRUS_FFMPEG")?,
            ffprobe: resolve_tool("ffprobe", "SUSURRUS_FFPROBE")?,
        })
    }

    /// Use explicit executable paths (no PATH lookup).
    pub fn with_paths(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn run(&self, operation: &str, program: &Path, args: &[OsString]) -> Result<Output> {
        debug!("{}: {} {:?}", operation, program.display(), args);

        let output = Command::new(program).args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SusurrusError::Engine {
                operation: operation.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: last_lines(&stderr, 8),
            });
        }
        Ok(output)
    }
}

impl AudioEngine for FfmpegEngine {
    fn probe(&self, path: &Path) -> Result<f64> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            path.into(),
        ];

        let output = self
            .run("probe", &self.ffprobe, &args)
            .map_err(|e| SusurrusError::Probe {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse::<f64>()
            .map_err(|e| SusurrusError::Probe {
                path: path.display().to_string(),
                reason: format!("unparseable duration {:?}: {}", text.trim(), e),
            })
    }

    fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        // The concat demuxer reads entries from a list file; the list sits
        // next to the output so it shares the run's temp lifetime.
        let list_path = output.with_extension("concat.txt");
        write_concat_list(&list_path, inputs)?;

        let args: Vec<OsString> = vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.as_os_str().into(),
            "-c".into(),
            "copy".into(),
            "-y".into(),
            output.into(),
        ];

        let result = self.run("concatenate", &self.ffmpeg, &args);
        let _ = std::fs::remove_file(&list_path);
        result.map(|_| ())
    }

    fn render(&self, job: &RenderJob) -> Result<()> {
        let filter_complex = job.graph.serialize()?;

        let mut args: Vec<OsString> = Vec::new();
        for input in &job.inputs {
            args.push("-i".into());
            args.push(input.into());
        }
        args.push("-filter_complex".into());
        args.push(filter_complex.into());
        args.push("-map".into());
        args.push(format!("[{}]", job.output_label).into());
        match job.encoding {
            OutputEncoding::Mp3HighQuality => {
                args.push("-c:a".into());
                args.push("libmp3lame".into());
                args.push("-q:a".into());
                args.push("2".into());
            }
            OutputEncoding::PcmWav => {
                args.push("-c:a".into());
                args.push("pcm_s16le".into());
            }
        }
        args.push("-y".into());
        args.push(job.output.as_os_str().into());

        self.run("render", &self.ffmpeg, &args).map(|_| ())
    }
}

fn resolve_tool(name: &str, env_var: &str) -> Result<PathBuf> {
    // An explicit override must resolve; never fall back to a different
    // binary on PATH when the configured one is missing.
    if let Ok(path) = std::env::var(env_var) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        return Err(SusurrusError::EngineNotFound {
            name: format!("{} (from {})", path.display(), env_var),
        });
    }

    which::which(name).map_err(|_| SusurrusError::EngineNotFound {
        name: name.to_string(),
    })
}

/// Write a concat demuxer list file. Single quotes in paths are escaped per
/// the demuxer's quoting rules.
fn write_concat_list(list_path: &Path, inputs: &[PathBuf]) -> Result<()> {
    let mut file = std::fs::File::create(list_path)?;
    for input in inputs {
        let escaped = input.display().to_string().replace('\'', "'\\''");
        writeln!(file, "file '{}'", escaped)?;
    }
    Ok(())
}

/// Keep only the tail of a diagnostic dump; ffmpeg puts the useful message
/// at the end of a long banner.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_list_escapes_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.txt");
        write_concat_list(
            &list,
            &[
                PathBuf::from("/clips/clip_001.mp3"),
                PathBuf::from("/clips/it's.mp3"),
            ],
        )
        .unwrap();

        let text = std::fs::read_to_string(&list).unwrap();
        assert_eq!(
            text,
            "file '/clips/clip_001.mp3'\nfile '/clips/it'\\''s.mp3'\n"
        );
    }

    #[test]
    fn test_last_lines_keeps_tail() {
        let text = "a\nb\nc\nd";
        assert_eq!(last_lines(text, 2), "c\nd");
        assert_eq!(last_lines(text, 10), "a\nb\nc\nd");
    }

    #[test]
    fn test_locate_missing_tool_fails() {
        let err = resolve_tool("definitely-not-a-real-binary", "SUSURRUS_NONE").unwrap_err();
        assert_eq!(err.error_code(), "ENGINE_NOT_FOUND");
    }

    #[test]
    fn test_broken_env_override_does_not_fall_back_to_path() {
        // Unique variable name so parallel tests never race on it.
        std::env::set_var("SUSURRUS_TEST_BROKEN_OVERRIDE", "/nonexistent/ffmpeg");
        let err = resolve_tool("ffmpeg", "SUSURRUS_TEST_BROKEN_OVERRIDE").unwrap_err();
        std::env::remove_var("SUSURRUS_TEST_BROKEN_OVERRIDE");

        assert_eq!(err.error_code(), "ENGINE_NOT_FOUND");
        assert!(err.to_string().contains("SUSURRUS_TEST_BROKEN_OVERRIDE"));
    }
}
