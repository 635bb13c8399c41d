//! Processing graph AST
//!
//! The compilers in [`crate::render`] describe all signal processing as a
//! typed DAG of filter expressions. One serializer produces the textual
//! `[inputs]op(params)[output]` form consumed by the external engine, so
//! label and arity validation live in one place instead of being scattered
//! across string-formatting call sites.
//!
//! Source streams are referenced by the label `<n>:a`, where `<n>` is the
//! zero-based index of the corresponding input file in the render job.

use std::fmt::Write as _;

use crate::error::{Result, SusurrusError};

/// A single audio operation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Uniform gain scale
    Volume { gain: f64 },
    /// Stereo pan matrix: output left/right as weighted sums of input
    /// left/right with the same per-side weight
    Pan { left_gain: f64, right_gain: f64 },
    /// Delay both channels by the same amount
    Delay { millis: u64 },
    /// Pad with trailing silence up to a total duration
    Pad { whole_duration_secs: f64 },
    /// Mix N inputs into one stream; output length equals the longest
    /// input, with a short dropout transition when an input ends
    Mix {
        inputs: usize,
        dropout_transition_secs: u32,
    },
    /// Multiplex N mono-or-stereo inputs into one multichannel stream,
    /// no mixing and no panning
    Join { inputs: usize },
}

impl FilterOp {
    /// How many input edges this operation consumes.
    pub fn arity(&self) -> usize {
        match self {
            FilterOp::Mix { inputs, .. } | FilterOp::Join { inputs } => *inputs,
            _ => 1,
        }
    }

    fn write_params(&self, out: &mut String) {
        match self {
            FilterOp::Volume { gain } => {
                let _ = write!(out, "volume={}", trim_float(*gain));
            }
            FilterOp::Pan {
                left_gain,
                right_gain,
            } => {
                let l = trim_float(*left_gain);
                let r = trim_float(*right_gain);
                let _ = write!(out, "pan=stereo|c0={l}*c0+{l}*c1|c1={r}*c0+{r}*c1");
            }
            FilterOp::Delay { millis } => {
                let _ = write!(out, "adelay={millis}:all=1");
            }
            FilterOp::Pad {
                whole_duration_secs,
            } => {
                let _ = write!(out, "apad=whole_dur={}", trim_float(*whole_duration_secs));
            }
            FilterOp::Mix {
                inputs,
                dropout_transition_secs,
            } => {
                let _ = write!(
                    out,
                    "amix=inputs={inputs}:duration=longest:dropout_transition={dropout_transition_secs}"
                );
            }
            FilterOp::Join { inputs } => {
                let _ = write!(out, "amerge=inputs={inputs}");
            }
        }
    }
}

/// Render a float without a trailing `.0` for whole values, matching the
/// compact parameter form the engine expects.
fn trim_float(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// One node expression: `[inputs] op(params) [output]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub inputs: Vec<String>,
    pub op: FilterOp,
    pub output: String,
}

/// An ordered DAG of filter expressions.
///
/// Expressions are kept in insertion order; validation checks that every
/// non-source input label was produced by an earlier expression, that output
/// labels are unique, and that declared Mix/Join arity matches the number of
/// input edges.
#[derive(Debug, Clone, Default)]
pub struct ProcessingGraph {
    exprs: Vec<FilterExpr>,
}

impl ProcessingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-input expression.
    pub fn push(&mut self, input: impl Into<String>, op: FilterOp, output: impl Into<String>) {
        self.exprs.push(FilterExpr {
            inputs: vec![input.into()],
            op,
            output: output.into(),
        });
    }

    /// Append a multi-input expression (Mix or Join).
    pub fn push_many(&mut self, inputs: Vec<String>, op: FilterOp, output: impl Into<String>) {
        self.exprs.push(FilterExpr {
            inputs,
            op,
            output: output.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn exprs(&self) -> &[FilterExpr] {
        &self.exprs
    }

    /// Validate labels and arity.
    ///
    /// A label of the form `<n>:a` denotes source stream `n` and is always
    /// defined; any other input label must have been produced earlier.
    pub fn validate(&self) -> Result<()> {
        if self.exprs.is_empty() {
            return Err(SusurrusError::graph("graph has no expressions"));
        }

        let mut defined: Vec<&str> = Vec::new();
        for expr in &self.exprs {
            if expr.inputs.len() != expr.op.arity() {
                return Err(SusurrusError::graph(format!(
                    "expression [{}] declares {} inputs but has {} edges",
                    expr.output,
                    expr.op.arity(),
                    expr.inputs.len()
                )));
            }

            for input in &expr.inputs {
                if !is_source_label(input) && !defined.iter().any(|d| *d == input.as_str()) {
                    return Err(SusurrusError::graph(format!(
                        "input label [{}] is not defined before use",
                        input
                    )));
                }
            }

            if defined.iter().any(|d| *d == expr.output) {
                return Err(SusurrusError::graph(format!(
                    "output label [{}] is defined twice",
                    expr.output
                )));
            }
            defined.push(&expr.output);
        }

        Ok(())
    }

    /// Serialize to the engine's textual form, one `;`-separated expression
    /// per node. Validates first; a graph that fails validation is never
    /// handed to the engine.
    pub fn serialize(&self) -> Result<String> {
        self.validate()?;

        let mut out = String::new();
        for (i, expr) in self.exprs.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            for input in &expr.inputs {
                let _ = write!(out, "[{input}]");
            }
            expr.op.write_params(&mut out);
            let _ = write!(out, "[{}]", expr.output);
        }
        Ok(out)
    }
}

/// `<n>:a` labels refer to source input streams.
fn is_source_label(label: &str) -> bool {
    match label.strip_suffix(":a") {
        Some(prefix) => !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
