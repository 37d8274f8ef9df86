//! Typed errors raised by the analysis and input layers.
//!
//! Everything above this layer propagates through `anyhow`; these variants
//! exist so callers and tests can match on the conditions that matter.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading inputs or aggregating failures.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// An argument outside the accepted domain (e.g. zero agents).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A per-agent result document without a `resolved` array.
    #[error("result file for agent '{agent}' has no \"resolved\" field: {}", .path.display())]
    MissingResolved { agent: String, path: PathBuf },
}
