//! Analysis modules.
//!
//! The failure aggregator and the run-level summary built on top of it.

pub mod aggregator;
pub mod summary;

pub use aggregator::*;
pub use summary::{analyze, Analysis};
