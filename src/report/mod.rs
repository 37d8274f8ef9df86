//! Report output.
//!
//! Console views, text charts, and the files written after analysis.

pub mod chart;
pub mod console;
pub mod generator;

pub use console::{distribution_view, summary_view};
pub use generator::{write_markdown_report, write_summary};
