//! Input loading.
//!
//! Reads the per-agent result files and the reference dataset from disk.

pub mod loader;

pub use loader::{discover_agents, load_agent_results, load_reference, result_path};
