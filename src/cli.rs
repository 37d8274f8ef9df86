//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Failscope - find the benchmark instances every agent failed
///
/// Loads one results.json per agent plus a reference dataset, counts how
/// many agents failed each instance, and reports the instances no agent
/// resolved.
///
/// Examples:
///   failscope --results-dir experiments/evaluation/verified --dataset verified.jsonl
///   failscope --dataset verified.jsonl --agents 20250612_trae,20250519_devlo
///   failscope --dataset verified.jsonl --discover --view distribution
///   failscope --dataset verified.jsonl --markdown report.md
///   failscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding one sub-directory per agent
    ///
    /// Defaults to the config value (experiments/evaluation/verified).
    #[arg(long, value_name = "DIR", env = "FAILSCOPE_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    /// Reference dataset (JSON array or JSON Lines)
    #[arg(long, value_name = "FILE", env = "FAILSCOPE_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Agents to aggregate (comma-separated)
    ///
    /// Example: --agents 20250612_trae,20250519_devlo
    #[arg(long, value_name = "NAMES", value_delimiter = ',', conflicts_with = "discover")]
    pub agents: Option<Vec<String>>,

    /// Aggregate every agent directory found in the results directory
    #[arg(long)]
    pub discover: bool,

    /// Result file path relative to each agent directory
    #[arg(long, value_name = "PATH")]
    pub results_file: Option<String>,

    /// Output file for the all-failed summary (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write a Markdown report to this file
    #[arg(long, value_name = "FILE")]
    pub markdown: Option<PathBuf>,

    /// Which analysis to print (summary, distribution)
    #[arg(long, value_name = "VIEW")]
    pub view: Option<View>,

    /// Number of repositories shown in rankings
    #[arg(long, value_name = "COUNT")]
    pub top_repos: Option<usize>,

    /// Skip the text charts
    #[arg(long)]
    pub no_charts: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .failscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: resolve the agent result files and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .failscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Console analysis to print.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Instances every agent failed, grouped and charted (default)
    #[default]
    Summary,
    /// Failure count of every instance and its histogram
    Distribution,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top_repos == Some(0) {
            return Err("Top repositories must be at least 1".to_string());
        }

        if let Some(ref agents) = self.agents {
            if agents.iter().any(|a| a.trim().is_empty()) {
                return Err("Agent names must not be empty".to_string());
            }
        }

        if let Some(ref dir) = self.results_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "Results directory does not exist: {}",
                    dir.display()
                ));
            }
        }

        if let Some(ref dataset) = self.dataset {
            if !dataset.is_file() {
                return Err(format!("Dataset file does not exist: {}", dataset.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            results_dir: None,
            dataset: None,
            agents: None,
            discover: false,
            results_file: None,
            output: None,
            markdown: None,
            view: None,
            top_repos: None,
            no_charts: false,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_agents_list() {
        let args = Args::try_parse_from([
            "failscope",
            "--agents",
            "20250612_trae,20250519_devlo",
            "--view",
            "distribution",
        ])
        .unwrap();
        assert_eq!(
            args.agents,
            Some(vec!["20250612_trae".to_string(), "20250519_devlo".to_string()])
        );
        assert_eq!(args.view, Some(View::Distribution));
    }

    #[test]
    fn test_agents_conflict_with_discover() {
        let result = Args::try_parse_from(["failscope", "--agents", "a", "--discover"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_paths_and_counts() {
        let mut args = make_args();
        assert!(args.validate().is_ok());

        args.top_repos = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.results_dir = Some(PathBuf::from("/definitely/not/here"));
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.dataset = Some(PathBuf::from("/definitely/not/here.jsonl"));
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.agents = Some(vec!["ok".to_string(), " ".to_string()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
