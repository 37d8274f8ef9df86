//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.failscope.toml` files.

use crate::cli::View;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".failscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the all-failed summary JSON.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "all_failed_instances.json".to_string()
}

/// Where agent results and the reference dataset are found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding one sub-directory per agent.
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Result file path relative to each agent directory.
    #[serde(default = "default_results_file")]
    pub results_file: String,

    /// Reference dataset (JSON array or JSON Lines).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,

    /// Agents to aggregate.
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            results_file: default_results_file(),
            dataset: None,
            agents: default_agents(),
        }
    }
}

fn default_results_dir() -> String {
    "experiments/evaluation/verified".to_string()
}

fn default_results_file() -> String {
    "results/results.json".to_string()
}

fn default_agents() -> Vec<String> {
    vec![
        "20250612_trae",
        "20250804_epam-ai-run-claude-4-sonnet",
        "20250819_ACoder",
        "20250731_harness_ai",
        "20250720_Lingxi-v1.5_claude-4-sonnet-20250514",
        "20250603_Refact_Agent_claude-4-sonnet",
        "20250522_tools_claude-4-opus",
        "20250522_tools_claude-4-sonnet",
        "20250715_qodo_command",
        "20250710_bloop",
        "20250623_warp",
        "20250611_moatless_claude-4-sonnet-20250514",
        "20250519_trae",
        "20250515_Refact_Agent",
        "20250524_openhands_claude_4_sonnet",
        "20250610_augment_agent_v1",
        "20250519_devlo",
        "20250430_zencoder_ai",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Console view to print.
    #[serde(default)]
    pub view: View,

    /// Number of repositories shown in rankings.
    #[serde(default = "default_top_repos")]
    pub top_repos: usize,

    /// Characters of the problem statement kept in the summary file.
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    /// Render text charts.
    #[serde(default = "default_true")]
    pub charts: bool,

    /// Width of the longest chart bar, in characters.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,

    /// Optional Markdown report path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            view: View::default(),
            top_repos: default_top_repos(),
            description_limit: default_description_limit(),
            charts: true,
            chart_width: default_chart_width(),
            markdown: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_top_repos() -> usize {
    10
}

fn default_description_limit() -> usize {
    200
}

fn default_chart_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.failscope.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.results_dir {
            self.data.results_dir = dir.display().to_string();
        }
        if let Some(ref file) = args.results_file {
            self.data.results_file = file.clone();
        }
        if let Some(ref dataset) = args.dataset {
            self.data.dataset = Some(dataset.display().to_string());
        }
        if let Some(ref agents) = args.agents {
            self.data.agents = agents.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref markdown) = args.markdown {
            self.report.markdown = Some(markdown.display().to_string());
        }
        if let Some(view) = args.view {
            self.report.view = view;
        }
        if let Some(top) = args.top_repos {
            self.report.top_repos = top;
        }
        if args.no_charts {
            self.report.charts = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
