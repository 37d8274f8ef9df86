//! Failscope - benchmark failure analysis
//!
//! A CLI tool that aggregates per-agent benchmark results against a
//! reference dataset and reports the instances no agent resolved.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing inputs, malformed files, config errors, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod input;
mod models;
mod report;

use anyhow::{anyhow, Context, Result};
use cli::{Args, View};
use config::Config;
use error::AnalysisError;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Failscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_analysis(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .failscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to set the results directory, dataset, and agents.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis workflow. Returns the exit code.
fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let results_dir = PathBuf::from(&config.data.results_dir);
    let results_file = config.data.results_file.clone();

    // Step 1: Decide which agents to aggregate
    let agents = if args.discover {
        input::discover_agents(&results_dir, &results_file)?
    } else {
        config.data.agents.clone()
    };

    if agents.is_empty() {
        return Err(AnalysisError::InvalidArgument(format!(
            "no agents to analyze (results directory: {})",
            results_dir.display()
        ))
        .into());
    }

    // Handle --dry-run: list the result files and exit
    if args.dry_run {
        return handle_dry_run(&results_dir, &agents, &results_file);
    }

    let dataset = config
        .data
        .dataset
        .clone()
        .ok_or_else(|| anyhow!("No reference dataset given; pass --dataset or set data.dataset"))?;

    // Step 2: Load inputs
    if !args.quiet {
        println!("📥 Loading results for {} agents...", agents.len());
    }
    let results =
        input::load_agent_results(&results_dir, &agents, &results_file, !args.quiet)?;
    let instances = input::load_reference(Path::new(&dataset))?;

    if instances.is_empty() {
        warn!("Reference dataset {} is empty", dataset);
    }

    // Step 3: Aggregate
    let mut analysis =
        analysis::analyze(&instances, &results, &dataset, config.report.description_limit)?;
    analysis.report.metadata.duration_seconds = start_time.elapsed().as_secs_f64();

    // Step 4: Print the requested view
    println!();
    match config.report.view {
        View::Summary => {
            print!("{}", report::summary_view(&analysis, &config.report));
            save_summary(&analysis, Path::new(&config.general.output))?;
        }
        View::Distribution => {
            print!("{}", report::distribution_view(&analysis.counts, &config.report));
        }
    }

    // Step 5: Optional Markdown report
    if let Some(ref markdown) = config.report.markdown {
        let path = Path::new(markdown);
        report::write_markdown_report(&analysis.report, config.report.top_repos, path)?;
        println!("\n📝 Markdown report saved to: {}", path.display());
    }

    info!(
        "Analysis complete in {:.1}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(0)
}

/// Write the all-failed summary file when there is anything to write.
fn save_summary(analysis: &analysis::Analysis, path: &Path) -> Result<()> {
    let entries = &analysis.report.instances;

    if entries.is_empty() {
        info!("No instance failed for every agent; skipping {}", path.display());
        return Ok(());
    }

    report::write_summary(entries, path)?;

    println!("\n=== SAVED DATA ===");
    println!(
        "Detailed data for {} all-failed instances saved to '{}'",
        entries.len(),
        path.display()
    );
    Ok(())
}

/// Handle --dry-run: resolve every agent's result file, print it, exit.
fn handle_dry_run(results_dir: &Path, agents: &[String], results_file: &str) -> Result<i32> {
    println!("\n🔍 Dry run: resolving result files (nothing is loaded)...\n");

    let mut missing = 0;
    for agent in agents {
        let path = input::result_path(results_dir, agent, results_file);
        if path.is_file() {
            println!("     ✅ {}", path.display());
        } else {
            missing += 1;
            println!("     ❌ {} (missing)", path.display());
        }
    }

    println!("\n   Total: {} agents, {} missing", agents.len(), missing);
    println!("\n✅ Dry run complete.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use crate::models::AllFailedEntry;
    use tempfile::TempDir;

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn fixture_args(temp: &TempDir) -> Args {
        let mut args = make_args();
        args.results_dir = Some(fixtures().join("verified"));
        args.dataset = Some(fixtures().join("dataset.jsonl"));
        args.discover = true;
        args.quiet = true;
        args.no_charts = true;
        args.output = Some(temp.path().join("all_failed_instances.json"));
        args.markdown = Some(temp.path().join("report.md"));
        args
    }

    #[test]
    fn test_run_analysis_on_fixtures() {
        let temp = TempDir::new().unwrap();
        let args = fixture_args(&temp);

        assert_eq!(run_analysis(args).unwrap(), 0);

        let content = std::fs::read_to_string(temp.path().join("all_failed_instances.json")).unwrap();
        let entries: Vec<AllFailedEntry> = serde_json::from_str(&content).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.instance_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "django__django-15695",
                "sympy__sympy-13091",
                "matplotlib__matplotlib-24149"
            ]
        );
        assert_eq!(entries[2].difficulty, "N/A");
        assert!(entries[0].problem_statement.ends_with("..."));

        let markdown = std::fs::read_to_string(temp.path().join("report.md")).unwrap();
        assert!(markdown.contains("| 6 | 3 | **3** | 50.0% |"));
    }

    #[test]
    fn test_run_analysis_requires_dataset() {
        let temp = TempDir::new().unwrap();
        let mut args = fixture_args(&temp);
        args.dataset = None;
        args.config = Some(temp.path().join("missing.toml"));

        // An explicit config path that doesn't exist is fatal.
        assert!(run_analysis(args.clone()).is_err());

        std::fs::write(temp.path().join("empty.toml"), "").unwrap();
        args.config = Some(temp.path().join("empty.toml"));
        let err = run_analysis(args).unwrap_err();
        assert!(err.to_string().contains("No reference dataset"));
    }

    #[test]
    fn test_run_analysis_missing_agent_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut args = fixture_args(&temp);
        args.discover = false;
        args.agents = Some(vec!["agent_alpha".to_string(), "agent_missing".to_string()]);

        let err = run_analysis(args).unwrap_err();
        assert!(format!("{:#}", err).contains("agent_missing"));
        assert!(!temp.path().join("all_failed_instances.json").exists());
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let temp = TempDir::new().unwrap();
        let mut args = fixture_args(&temp);
        args.dry_run = true;
        args.dataset = None;

        assert_eq!(run_analysis(args).unwrap(), 0);
        assert!(!temp.path().join("all_failed_instances.json").exists());
    }
}
