//! Loading of agent result files and the reference dataset.
//!
//! Agent results live in one directory per agent under a shared results
//! root (`<results_dir>/<agent>/results/results.json`). The reference
//! dataset is a local JSON or JSON Lines export of the benchmark.

use crate::error::AnalysisError;
use crate::models::{AgentResult, InstanceRecord, ResultsFile};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Path of the result file for `agent`.
pub fn result_path(results_dir: &Path, agent: &str, results_file: &str) -> PathBuf {
    results_dir.join(agent).join(results_file)
}

/// Load and parse a single agent result file.
pub fn load_agent_result(path: &Path, agent: &str) -> Result<AgentResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results for '{}': {}", agent, path.display()))?;

    let parsed: ResultsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results file: {}", path.display()))?;

    let resolved = parsed.resolved.ok_or_else(|| AnalysisError::MissingResolved {
        agent: agent.to_string(),
        path: path.to_path_buf(),
    })?;

    debug!("{}: {} resolved instances", agent, resolved.len());

    Ok(AgentResult::new(agent, resolved))
}

/// Load the result file of every agent, in the given order.
///
/// Any missing or malformed file aborts the whole load.
pub fn load_agent_results(
    results_dir: &Path,
    agents: &[String],
    results_file: &str,
    show_progress: bool,
) -> Result<Vec<AgentResult>> {
    info!(
        "Loading results for {} agents from {}",
        agents.len(),
        results_dir.display()
    );

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(agents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut results = Vec::with_capacity(agents.len());

    for agent in agents {
        if let Some(ref pb) = progress_bar {
            pb.set_message(agent.clone());
        }

        let path = result_path(results_dir, agent, results_file);
        let result = match load_agent_result(&path, agent) {
            Ok(result) => result,
            Err(e) => {
                if let Some(ref pb) = progress_bar {
                    pb.abandon();
                }
                return Err(e);
            }
        };
        results.push(result);

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("results loaded");
    }

    Ok(results)
}

/// Find every agent directory under `results_dir` that holds a result file.
///
/// Names are returned sorted.
pub fn discover_agents(results_dir: &Path, results_file: &str) -> Result<Vec<String>> {
    let mut agents = Vec::new();

    for entry in WalkDir::new(results_dir).min_depth(1).max_depth(1) {
        let entry = entry
            .with_context(|| format!("Failed to read results directory: {}", results_dir.display()))?;

        if !entry.file_type().is_dir() {
            continue;
        }

        if entry.path().join(results_file).is_file() {
            agents.push(entry.file_name().to_string_lossy().into_owned());
        } else {
            debug!("Skipping {} (no {})", entry.path().display(), results_file);
        }
    }

    agents.sort();
    info!("Discovered {} agents in {}", agents.len(), results_dir.display());

    Ok(agents)
}

/// Load the reference dataset from a JSON array or JSON Lines file.
///
/// Records sharing an `instance_id` keep the first occurrence.
pub fn load_reference(path: &Path) -> Result<Vec<InstanceRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let records = if is_json_lines(path, &content) {
        parse_json_lines(&content)
            .with_context(|| format!("Failed to parse dataset: {}", path.display()))?
    } else {
        serde_json::from_str::<Vec<InstanceRecord>>(&content)
            .with_context(|| format!("Failed to parse dataset: {}", path.display()))?
    };

    let records = dedup_instances(records);
    info!("Loaded {} reference instances from {}", records.len(), path.display());

    Ok(records)
}

fn is_json_lines(path: &Path, content: &str) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("ndjson") => true,
        _ => !content.trim_start().starts_with('['),
    }
}

fn parse_json_lines(content: &str) -> Result<Vec<InstanceRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<InstanceRecord>(line).with_context(|| format!("Invalid record on line {}", i + 1))
        })
        .collect()
}

fn dedup_instances(records: Vec<InstanceRecord>) -> Vec<InstanceRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let first = seen.insert(record.instance_id.clone());
            if !first {
                warn!("Duplicate instance '{}' in dataset, keeping the first", record.instance_id);
            }
            first
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RESULTS_FILE: &str = "results/results.json";

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn write_result(root: &Path, agent: &str, body: &str) -> PathBuf {
        let path = result_path(root, agent, RESULTS_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_result_path() {
        let path = result_path(Path::new("verified"), "20250519_devlo", RESULTS_FILE);
        assert_eq!(
            path,
            PathBuf::from("verified/20250519_devlo/results/results.json")
        );
    }

    #[test]
    fn test_load_agent_result() {
        let temp = TempDir::new().unwrap();
        let path = write_result(
            temp.path(),
            "agent",
            r#"{"resolved": ["a", "b", "b"], "no_generation": ["c"]}"#,
        );

        let result = load_agent_result(&path, "agent").unwrap();
        assert_eq!(result.agent, "agent");
        assert_eq!(result.resolved.len(), 2);
    }

    #[test]
    fn test_missing_resolved_field() {
        let temp = TempDir::new().unwrap();
        let path = write_result(temp.path(), "agent", r#"{"no_logs": []}"#);

        let err = load_agent_result(&path, "agent").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::MissingResolved { .. })
        ));
    }

    #[test]
    fn test_missing_result_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        write_result(temp.path(), "present", r#"{"resolved": []}"#);

        let agents = vec!["present".to_string(), "absent".to_string()];
        let err = load_agent_results(temp.path(), &agents, RESULTS_FILE, false).unwrap_err();
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_load_fixture_results() {
        let root = fixtures().join("verified");
        let agents = discover_agents(&root, RESULTS_FILE).unwrap();
        assert_eq!(agents, vec!["agent_alpha", "agent_beta", "agent_gamma"]);

        let results = load_agent_results(&root, &agents, RESULTS_FILE, false).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].agent, "agent_alpha");
    }

    #[test]
    fn test_discover_skips_dirs_without_results() {
        let temp = TempDir::new().unwrap();
        write_result(temp.path(), "b_agent", r#"{"resolved": []}"#);
        write_result(temp.path(), "a_agent", r#"{"resolved": []}"#);
        std::fs::create_dir_all(temp.path().join("empty_agent")).unwrap();
        std::fs::write(temp.path().join("notes.txt"), "not an agent").unwrap();

        let agents = discover_agents(temp.path(), RESULTS_FILE).unwrap();
        assert_eq!(agents, vec!["a_agent", "b_agent"]);
    }

    #[test]
    fn test_load_reference_jsonl_fixture() {
        let records = load_reference(&fixtures().join("dataset.jsonl")).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].instance_id, "astropy__astropy-12907");
    }

    #[test]
    fn test_load_reference_json_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dataset.json");
        std::fs::write(
            &path,
            r#"[
                {"instance_id": "a-1", "repo": "o/a", "difficulty": "1-4 hours"},
                {"instance_id": "a-2", "repo": "o/a"},
                {"instance_id": "a-1", "repo": "o/duplicate"}
            ]"#,
        )
        .unwrap();

        let records = load_reference(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].repo, "o/a");
        assert_eq!(records[0].difficulty.as_deref(), Some("1-4 hours"));
    }

    #[test]
    fn test_load_reference_reports_bad_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dataset.jsonl");
        std::fs::write(
            &path,
            "{\"instance_id\": \"a-1\", \"repo\": \"o/a\"}\n\n{\"repo\": \"o/a\"}\n",
        )
        .unwrap();

        let err = load_reference(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn test_load_reference_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dataset.jsonl");
        std::fs::write(&path, "").unwrap();

        assert!(load_reference(&path).unwrap().is_empty());
    }
}
