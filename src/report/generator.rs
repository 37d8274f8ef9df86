//! Report file generation.
//!
//! This module writes the all-failed summary JSON and the optional
//! Markdown report from the analysis results.

use super::chart::{bar_chart, histogram_chart};
use super::console::difficulty_bars;
use crate::analysis::{percentage, rank_groups, year_of};
use crate::models::{AllFailedEntry, GroupAttribute, GroupStat, Report, NOT_AVAILABLE};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Generate the all-failed summary as a pretty JSON array.
pub fn generate_summary_json(entries: &[AllFailedEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).map_err(Into::into)
}

/// Write the all-failed summary JSON to `path`.
pub fn write_summary(entries: &[AllFailedEntry], path: &Path) -> Result<()> {
    let content = generate_summary_json(entries)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}

/// Write the Markdown report to `path`.
pub fn write_markdown_report(report: &Report, top_repos: usize, path: &Path) -> Result<()> {
    let content = generate_markdown_report(report, top_repos);
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, top_repos: usize) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# All-Failed Instances Report\n\n");

    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(report));

    output.push_str(&generate_group_section(
        GroupAttribute::Repository,
        &report.by_repository,
        Some(top_repos),
    ));
    if !report.difficulty_totals.is_empty() {
        output.push_str(&generate_group_section(
            GroupAttribute::Difficulty,
            &report.by_difficulty,
            None,
        ));
        output.push_str(&generate_difficulty_chart(report));
    }
    if !report.year_totals.is_empty() {
        output.push_str(&generate_group_section(
            GroupAttribute::Year,
            &report.by_year,
            None,
        ));
    }

    output.push_str(&generate_distribution_section(report));
    output.push_str(&generate_instances_section(&report.instances));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(report: &Report) -> String {
    let metadata = &report.metadata;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!("- **Agents:** {}\n", metadata.agents.len()));
    for agent in &metadata.agents {
        section.push_str(&format!("  - `{}`\n", agent));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [By Repository](#by-repository)\n");
    if !report.difficulty_totals.is_empty() {
        toc.push_str("- [By Difficulty](#by-difficulty)\n");
    }
    if !report.year_totals.is_empty() {
        toc.push_str("- [By Year](#by-year)\n");
    }
    toc.push_str("- [Failure Distribution](#failure-distribution)\n");
    toc.push_str("- [All-Failed Instances](#all-failed-instances)\n");
    toc.push('\n');

    toc
}

/// Generate the summary section.
fn generate_summary_section(report: &Report) -> String {
    let metadata = &report.metadata;
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Instances | Agents | All Failed | Share |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | **{}** | {:.1}% |\n\n",
        metadata.total_instances,
        metadata.agents.len(),
        metadata.all_failed,
        percentage(metadata.all_failed, metadata.total_instances)
    ));

    let most_challenging = rank_groups(&report.by_repository)
        .first()
        .map(|(repo, stat)| format!("`{}` ({} instances)", repo, stat.count))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    section.push_str(&format!(
        "- **Most challenging repository:** {}\n",
        most_challenging
    ));

    if !report.difficulty_totals.is_empty() {
        let most_common = rank_groups(&report.by_difficulty)
            .first()
            .map(|(difficulty, stat)| format!("{} ({} instances)", difficulty, stat.count))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        section.push_str(&format!(
            "- **Most common difficulty:** {}\n",
            most_common
        ));
    }
    section.push('\n');

    section
}

/// Generate a per-group table, ranked by all-failed count.
fn generate_group_section(
    attribute: GroupAttribute,
    groups: &BTreeMap<String, GroupStat>,
    limit: Option<usize>,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## By {}\n\n", attribute));

    if groups.is_empty() {
        section.push_str("No all-failed instances in any group.\n\n");
        return section;
    }

    section.push_str(&format!("| {} | All Failed | Total | Rate |\n", attribute));
    section.push_str("|:---|:---:|:---:|:---:|\n");

    // Years read better chronologically.
    let rows: Vec<(&str, &GroupStat)> = match attribute {
        GroupAttribute::Year => groups.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        _ => rank_groups(groups),
    };

    for (key, stat) in rows.into_iter().take(limit.unwrap_or(usize::MAX)) {
        section.push_str(&format!(
            "| {} | {} | {} | {:.1}% |\n",
            key, stat.count, stat.total, stat.rate
        ));
    }
    section.push('\n');

    section
}

/// Generate the difficulty rate chart.
fn generate_difficulty_chart(report: &Report) -> String {
    let bars = difficulty_bars(&report.by_difficulty, &report.difficulty_totals);

    let mut section = String::new();
    section.push_str("```text\n");
    section.push_str(&bar_chart(
        "Share of each difficulty level failed by all agents",
        &bars,
        40,
    ));
    section.push_str("```\n\n");
    section
}

/// Generate the failure count histogram section.
fn generate_distribution_section(report: &Report) -> String {
    let stats = &report.stats;
    let agents = report.metadata.agents.len();
    let mut section = String::new();

    section.push_str("## Failure Distribution\n\n");
    section.push_str(&format!(
        "*Instances with failures: {} | Mean: {:.1} | Median: {:.1} | Max: {}*\n\n",
        stats.total, stats.mean, stats.median, stats.max
    ));
    section.push_str("```text\n");
    section.push_str(&histogram_chart(
        "Agents failed -> instances",
        &report.histogram,
        Some(agents),
        40,
    ));
    section.push_str("```\n\n");

    section
}

/// Generate the all-failed instance listing.
fn generate_instances_section(entries: &[AllFailedEntry]) -> String {
    let mut section = String::new();

    section.push_str("## All-Failed Instances\n\n");

    if entries.is_empty() {
        section.push_str("Every instance was resolved by at least one agent.\n\n");
        return section;
    }

    section.push_str("| Instance | Repository | Difficulty | Year | Problem |\n");
    section.push_str("|:---|:---|:---|:---:|:---|\n");

    for entry in entries {
        let year = year_of(&entry.created_at)
            .map(|y| y.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            entry.instance_id,
            entry.repo,
            escape_cell(&entry.difficulty),
            year,
            escape_cell(&entry.problem_statement)
        ));
    }
    section.push('\n');

    section
}

/// Keep a value on one table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by failscope*\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summary::tests::sample_analysis;
    use tempfile::TempDir;

    #[test]
    fn test_generate_summary_json() {
        let analysis = sample_analysis();
        let json = generate_summary_json(&analysis.report.instances).unwrap();

        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["instance_id"], "r1-1");
        assert_eq!(parsed[0]["repo"], "r1");
        assert_eq!(parsed[0]["difficulty"], "hard");
        assert_eq!(parsed[0]["created_at"], "2021-04-01T00:00:00Z");
        assert_eq!(parsed[0]["problem_statement"], "Problem for r1-1...");
        assert_eq!(parsed[1]["created_at"], "N/A");
    }

    #[test]
    fn test_write_summary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("all_failed_instances.json");
        let analysis = sample_analysis();

        write_summary(&analysis.report.instances, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<AllFailedEntry> = serde_json::from_str(&content).unwrap();
        assert_eq!(entries, analysis.report.instances);
    }

    #[test]
    fn test_generate_markdown_report() {
        let analysis = sample_analysis();
        let markdown = generate_markdown_report(&analysis.report, 10);

        assert!(markdown.contains("# All-Failed Instances Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("`sample.jsonl`"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("| 5 | 2 | **2** | 40.0% |"));
        assert!(markdown.contains("## By Repository"));
        assert!(markdown.contains("| r1 | 1 | 4 | 25.0% |"));
        assert!(markdown.contains("## By Difficulty"));
        assert!(markdown.contains("| hard | 2 | 3 | 66.7% |"));
        assert!(markdown.contains("## By Year"));
        assert!(markdown.contains("## Failure Distribution"));
        assert!(markdown.contains("| `r2-1` | r2 | hard | N/A |"));
    }

    #[test]
    fn test_markdown_repository_limit() {
        let analysis = sample_analysis();
        let markdown = generate_markdown_report(&analysis.report, 1);

        assert!(markdown.contains("| r1 | 1 | 4 | 25.0% |"));
        assert!(!markdown.contains("| r2 | 1 | 1 | 100.0% |"));
    }

    #[test]
    fn test_markdown_without_failures() {
        let mut analysis = sample_analysis();
        analysis.report.instances.clear();
        analysis.report.by_repository.clear();

        let markdown = generate_markdown_report(&analysis.report, 10);
        assert!(markdown.contains("Every instance was resolved by at least one agent."));
        assert!(markdown.contains("No all-failed instances in any group."));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a | b\nc"), "a \\| b c");
    }
}
