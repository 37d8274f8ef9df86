//! Console rendering of analysis results.
//!
//! Each view is rendered to a `String` so `main` only has to print it.

use super::chart::{bar_chart, histogram_chart, Bar};
use crate::analysis::{percentage, rank_groups, sorted_by_failures, year_of, Analysis};
use crate::config::ReportConfig;
use crate::models::{FailureCounts, FailureHistogram, FailureStats, GroupStat, NOT_AVAILABLE};
use std::collections::BTreeMap;

/// Render the all-failed analysis.
pub fn summary_view(analysis: &Analysis, settings: &ReportConfig) -> String {
    let report = &analysis.report;
    let total_agents = analysis.total_agents();
    let total_instances = report.metadata.total_instances;
    let all_failed = report.metadata.all_failed;
    let all_failed_pct = percentage(all_failed, total_instances);
    let has_difficulty = !report.difficulty_totals.is_empty();
    let has_years = !report.year_totals.is_empty();
    let top_repos = rank_groups(&report.by_repository);

    let mut out = String::new();

    out.push_str(&format!("Total number of agents: {}\n\n", total_agents));

    out.push_str(&format!(
        "=== ANALYSIS OF INSTANCES WHERE ALL {} AGENTS FAILED ===\n",
        total_agents
    ));
    out.push_str(&format!(
        "Number of instances where ALL agents failed: {}\n",
        all_failed
    ));
    out.push_str(&format!(
        "Percentage of total instances: {:.1}%\n\n",
        all_failed_pct
    ));

    out.push_str("=== REPOSITORY ANALYSIS ===\n");
    out.push_str("Repositories with most all-failed instances:\n");
    let repo_rows: Vec<_> = top_repos
        .iter()
        .take(settings.top_repos)
        .map(|(repo, stat)| (*repo, stat.count))
        .collect();
    out.push_str(&count_table(&repo_rows));
    out.push('\n');

    if has_difficulty {
        out.push_str("=== DIFFICULTY ANALYSIS ===\n");
        out.push_str("Difficulty distribution of all-failed instances:\n");
        let failed_rows: Vec<_> = rank_groups(&report.by_difficulty)
            .into_iter()
            .map(|(d, stat)| (d, stat.count))
            .collect();
        out.push_str(&count_table(&failed_rows));

        out.push_str("\nOverall difficulty distribution:\n");
        out.push_str(&count_table(&rank_counts(&report.difficulty_totals)));

        out.push_str("\nPercentage of each difficulty level that failed across all agents:\n");
        for (difficulty, stat) in rank_groups(&report.by_difficulty) {
            out.push_str(&format!(
                "{}: {:.1}% ({}/{})\n",
                difficulty, stat.rate, stat.count, stat.total
            ));
        }
        out.push('\n');
    }

    if has_years {
        out.push_str("=== CREATION DATE ANALYSIS ===\n");
        out.push_str("Year distribution of all-failed instances:\n");
        let year_rows: Vec<_> = report
            .by_year
            .iter()
            .map(|(year, stat)| (year.as_str(), stat.count))
            .collect();
        out.push_str(&count_table(&year_rows));
        out.push('\n');
    }

    out.push_str("=== DETAILED LIST OF ALL-FAILED INSTANCES ===\n");
    out.push_str("Instance ID | Repository | Difficulty | Created Year\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');
    for entry in &report.instances {
        let year = year_of(&entry.created_at)
            .map(|y| y.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        out.push_str(&format!(
            "{} | {} | {} | {}\n",
            entry.instance_id, entry.repo, entry.difficulty, year
        ));
    }
    out.push('\n');

    if settings.charts {
        out.push_str(&summary_charts(analysis, settings));
    }

    out.push_str("=== SUMMARY STATISTICS ===\n");
    out.push_str(&format!("Total instances in dataset: {}\n", total_instances));
    out.push_str(&format!(
        "Instances where all {} agents failed: {} ({:.1}%)\n",
        total_agents, all_failed, all_failed_pct
    ));
    match top_repos.first() {
        Some((repo, stat)) => out.push_str(&format!(
            "Most challenging repository: {} ({} instances)\n",
            repo, stat.count
        )),
        None => out.push_str(&format!(
            "Most challenging repository: {} (0 instances)\n",
            NOT_AVAILABLE
        )),
    }
    if has_difficulty {
        match rank_groups(&report.by_difficulty).first() {
            Some((difficulty, stat)) => out.push_str(&format!(
                "Most common difficulty in all-failed instances: {} ({} instances)\n",
                difficulty, stat.count
            )),
            None => out.push_str(&format!(
                "Most common difficulty in all-failed instances: {} (0 instances)\n",
                NOT_AVAILABLE
            )),
        }
    }

    out
}

/// Render the four summary charts.
fn summary_charts(analysis: &Analysis, settings: &ReportConfig) -> String {
    let report = &analysis.report;
    let width = settings.chart_width;
    let mut out = String::new();

    let repo_bars: Vec<Bar> = rank_groups(&report.by_repository)
        .into_iter()
        .take(settings.top_repos)
        .map(|(repo, stat)| Bar::count(repo, stat.count))
        .collect();
    out.push_str(&bar_chart(
        &format!("Top {} Repositories with All-Failed Instances", settings.top_repos),
        &repo_bars,
        width,
    ));
    out.push('\n');

    if !report.difficulty_totals.is_empty() {
        out.push_str(&bar_chart(
            "Percentage of Each Difficulty Level That Failed Across All Agents",
            &difficulty_bars(&report.by_difficulty, &report.difficulty_totals),
            width,
        ));
        out.push('\n');
    }

    if !report.year_totals.is_empty() {
        let year_bars: Vec<Bar> = report
            .by_year
            .iter()
            .map(|(year, stat)| Bar::count(year.as_str(), stat.count))
            .collect();
        out.push_str(&bar_chart(
            "Year Distribution of All-Failed Instances",
            &year_bars,
            width,
        ));
        out.push('\n');
    }

    let total_agents = analysis.total_agents();
    out.push_str(&histogram_chart(
        "Distribution of Failure Counts (▓ = all agents failed)",
        &report.histogram,
        Some(total_agents),
        width,
    ));
    out.push('\n');

    out
}

/// One bar per difficulty level, rated against its overall size.
///
/// Levels without any all-failed instance show as 0%.
pub fn difficulty_bars(
    by_difficulty: &BTreeMap<String, GroupStat>,
    totals: &BTreeMap<String, usize>,
) -> Vec<Bar> {
    totals
        .iter()
        .map(|(difficulty, total)| {
            let stat = by_difficulty.get(difficulty).copied().unwrap_or(GroupStat {
                count: 0,
                total: *total,
                rate: 0.0,
            });
            Bar::new(
                difficulty.as_str(),
                stat.rate,
                format!("{} {:.1}%", stat.emoji(), stat.rate),
            )
        })
        .collect()
}

/// Render every instance's failure count and the overall distribution.
pub fn distribution_view(counts: &FailureCounts, settings: &ReportConfig) -> String {
    let mut out = String::new();

    out.push_str("Instance failure counts:\n");
    for (instance_id, count) in sorted_by_failures(counts) {
        out.push_str(&format!(
            "Instance ID: {}, Failure Count: {}\n",
            instance_id, count
        ));
    }
    out.push('\n');

    let stats = FailureStats::from_counts(counts);

    if settings.charts {
        let histogram = FailureHistogram::from_counts(counts, stats.max);
        out.push_str(&histogram_chart(
            "Distribution of Instance Failure Counts Across Agents",
            &histogram,
            None,
            settings.chart_width,
        ));
        out.push('\n');
    }

    out.push_str(&stats_block(&stats));
    out
}

/// The statistics box shown next to the failure histogram.
pub fn stats_block(stats: &FailureStats) -> String {
    format!(
        "Total Instances: {}\nMean Failures: {:.1}\nMedian Failures: {:.1}\nMax Failures: {}\n",
        stats.total, stats.mean, stats.median, stats.max
    )
}

/// Counts ordered highest first, ties by key.
fn rank_counts(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut ranked: Vec<_> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    ranked
}

/// Two-column `label  count` listing with aligned counts.
fn count_table(rows: &[(&str, usize)]) -> String {
    if rows.is_empty() {
        return "  (none)\n".to_string();
    }

    let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, count)| format!("  {:<w$}  {}\n", label, count, w = width))
        .collect()
}
