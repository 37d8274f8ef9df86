//! Assembly of a full analysis run.
//!
//! Runs the aggregator over loaded inputs and collects everything the
//! report writers need into a single [`Analysis`].

use super::aggregator::{
    compute_failure_counts, filter_instances, group_and_rate, group_totals, reference_ids,
    select_all_failed,
};
use crate::error::AnalysisError;
use crate::models::{
    AgentResult, AllFailedEntry, FailureCounts, FailureHistogram, FailureStats, GroupAttribute,
    InstanceRecord, Report, ReportMetadata,
};
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::debug;

/// Result of aggregating one set of agents against a reference dataset.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Failure count per instance (only instances with failures).
    pub counts: FailureCounts,
    /// Instances no agent resolved.
    pub all_failed: BTreeSet<String>,
    pub report: Report,
}

impl Analysis {
    /// Number of agents aggregated.
    pub fn total_agents(&self) -> usize {
        self.report.metadata.agents.len()
    }
}

/// Aggregate `results` against `instances` and build the report.
///
/// Fails with `InvalidArgument` when no agent results are given.
pub fn analyze(
    instances: &[InstanceRecord],
    results: &[AgentResult],
    dataset: &str,
    description_limit: usize,
) -> Result<Analysis, AnalysisError> {
    let total_agents = results.len();
    let ids = reference_ids(instances);

    let counts = compute_failure_counts(&ids, results);
    let all_failed = select_all_failed(&counts, total_agents)?;
    debug!(
        "{} of {} instances failed at least once, {} failed for every agent",
        counts.len(),
        ids.len(),
        all_failed.len()
    );

    let failed_instances = filter_instances(instances, &all_failed);

    let repository_totals = group_totals(instances, GroupAttribute::Repository);
    let difficulty_totals = group_totals(instances, GroupAttribute::Difficulty);
    let year_totals = group_totals(instances, GroupAttribute::Year);

    let by_repository =
        group_and_rate(&failed_instances, GroupAttribute::Repository, &repository_totals);
    let by_difficulty =
        group_and_rate(&failed_instances, GroupAttribute::Difficulty, &difficulty_totals);
    let by_year = group_and_rate(&failed_instances, GroupAttribute::Year, &year_totals);

    let entries = failed_instances
        .iter()
        .map(|instance| AllFailedEntry::from_instance(instance, description_limit))
        .collect();

    let metadata = ReportMetadata {
        analysis_date: Utc::now(),
        dataset: dataset.to_string(),
        agents: results.iter().map(|r| r.agent.clone()).collect(),
        total_instances: ids.len(),
        all_failed: all_failed.len(),
        duration_seconds: 0.0,
    };

    let report = Report {
        metadata,
        by_repository,
        by_difficulty,
        difficulty_totals,
        by_year,
        year_totals,
        histogram: FailureHistogram::from_counts(&counts, total_agents),
        stats: FailureStats::from_counts(&counts),
        instances: entries,
    };

    Ok(Analysis {
        counts,
        all_failed,
        report,
    })
}
