//! Failure aggregation and statistics.
//!
//! This module turns the per-agent resolved sets into a failure count per
//! instance, selects the instances no agent resolved, and groups them by
//! descriptive attributes.

use crate::error::AnalysisError;
use crate::models::{AgentResult, FailureCounts, GroupAttribute, GroupStat, InstanceRecord};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};

/// Collect the identifiers of the reference collection.
pub fn reference_ids(instances: &[InstanceRecord]) -> BTreeSet<String> {
    instances.iter().map(|i| i.instance_id.clone()).collect()
}

/// Count, for every reference identifier, the agents that did not resolve it.
///
/// An identifier missing from an agent's resolved set is a failure for that
/// agent whether or not the agent attempted it. Resolved identifiers outside
/// the reference set are ignored. Identifiers no agent failed are absent.
pub fn compute_failure_counts(
    reference_ids: &BTreeSet<String>,
    results: &[AgentResult],
) -> FailureCounts {
    let mut counts = FailureCounts::new();

    for result in results {
        for instance_id in reference_ids.difference(&result.resolved) {
            *counts.entry(instance_id.clone()).or_insert(0) += 1;
        }
    }

    counts
}

/// Identifiers whose failure count equals `total_agents`.
pub fn select_all_failed(
    counts: &FailureCounts,
    total_agents: usize,
) -> Result<BTreeSet<String>, AnalysisError> {
    if total_agents == 0 {
        return Err(AnalysisError::InvalidArgument(
            "total agent count must be at least 1".to_string(),
        ));
    }

    Ok(counts
        .iter()
        .filter(|(_, count)| **count == total_agents)
        .map(|(id, _)| id.clone())
        .collect())
}

/// Reference records whose identifier is in `ids`, in dataset order.
pub fn filter_instances<'a>(
    instances: &'a [InstanceRecord],
    ids: &BTreeSet<String>,
) -> Vec<&'a InstanceRecord> {
    instances
        .iter()
        .filter(|i| ids.contains(&i.instance_id))
        .collect()
}

/// Number of instances per value of `attribute`.
///
/// Instances without a value for the attribute are skipped.
pub fn group_totals<'a, I>(instances: I, attribute: GroupAttribute) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a InstanceRecord>,
{
    let mut totals: BTreeMap<String, usize> = BTreeMap::new();

    for instance in instances {
        if let Some(key) = instance.attribute(attribute) {
            *totals.entry(key).or_default() += 1;
        }
    }

    totals
}

/// Group all-failed instances by `attribute` and rate each group against
/// its size in the full reference collection.
///
/// A group whose reference total is missing or zero gets a rate of 0.0.
pub fn group_and_rate(
    instances: &[&InstanceRecord],
    attribute: GroupAttribute,
    reference_counts: &BTreeMap<String, usize>,
) -> BTreeMap<String, GroupStat> {
    group_totals(instances.iter().copied(), attribute)
        .into_iter()
        .map(|(key, count)| {
            let total = reference_counts.get(&key).copied().unwrap_or(0);
            let stat = GroupStat {
                count,
                total,
                rate: percentage(count, total),
            };
            (key, stat)
        })
        .collect()
}

/// Groups ordered by count (highest first), ties broken by key.
pub fn rank_groups(groups: &BTreeMap<String, GroupStat>) -> Vec<(&str, &GroupStat)> {
    let mut ranked: Vec<_> = groups.iter().map(|(k, v)| (k.as_str(), v)).collect();
    // BTreeMap iteration is already key-ordered; a stable sort keeps ties that way.
    ranked.sort_by_key(|(_, stat)| std::cmp::Reverse(stat.count));
    ranked
}

/// Instances ordered by failure count (highest first), ties broken by id.
pub fn sorted_by_failures(counts: &FailureCounts) -> Vec<(&str, usize)> {
    let mut sorted: Vec<_> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    sorted.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    sorted
}

/// `part / whole * 100`, or 0.0 when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Extract the calendar year from a dataset timestamp.
pub fn year_of(timestamp: &str) -> Option<i32> {
    let timestamp = timestamp.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.year());
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, format) {
            return Some(dt.year());
        }
    }

    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}
