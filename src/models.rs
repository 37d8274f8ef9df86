//! Data models for the failure analysis.
//!
//! This module contains the core data structures used throughout the
//! application: reference instances, per-agent results, grouping
//! statistics, and the report types written to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Placeholder used wherever an optional attribute is absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Failure count per instance identifier.
///
/// Only identifiers that failed for at least one agent have an entry.
pub type FailureCounts = BTreeMap<String, usize>;

/// One benchmark instance from the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Unique instance identifier.
    pub instance_id: String,
    /// Repository the instance was drawn from (e.g. `django/django`).
    pub repo: String,
    /// Difficulty label, if the dataset provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Creation timestamp as found in the dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Free-text problem description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
}

impl InstanceRecord {
    /// Year the instance was created, if the timestamp parses.
    pub fn created_year(&self) -> Option<i32> {
        self.created_at
            .as_deref()
            .and_then(crate::analysis::year_of)
    }

    /// Value of `attribute` for this instance, if present.
    pub fn attribute(&self, attribute: GroupAttribute) -> Option<String> {
        match attribute {
            GroupAttribute::Repository => Some(self.repo.clone()),
            GroupAttribute::Difficulty => self.difficulty.clone(),
            GroupAttribute::Year => self.created_year().map(|y| y.to_string()),
        }
    }
}

/// The set of instances one agent resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResult {
    /// Agent (submission) name, e.g. `20250612_trae`.
    pub agent: String,
    /// Resolved instance identifiers.
    pub resolved: BTreeSet<String>,
}

impl AgentResult {
    pub fn new<I, S>(agent: &str, resolved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agent: agent.to_string(),
            resolved: resolved.into_iter().map(Into::into).collect(),
        }
    }
}

/// On-disk shape of a per-agent `results.json`.
///
/// `resolved` stays optional here so a missing field surfaces as a typed
/// error instead of a generic parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsFile {
    #[serde(default)]
    pub resolved: Option<BTreeSet<String>>,
}

/// Attribute used to group instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupAttribute {
    Repository,
    Difficulty,
    Year,
}

impl fmt::Display for GroupAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupAttribute::Repository => write!(f, "Repository"),
            GroupAttribute::Difficulty => write!(f, "Difficulty"),
            GroupAttribute::Year => write!(f, "Year"),
        }
    }
}

/// Count and rate of all-failed instances within one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    /// All-failed instances in the group.
    pub count: usize,
    /// Reference instances in the group.
    pub total: usize,
    /// `count / total * 100`, or 0.0 when the total is zero.
    pub rate: f64,
}

impl GroupStat {
    /// Marker for the difficulty chart: red above 50%, orange above 25%.
    pub fn emoji(&self) -> &'static str {
        if self.rate > 50.0 {
            "🔴"
        } else if self.rate > 25.0 {
            "🟠"
        } else {
            "🟡"
        }
    }
}

/// One row of the all-failed summary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllFailedEntry {
    pub instance_id: String,
    pub repo: String,
    pub difficulty: String,
    pub created_at: String,
    pub problem_statement: String,
}

impl AllFailedEntry {
    /// Build an entry, truncating the problem statement to `limit` characters.
    pub fn from_instance(instance: &InstanceRecord, limit: usize) -> Self {
        Self {
            instance_id: instance.instance_id.clone(),
            repo: instance.repo.clone(),
            difficulty: instance
                .difficulty
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            created_at: instance
                .created_at
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            problem_statement: instance
                .problem_statement
                .as_deref()
                .map(|text| truncate_description(text, limit))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

/// Keep at most `limit` characters of `text` and append `...`.
pub fn truncate_description(text: &str, limit: usize) -> String {
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}

/// Descriptive statistics over a failure count table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureStats {
    /// Instances with at least one failure.
    pub total: usize,
    pub mean: f64,
    pub median: f64,
    pub max: usize,
}

impl FailureStats {
    /// Creates statistics from a failure count table.
    pub fn from_counts(counts: &FailureCounts) -> Self {
        if counts.is_empty() {
            return Self::default();
        }

        let mut values: Vec<usize> = counts.values().copied().collect();
        values.sort_unstable();

        let total = values.len();
        let sum: usize = values.iter().sum();
        let mid = total / 2;
        let median = if total % 2 == 0 {
            (values[mid - 1] + values[mid]) as f64 / 2.0
        } else {
            values[mid] as f64
        };

        Self {
            total,
            mean: sum as f64 / total as f64,
            median,
            max: values[total - 1],
        }
    }
}

/// Number of instances for each failure count `1..=bins.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureHistogram {
    /// `bins[i]` holds the instances that failed for exactly `i + 1` agents.
    pub bins: Vec<usize>,
}

impl FailureHistogram {
    /// Bucket every count into `1..=bins`; counts outside that range are dropped.
    pub fn from_counts(counts: &FailureCounts, bins: usize) -> Self {
        let mut histogram = vec![0; bins];
        for &count in counts.values() {
            if (1..=bins).contains(&count) {
                histogram[count - 1] += 1;
            }
        }
        Self { bins: histogram }
    }

    /// `(failure count, instances)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bins.iter().enumerate().map(|(i, n)| (i + 1, *n))
    }
}

/// Metadata about an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Reference dataset the analysis ran against.
    pub dataset: String,
    /// Agents whose results were aggregated.
    pub agents: Vec<String>,
    /// Number of reference instances.
    pub total_instances: usize,
    /// Number of instances no agent resolved.
    pub all_failed: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// All-failed counts per repository.
    pub by_repository: BTreeMap<String, GroupStat>,
    /// All-failed counts per difficulty label.
    pub by_difficulty: BTreeMap<String, GroupStat>,
    /// Reference instances per difficulty label.
    pub difficulty_totals: BTreeMap<String, usize>,
    /// All-failed counts per creation year.
    pub by_year: BTreeMap<String, GroupStat>,
    /// Reference instances per creation year.
    pub year_totals: BTreeMap<String, usize>,
    /// Distribution of failure counts over `1..=agents`.
    pub histogram: FailureHistogram,
    /// Statistics over the failure count table.
    pub stats: FailureStats,
    /// All-failed instances in dataset order.
    pub instances: Vec<AllFailedEntry>,
}
