//! Text charts for terminal and Markdown output.
//!
//! Bars are drawn with block characters and scaled so the largest value
//! spans the configured width.

use crate::models::FailureHistogram;

const FULL: &str = "█";
const HIGHLIGHT: &str = "▓";

/// One horizontal bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Text printed after the bar (usually the formatted value).
    pub annotation: String,
    pub highlight: bool,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: f64, annotation: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            annotation: annotation.into(),
            highlight: false,
        }
    }

    /// Bar for an integer count, annotated with the count itself.
    pub fn count(label: impl Into<String>, count: usize) -> Self {
        Self::new(label, count as f64, count.to_string())
    }
}

/// Length of a bar for `value` when `max` spans `width` characters.
///
/// Non-zero values always get at least one block.
pub fn bar_length(value: f64, max: f64, width: usize) -> usize {
    if value <= 0.0 || max <= 0.0 {
        return 0;
    }
    let len = ((value / max) * width as f64).round() as usize;
    len.clamp(1, width.max(1))
}

/// Render a titled horizontal bar chart.
pub fn bar_chart(title: &str, bars: &[Bar], width: usize) -> String {
    let mut chart = String::new();

    chart.push_str(title);
    chart.push('\n');

    if bars.is_empty() {
        chart.push_str("  (no data)\n");
        return chart;
    }

    let label_width = bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);

    for bar in bars {
        let block = if bar.highlight { HIGHLIGHT } else { FULL };
        let len = bar_length(bar.value, max, width);
        chart.push_str(&format!(
            "  {:>lw$} │{}{} {}",
            bar.label,
            block.repeat(len),
            " ".repeat(width.saturating_sub(len)),
            bar.annotation,
            lw = label_width
        ));
        if bar.highlight {
            chart.push_str("  ◀ all agents failed");
        }
        chart.push('\n');
    }

    chart
}

/// Render a failure count histogram, optionally highlighting one bin.
pub fn histogram_chart(
    title: &str,
    histogram: &FailureHistogram,
    highlight: Option<usize>,
    width: usize,
) -> String {
    let bars: Vec<Bar> = histogram
        .iter()
        .map(|(failures, instances)| Bar {
            highlight: highlight == Some(failures),
            ..Bar::count(failures.to_string(), instances)
        })
        .collect();

    bar_chart(title, &bars, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_length() {
        assert_eq!(bar_length(10.0, 10.0, 40), 40);
        assert_eq!(bar_length(5.0, 10.0, 40), 20);
        assert_eq!(bar_length(0.1, 100.0, 40), 1);
        assert_eq!(bar_length(0.0, 10.0, 40), 0);
        assert_eq!(bar_length(3.0, 0.0, 40), 0);
    }

    #[test]
    fn test_bar_chart() {
        let bars = vec![Bar::count("django/django", 4), Bar::count("sympy/sympy", 2)];
        let chart = bar_chart("Top repositories", &bars, 8);

        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Top repositories");
        assert!(lines[1].contains(&"█".repeat(8)));
        assert!(lines[1].ends_with(" 4"));
        assert!(lines[2].contains(&"█".repeat(4)));
        assert!(!lines[2].contains(&"█".repeat(5)));
        // Labels are right-aligned to the same column.
        assert_eq!(lines[1].find('│'), lines[2].find('│'));
    }

    #[test]
    fn test_empty_chart() {
        let chart = bar_chart("Nothing", &[], 10);
        assert!(chart.contains("(no data)"));
    }

    #[test]
    fn test_histogram_highlight() {
        let histogram = FailureHistogram {
            bins: vec![3, 1, 2],
        };
        let chart = histogram_chart("Failures", &histogram, Some(3), 6);

        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains(&"█".repeat(6)));
        assert!(lines[3].contains("▓▓▓▓"));
        assert!(lines[3].contains("all agents failed"));
        assert!(!lines[2].contains("all agents failed"));
    }
}
