// src/report.rs
//
// Fixed-width text digest of a simulation report, one line per attribute:
//
//   SUMMARY
//     trials:            1000 / 1000
//     Explorer.energy    mean=50.0213  median=...  std(pop)=...  min=...  max=...  p05=...  p95=...
//     Explorer.label     stable=100.00%
//
// Categorical lines list at most TOP_LABELS labels by descending frequency.

use std::fmt::Write;

use crate::aggregate::{AttributeStats, CategoricalStats, NumericStats};
use crate::simulate::SimulationReport;

const TOP_LABELS: usize = 5;

/// One-line description of the run, printed before the digest.
pub fn header_line(report: &SimulationReport) -> String {
    let seed = match report.seed {
        Some(s) => s.to_string(),
        None => "entropy".to_string(),
    };
    format!(
        "tanzo-sim v{} | profile={} trials={} seed={} threads={} streams={:?}",
        env!("CARGO_PKG_VERSION"),
        report.profile_name,
        report.requested_trials,
        seed,
        report.threads,
        report.stream_mode,
    )
}

pub fn render_text(report: &SimulationReport) -> String {
    let names: Vec<String> = report
        .summary
        .attributes
        .iter()
        .map(|a| a.key.to_string())
        .collect();
    let width = names.iter().map(String::len).max().unwrap_or(0).max(16);

    let mut out = String::new();
    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(
        out,
        "  {:<width$}  {} / {}{}",
        "trials:",
        report.completed_trials,
        report.requested_trials,
        if report.cancelled { "  (cancelled)" } else { "" },
    );
    for (name, attr) in names.iter().zip(&report.summary.attributes) {
        let body = match &attr.stats {
            AttributeStats::Numeric(n) => numeric_line(n),
            AttributeStats::Categorical(c) => categorical_line(c),
        };
        let _ = writeln!(out, "  {name:<width$}  {body}");
    }
    let _ = writeln!(out, "  {:<width$}  {}", "checksum:", report.checksum);
    out
}

fn numeric_line(n: &NumericStats) -> String {
    if n.is_empty() {
        return "no data".to_string();
    }
    format!(
        "mean={:.4}  median={:.4}  std(pop)={:.4}  min={:.4}  max={:.4}  p05={:.4}  p95={:.4}",
        n.mean, n.median, n.std_dev, n.min, n.max, n.p05, n.p95
    )
}

fn categorical_line(c: &CategoricalStats) -> String {
    let ranked = c.ranked();
    let mut parts: Vec<String> = ranked
        .iter()
        .take(TOP_LABELS)
        .map(|(label, f)| format!("{label}={:.2}%", 100.0 * f))
        .collect();
    if ranked.len() > TOP_LABELS {
        parts.push(format!("(+{} more)", ranked.len() - TOP_LABELS));
    }
    parts.join("  ")
}
