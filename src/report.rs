//! Plain-text reports: the per-run timing table, the failure section and
//! the summary of repeated runs. Pure formatting over recorded outcomes.

use std::fmt::Write as _;
use std::time::Duration;

use crate::api::FoundationModel;
use crate::pipeline::{PipelineResult, StageOutcome, StageState};

const RULE_WIDTH: usize = 50;
const CATALOG_RULE_WIDTH: usize = 40;
const BENCH_WIDTH: usize = 80;

pub const FAILURE_HINTS: [&str; 4] = [
    "Network connectivity issue",
    "Invalid AWS credentials",
    "Model not available in region",
    "Insufficient permissions for the model",
];

fn status_marker(success: bool) -> &'static str {
    if success { "[SUCCESS]" } else { "[FAILED]" }
}

/// One line per attempted stage followed by the total.
pub fn timing_summary(outcomes: &[StageOutcome], total: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "*** TIMING SUMMARY ***");
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for outcome in outcomes {
        let _ = writeln!(
            out,
            "{:<35}: {:>8.2} sec {}",
            outcome.name(),
            outcome.duration_seconds(),
            status_marker(outcome.success())
        );
    }
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "Total Pipeline Time: {:.2} seconds", total.as_secs_f64());
    let _ = write!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

/// Possible causes of a failed stage, naming `region` when known.
pub fn failure_hints(region: Option<&str>) -> Vec<String> {
    FAILURE_HINTS
        .iter()
        .map(|hint| match region {
            Some(region) if hint.ends_with("in region") => format!("{hint} {region}"),
            _ => hint.to_string(),
        })
        .collect()
}

/// Failure section for an aborted run; `None` when the run succeeded.
pub fn failure_summary(result: &PipelineResult, region: Option<&str>) -> Option<String> {
    let (index, outcome) = result.failed_stage()?;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "[FAILED] PIPELINE FAILED at stage {}/{} ({})",
        index + 1,
        result.stage_count(),
        outcome.name()
    );
    let _ = writeln!(out, "Error details: {}", outcome.error().unwrap_or_default());
    let _ = writeln!(out, "Stage time: {:.2} seconds", outcome.duration_seconds());
    let _ = writeln!(
        out,
        "Time spent before failure: {:.2} seconds",
        result.total_duration_seconds()
    );
    let skipped = result
        .stage_states()
        .into_iter()
        .filter(|s| *s == StageState::Pending)
        .count();
    if skipped > 0 {
        let _ = writeln!(out, "Stages not run: {skipped}");
    }
    let _ = writeln!(out);
    let _ = write!(out, "Possible causes:");
    for (i, hint) in failure_hints(region).iter().enumerate() {
        let _ = write!(out, "\n{}. {hint}", i + 1);
    }
    Some(out)
}

/// Foundation models offered by the endpoint, one block per model.
pub fn model_catalog(region: Option<&str>, models: &[FoundationModel]) -> String {
    let mut out = String::new();
    if let Some(region) = region {
        let _ = writeln!(out, "Using region: {region}");
    }
    let _ = write!(out, "Found {} models:", models.len());
    for model in models {
        let _ = write!(
            out,
            "\n\nModel ID: {}\nModel Name: {}\nProvider: {}\n{}",
            model.model_id,
            model.model_name,
            model.provider_name,
            "-".repeat(CATALOG_RULE_WIDTH)
        );
    }
    out
}

/// Averages and extremes over several runs of the same pipeline.
#[derive(Debug, Clone)]
pub struct BenchmarkSummary {
    runs: Vec<PipelineResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageAverage {
    pub name: String,
    pub average: Duration,
    pub samples: usize,
}

impl BenchmarkSummary {
    pub fn new(runs: Vec<PipelineResult>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[PipelineResult] {
        &self.runs
    }

    /// Vacuously true for zero runs.
    pub fn all_succeeded(&self) -> bool {
        self.runs.iter().all(PipelineResult::overall_success)
    }

    fn successful(&self) -> impl Iterator<Item = (usize, &PipelineResult)> {
        self.runs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.overall_success())
    }

    /// Zero-based index and total of the fastest successful run.
    pub fn fastest(&self) -> Option<(usize, Duration)> {
        self.successful()
            .map(|(i, r)| (i, r.total_duration()))
            .min_by_key(|(_, d)| *d)
    }

    pub fn slowest(&self) -> Option<(usize, Duration)> {
        self.successful()
            .map(|(i, r)| (i, r.total_duration()))
            .max_by_key(|(_, d)| *d)
    }

    /// Mean duration per stage over successful outcomes, in first-seen order.
    pub fn stage_averages(&self) -> Vec<StageAverage> {
        let mut sums: Vec<(String, Duration, usize)> = Vec::new();
        for outcome in self.runs.iter().flat_map(|r| r.outcomes()) {
            if !outcome.success() {
                continue;
            }
            match sums.iter_mut().find(|(name, _, _)| name == outcome.name()) {
                Some((_, sum, count)) => {
                    *sum += outcome.duration();
                    *count += 1;
                }
                None => sums.push((outcome.name().to_string(), outcome.duration(), 1)),
            }
        }

        sums.into_iter()
            .map(|(name, sum, samples)| StageAverage {
                name,
                average: sum / samples as u32,
                samples,
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let fastest = self.fastest();

        let mut out = String::new();
        let _ = writeln!(out, "*** BENCHMARK SUMMARY ***");
        let _ = writeln!(out, "{}", "=".repeat(BENCH_WIDTH));
        let _ = writeln!(out, "{:<10} {:<10} {:<15} Performance", "Run", "Status", "Total Time");
        let _ = writeln!(out, "{}", "-".repeat(BENCH_WIDTH));

        for (i, run) in self.runs.iter().enumerate() {
            let total = run.total_duration();
            let performance = if !run.overall_success() {
                "FAILED".to_string()
            } else {
                match fastest {
                    Some((_, best)) if total == best => "*** FASTEST ***".to_string(),
                    Some((_, best)) => match ratio(total, best) {
                        Some(r) => format!("{r:.1}x slower"),
                        None => "-".to_string(),
                    },
                    None => "-".to_string(),
                }
            };
            let _ = writeln!(
                out,
                "{:<10} {:<10} {:<15} {performance}",
                format!("#{}", i + 1),
                status_marker(run.overall_success()),
                format!("{:.2}s", total.as_secs_f64())
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(BENCH_WIDTH));

        let averages = self.stage_averages();
        if !averages.is_empty() {
            let _ = writeln!(out, "Stage averages (successful stages):");
            for avg in &averages {
                let _ = writeln!(
                    out,
                    "  {:<33}: {:>8.2} sec ({} of {} runs)",
                    avg.name,
                    avg.average.as_secs_f64(),
                    avg.samples,
                    self.runs.len()
                );
            }
        }

        match (fastest, self.slowest()) {
            (Some((fi, fd)), Some((si, sd))) => {
                let _ = writeln!(out, "Fastest: run #{} ({:.2}s)", fi + 1, fd.as_secs_f64());
                let _ = write!(out, "Slowest: run #{} ({:.2}s)", si + 1, sd.as_secs_f64());
                if let Some(r) = ratio(sd, fd) {
                    let _ = write!(out, "\nSpeed difference: {r:.1}x");
                }
            }
            _ => {
                let _ = write!(out, "No successful runs");
            }
        }

        out
    }
}

fn ratio(slow: Duration, fast: Duration) -> Option<f64> {
    if fast.is_zero() {
        return None;
    }
    Some(slow.as_secs_f64() / fast.as_secs_f64())
}
