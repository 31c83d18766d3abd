use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use tracing::info;

use engine::{Mission, MissionSpec, MissionSummary, Outcome};

// ============================================================================
// Batch Runs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub seed: u64,
    pub runs: u32,
    pub max_ticks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub victories: u32,
    pub defeats: u32,
    pub unfinished: u32,
    pub mean_ticks: f64,
    pub runs: Vec<MissionSummary>,
}

impl BatchReport {
    #[must_use]
    pub fn from_runs(runs: Vec<MissionSummary>) -> Self {
        let count = |outcome: Option<Outcome>| runs.iter().filter(|run| run.outcome == outcome).count() as u32;
        let total_ticks: u64 = runs.iter().map(|run| run.ticks).sum();
        let mean_ticks = if runs.is_empty() {
            0.0
        } else {
            total_ticks as f64 / runs.len() as f64
        };
        Self {
            victories: count(Some(Outcome::Victory)),
            defeats: count(Some(Outcome::Defeat)),
            unfinished: count(None),
            mean_ticks,
            runs,
        }
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        f64::from(self.victories) / self.runs.len() as f64
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            writeln!(f, "{run}")?;
        }
        if self.runs.len() > 1 {
            writeln!(
                f,
                "{} runs: {} victories, {} defeats, {} unfinished ({:.0}% wins, {:.1} ticks on average)",
                self.runs.len(),
                self.victories,
                self.defeats,
                self.unfinished,
                self.win_rate() * 100.0,
                self.mean_ticks
            )?;
        }
        Ok(())
    }
}

// Play the mission once per seed, starting at `options.seed` and counting up
pub fn run_batch(spec: &MissionSpec, options: &BatchOptions) -> Result<BatchReport> {
    let mut runs = Vec::with_capacity(options.runs as usize);
    for offset in 0..u64::from(options.runs.max(1)) {
        let seed = options.seed.wrapping_add(offset);
        let mut mission = Mission::new(spec, seed).with_context(|| format!("failed to set up '{}'", spec.name))?;
        let summary = mission.run_to_completion(options.max_ticks);
        info!(seed, ticks = summary.ticks, outcome = ?summary.outcome, "run finished");
        runs.push(summary);
    }
    Ok(BatchReport::from_runs(runs))
}
