use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::runner::Outcome;

/// Visual progress monitor for a run
///
/// One overall bar for the whole plan and a spinner for the job in flight.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    job_bars: HashMap<String, ProgressBar>,
    enabled: bool,
    ascii: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_jobs` - Number of declared jobs
    /// * `enabled` - Whether to draw anything at all (off for jsonl output)
    pub fn new(total_jobs: usize, enabled: bool, ascii: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                job_bars: HashMap::new(),
                enabled: false,
                ascii,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_jobs as u64));
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} jobs ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(if ascii { "=> " } else { "█▓▒░  " });
        overall.set_style(style);
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            job_bars: HashMap::new(),
            enabled: true,
            ascii,
        }
    }

    pub fn add_job(&mut self, job_name: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        let ticks: &[&str] = if self.ascii {
            &["|", "/", "-", "\\"]
        } else {
            &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]
        };
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(ticks),
        );
        bar.set_message(format!("building {job_name}"));
        bar.enable_steady_tick(Duration::from_millis(100));

        self.job_bars.insert(job_name.to_string(), bar);
    }

    pub fn complete_job(&mut self, job_name: &str, outcome: Outcome, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.job_bars.remove(job_name) {
            bar.finish_with_message(format!(
                "{} {} ({})",
                outcome.symbol(self.ascii),
                job_name,
                crate::util::format_duration(Duration::from_millis(duration_ms))
            ));
        }

        self.overall.inc(1);
    }

    pub fn update_phase(&self, phase_id: usize, total_phases: usize, phase: &str) {
        if self.enabled {
            self.overall
                .set_message(format!("phase {}/{}: {}", phase_id + 1, total_phases, phase));
        }
    }

    pub fn finish(&self, completed: bool) {
        if !self.enabled {
            return;
        }

        let msg = if completed {
            "all phases completed"
        } else {
            "run aborted"
        };
        self.overall.abandon_with_message(msg.to_string());
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.job_bars.drain() {
            bar.finish_and_clear();
        }
    }
}
