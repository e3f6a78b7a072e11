use std::time::Duration;

use pipewright_core::executor::traits::{OutputRendererPlugin, RenderEvent};
use pipewright_core::plan::Criticality;
use pipewright_core::util::format_duration;

/// Lines of captured output shown under a job that did not succeed.
const FAILURE_TAIL_LINES: usize = 12;

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                total_jobs,
                total_phases,
            } => format!(
                "RUN START {} (jobs: {}, phases: {})",
                run_id, total_jobs, total_phases
            ),
            RenderEvent::Plan { run_id, phases } => {
                let mut out = format!("PLAN {}:", run_id);
                for (idx, (phase, jobs)) in phases.iter().enumerate() {
                    out.push_str(&format!("\n  phase {} {}: {}", idx + 1, phase, jobs.join(", ")));
                }
                out
            }
            RenderEvent::PhaseStart {
                phase_id,
                phase,
                job_names,
                ..
            } => format!(
                "{} phase {}: {} ({} jobs)",
                if self.ascii_only { "==>" } else { "▶" },
                phase_id + 1,
                phase,
                job_names.len()
            ),
            RenderEvent::JobStart {
                job, criticality, ..
            } => match criticality {
                Criticality::Required => format!("  building {}", job),
                Criticality::Optional => format!("  building {} (optional)", job),
            },
            RenderEvent::JobComplete {
                criticality,
                result,
                ..
            } => {
                let mut line = format!(
                    "  {} {} {} in {}",
                    result.outcome.symbol(self.ascii_only),
                    result.job_name,
                    result.outcome,
                    format_duration(Duration::from_millis(result.duration_ms))
                );
                if !result.outcome.is_success() {
                    if let Some(reason) = &result.diagnostic {
                        line.push_str(&format!(": {}", reason));
                    }
                    if *criticality == Criticality::Optional {
                        line.push_str(" (optional, continuing)");
                    }
                    line.push_str(&format!("\n    log: {}", result.log_path.display()));
                    for tail in tail_lines(&result.output_tail, FAILURE_TAIL_LINES) {
                        line.push_str(&format!("\n    | {}", tail));
                    }
                }
                line
            }
            RenderEvent::PhaseEnd { phase_id, phase, .. } => {
                format!("PHASE END {} ({})", phase_id + 1, phase)
            }
            RenderEvent::RunEnd { run_id, result } => format!(
                "RUN END {} ({}, {} of {} jobs run, {} failed, duration {})",
                run_id,
                result.status,
                result.ledger.len(),
                result.total_jobs,
                result.failed(),
                format_duration(Duration::from_millis(result.duration_ms))
            ),
            RenderEvent::Report { report, .. } => report.render_summary(self.ascii_only),
        }
    }
}

fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].to_vec()
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        println!("{}", self.format_event(event));
    }
}
