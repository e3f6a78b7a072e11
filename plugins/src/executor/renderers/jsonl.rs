use chrono::Local;
use pipewright_core::executor::traits::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                total_jobs,
                total_phases,
            } => json!({
                "v": 1,
                "type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_jobs": total_jobs,
                    "total_phases": total_phases,
                }
            }),
            RenderEvent::Plan { run_id, phases } => {
                let phases: Vec<Value> = phases
                    .iter()
                    .map(|(name, jobs)| json!({ "name": name, "jobs": jobs }))
                    .collect();
                json!({
                    "v": 1,
                    "type": "run.plan",
                    "ts": ts,
                    "run_id": run_id,
                    "metadata": {
                        "phases": phases,
                    }
                })
            }
            RenderEvent::PhaseStart {
                run_id,
                phase_id,
                phase,
                job_names,
            } => json!({
                "v": 1,
                "type": "phase.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "phase_id": phase_id,
                    "phase": phase,
                    "jobs": job_names,
                }
            }),
            RenderEvent::JobStart {
                run_id,
                job,
                phase_id,
                criticality,
            } => json!({
                "v": 1,
                "type": "job.start",
                "ts": ts,
                "run_id": run_id,
                "job": job,
                "metadata": {
                    "phase_id": phase_id,
                    "criticality": criticality,
                }
            }),
            RenderEvent::JobComplete {
                run_id,
                criticality,
                result,
            } => json!({
                "v": 1,
                "type": "job.end",
                "ts": ts,
                "run_id": run_id,
                "job": result.job_name,
                "outcome": result.outcome,
                "code": result.exit.and_then(|e| e.exit_code),
                "metadata": {
                    "criticality": criticality,
                    "signal": result.exit.and_then(|e| e.signal),
                    "duration_ms": result.duration_ms,
                    "log_path": result.log_path,
                    "bytes_logged": result.bytes_logged,
                    "diagnostic": result.diagnostic,
                }
            }),
            RenderEvent::PhaseEnd {
                run_id,
                phase_id,
                phase,
            } => json!({
                "v": 1,
                "type": "phase.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "phase_id": phase_id,
                    "phase": phase,
                }
            }),
            RenderEvent::RunEnd { run_id, result } => json!({
                "v": 1,
                "type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "status": result.status,
                "ledger": result
                    .ledger
                    .iter()
                    .map(|(job, outcome)| json!({ "job": job, "outcome": outcome }))
                    .collect::<Vec<_>>(),
                "metadata": {
                    "total_jobs": result.total_jobs,
                    "attempted": result.ledger.len(),
                    "failed": result.failed(),
                    "duration_ms": result.duration_ms,
                }
            }),
            RenderEvent::Report { run_id, report } => json!({
                "v": 1,
                "type": "run.report",
                "ts": ts,
                "run_id": run_id,
                "report": report,
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}
