//! CLI wiring: merge overrides into the config, build plugins, dispatch.

use std::sync::Arc;
use std::time::Instant;

use pipewright_core::api as core_api;
use pipewright_core::api::{CliError, ExecutorError, OutputRendererPlugin, RenderEvent, RunReport};
use pipewright_plugins::factory;

use crate::commands::cli::{CollectArgs, PathOverrides, PlanArgs, RunArgs};

/// Exit status of a run whose required job did not succeed.
pub const EXIT_ABORTED: i32 = 1;

pub fn apply_path_overrides(cfg: &mut core_api::AppConfig, paths: &PathOverrides) {
    if let Some(v) = &paths.log_dir {
        cfg.paths.log_dir = v.clone();
    }
    if let Some(v) = &paths.build_root {
        cfg.paths.build_root = v.clone();
    }
    if let Some(v) = &paths.output_dir {
        cfg.paths.output_dir = v.clone();
    }
}

fn context_for(cfg: &core_api::AppConfig, paths: &PathOverrides) -> core_api::AppContext {
    let mut cfg = cfg.clone();
    apply_path_overrides(&mut cfg, paths);
    let runner = factory::build_runner(&cfg);
    core_api::AppContext::new(cfg, runner)
}

fn emit_report(renderer: Option<&Arc<dyn OutputRendererPlugin>>, report: &RunReport, ascii: bool) {
    match renderer {
        Some(renderer) => renderer.render(&RenderEvent::Report {
            run_id: report.run_id.clone(),
            report: report.clone(),
        }),
        None => println!("{}", report.render_summary(ascii)),
    }
}

#[tracing::instrument(name = "cli.run", skip_all, fields(plan = %args.plan.display()))]
pub async fn run_plan(args: &RunArgs, cfg: &core_api::AppConfig) -> Result<i32, CliError> {
    let started = Instant::now();
    let plan = core_api::load_plan(&args.plan)?;

    let mut cfg = cfg.clone();
    if args.echo {
        cfg.runner.echo_output = true;
    }
    let ctx = context_for(&cfg, &args.paths);
    let layout = ctx.layout();

    let mut opts = core_api::ExecutionOpts::new(args.format.as_str())
        .with_progress(args.progress)
        .verbose(args.verbose);
    opts.ascii = args.ascii;

    let renderer = factory::build_renderer(args.format.as_str(), args.ascii);
    let engine = core_api::ExecutionEngine::builder(&ctx, &opts)
        .maybe_renderer(renderer.clone())
        .build();
    let (result, fault) = match engine.execute(&plan).await {
        Ok(result) => (result, None),
        Err(ExecutorError::Interrupted {
            partial, source, ..
        }) => (*partial, Some(source)),
        Err(e) => return Err(e.into()),
    };

    // Collection runs after an abort too; whatever succeeded is still packaged.
    let roots = core_api::search_roots(&result.ledger, &layout);
    let collection = core_api::collect_and_install(ctx.cfg(), &roots, &layout.output_dir)?;

    let report = RunReport::from_execution(
        &plan,
        &result,
        collection.artifacts,
        collection.missing_mandatory,
        layout.output_dir.clone(),
        Some(collection.installer),
        layout.log_dir.clone(),
        started.elapsed(),
    );
    emit_report(renderer.as_ref(), &report, args.ascii);

    if let Some(source) = fault {
        return Err(ExecutorError::Runner(source).into());
    }

    match result.abort_reason() {
        None => Ok(0),
        Some(job) => {
            let log = result
                .job_result(job)
                .map(|r| r.log_path.display().to_string())
                .unwrap_or_default();
            eprintln!("pipewright: run aborted: required job '{job}' did not succeed (log: {log})");
            Ok(EXIT_ABORTED)
        }
    }
}

/// Text outline of a plan, including where each job's log and build tree go.
pub fn describe_plan(plan: &core_api::PhasePlan, layout: &core_api::RunLayout) -> String {
    let mut out = format!(
        "{} phases, {} jobs (base dir {})\n",
        plan.phases().len(),
        plan.job_count(),
        plan.base_dir().display()
    );
    for (i, phase) in plan.phases().iter().enumerate() {
        out.push_str(&format!("\nphase {}: {}\n", i + 1, phase.name));
        if phase.jobs.is_empty() {
            out.push_str("  (no jobs)\n");
        }
        for job in &phase.jobs {
            out.push_str(&format!(
                "  {:<9} {}  {}\n            log {}  build {}\n",
                job.criticality.as_str(),
                job.name,
                job.unit.describe(),
                layout.log_path(&job.name).display(),
                layout.build_dir(&job.name).display()
            ));
        }
    }
    out
}

#[tracing::instrument(name = "cli.plan", skip_all, fields(plan = %args.plan.display()))]
pub fn show_plan(args: &PlanArgs, cfg: &core_api::AppConfig) -> Result<i32, CliError> {
    let plan = core_api::load_plan(&args.plan)?;
    let mut cfg = cfg.clone();
    apply_path_overrides(&mut cfg, &args.paths);
    print!("{}", describe_plan(&plan, &cfg.paths.layout()));
    Ok(0)
}

#[tracing::instrument(name = "cli.collect", skip_all, fields(plan = %args.plan.display()))]
pub fn collect_only(args: &CollectArgs, cfg: &core_api::AppConfig) -> Result<i32, CliError> {
    let started_at = chrono::Local::now();
    let started = Instant::now();
    let plan = core_api::load_plan(&args.plan)?;

    let mut cfg = cfg.clone();
    apply_path_overrides(&mut cfg, &args.paths);
    let layout = cfg.paths.layout();

    let roots = core_api::search_roots_for_plan(&plan, &layout);
    let collection = core_api::collect_and_install(&cfg, &roots, &layout.output_dir)?;
    let report = RunReport::collection_only(
        collection,
        layout.output_dir.clone(),
        layout.log_dir.clone(),
        started_at,
        started.elapsed(),
    );
    emit_report(None, &report, args.ascii);
    Ok(0)
}
