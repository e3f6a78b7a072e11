use clap::Parser;
use pipewright_cli::app;
use pipewright_cli::commands::cli;
use pipewright_core::error::{self, CollectError, ExecutorError, RunnerError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pipewright: {e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = cli::Args::parse();
    let cfg = match &args.config {
        Some(path) => {
            let mut cfg = pipewright_core::config::load_from_path(path)
                .map_err(|e| error::CliError::Config(e.to_string()))?;
            pipewright_core::config::apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
            cfg
        }
        None => pipewright_core::config::load_default()
            .map_err(|e| error::CliError::Config(e.to_string()))?,
    };
    init_tracing(&cfg.logging).map_err(error::CliError::Config)?;

    match args.command {
        cli::Commands::Run(run_args) => app::run_plan(&run_args, &cfg).await,
        cli::Commands::Plan(plan_args) => app::show_plan(&plan_args, &cfg),
        cli::Commands::Collect(collect_args) => app::collect_only(&collect_args, &cfg),
    }
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0: all phases completed
    // 1: aborted by a required job (returned as a normal exit code, not as an error)
    // 11: config or plan error
    // 20: IO error, including artifact collection
    // 50: internal/uncategorized
    match e {
        error::CliError::Config(_) => 11,
        error::CliError::Plan(_) => 11,
        error::CliError::Executor(ee) => match ee {
            ExecutorError::Runner(RunnerError::Join(_))
            | ExecutorError::Interrupted {
                source: RunnerError::Join(_),
                ..
            } => 50,
            ExecutorError::Runner(_) | ExecutorError::Interrupted { .. } => 20,
            ExecutorError::DuplicateRecord(_) => 50,
        },
        error::CliError::Collect(ce) => match ce {
            CollectError::InvalidCategory { .. } | CollectError::Pattern { .. } => 11,
            _ => 20,
        },
        error::CliError::Io(_) => 20,
        error::CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &pipewright_core::config::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(shellexpand::tilde(d).as_ref()),
            None => std::env::temp_dir().join("pipewright"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("pipewright.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
