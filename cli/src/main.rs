use boundary_cli::app;
use boundary_cli::commands::cli;
use boundary_core::config;
use boundary_core::error;
use clap::Parser;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error.kind = "cli.failed", error.message = %e);
            eprintln!("stdio-boundary: {e}");
            exit_code_for_error(&e)
        }
    };

    // process::exit skips destructors; flush the file appender first.
    if let Ok(mut guard) = LOG_GUARD.lock() {
        guard.take();
    }
    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = cli::Args::parse();
    let mut cfg = config::load_default(args.config.as_deref())
        .map_err(|e| error::CliError::Config(e.to_string()))?;
    app::apply_cli_overrides(&mut cfg, &args)?;
    init_tracing(&cfg.logging).map_err(error::CliError::Config)?;

    app::run_app_with_config(&args, &cfg).await
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0..=255: child exit code, passed through on normal termination
    // 11: config error
    // 20: spawn failure / stream IO error
    // 50: plugin/internal failure
    match e {
        error::CliError::Config(_) => 11,
        error::CliError::Runner(re) => match re {
            error::RunnerError::Config(_) => 11,
            error::RunnerError::Spawn(_) => 20,
            error::RunnerError::StreamIo { .. } => 20,
            error::RunnerError::Plugin(_) => 50,
        },
    }
}

fn init_tracing(logging: &config::LoggingConfig) -> Result<(), String> {
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
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("stdio-boundary"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("stdio-boundary.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        if let Ok(mut slot) = LOG_GUARD.lock() {
            *slot = Some(guard);
        }
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    // stdout carries the protocol stream; diagnostics only ever go to stderr or the file.
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
