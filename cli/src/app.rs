//! CLI 应用装配层：合并配置覆盖、启动子进程，并把 stdio 接到 boundary filter 上。
use boundary_core::config::AppConfig;
use boundary_core::error::{CliError, RunnerError};
use boundary_core::runner::{run_session, RunSessionArgs, RunnerStartArgs};
use boundary_plugins::factory;

use crate::commands::cli::{parse_env_pairs, Args};

/// Fold CLI flags into the loaded config. Flags win over files and env vars.
pub fn apply_cli_overrides(cfg: &mut AppConfig, args: &Args) -> Result<(), CliError> {
    if let Some(level) = args.log_level.as_deref().map(str::trim) {
        if !level.is_empty() {
            cfg.logging.level = level.to_string();
        }
    }
    if let Some(n) = args.read_buffer {
        cfg.runner.read_buffer_bytes = n;
    }

    let env = parse_env_pairs(&args.env).map_err(CliError::Config)?;
    cfg.runner.env.extend(env);

    cfg.validate().map_err(CliError::Config)
}

pub fn start_args(args: &Args, cfg: &AppConfig) -> Result<RunnerStartArgs, CliError> {
    let (cmd, rest) = args
        .split_command()
        .ok_or_else(|| CliError::Config("missing command".to_string()))?;

    Ok(RunnerStartArgs {
        cmd: cmd.to_string(),
        args: rest.to_vec(),
        envs: cfg.runner.env.clone(),
    })
}

#[tracing::instrument(name = "cli.run_app", skip(args, cfg))]
pub async fn run_app_with_config(args: &Args, cfg: &AppConfig) -> Result<i32, CliError> {
    let start = start_args(args, cfg)?;

    let runner = factory::build_runner();
    tracing::debug!(runner = runner.name(), cmd = %start.cmd, argc = start.args.len(), "starting child");

    let session = runner
        .start_session(&start)
        .await
        .map_err(|e| RunnerError::Spawn(e.to_string()))?;

    let result = run_session(RunSessionArgs::with_process_stdio(session, &cfg.runner)).await?;

    tracing::debug!(
        exit_code = result.exit_code,
        forwarded = result.forwarded_bytes,
        discarded = result.discarded_bytes,
        boundary_offset = ?result.boundary_offset,
        duration_ms = result.duration_ms,
        "run complete"
    );
    Ok(result.exit_code)
}
