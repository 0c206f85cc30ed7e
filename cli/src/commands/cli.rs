use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;

/// Run a stdio tool server and forward its stdout only from the first `{` onward.
#[derive(Parser, Debug)]
#[command(name = "stdio-boundary", version, about)]
pub struct Args {
    /// Config file (TOML). Overrides $STDIO_BOUNDARY_CONFIG and the default locations.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Extra environment variables to pass to the child process (KEY=VALUE).
    /// Can be specified multiple times.
    #[arg(long = "env", action = clap::ArgAction::Append)]
    pub env: Vec<String>,

    /// Tracing filter for the filter's own diagnostics, e.g. "debug".
    #[arg(long)]
    pub log_level: Option<String>,

    /// Read buffer size in bytes for both stream directions.
    #[arg(long)]
    pub read_buffer: Option<usize>,

    /// The tool server command, followed by its arguments.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Args {
    /// The child executable and its argument vector.
    pub fn split_command(&self) -> Option<(&str, &[String])> {
        self.command
            .split_first()
            .map(|(cmd, rest)| (cmd.as_str(), rest))
    }
}

/// Parse repeated `KEY=VALUE` flags. The value may itself contain `=`.
pub fn parse_env_pairs(pairs: &[String]) -> Result<HashMap<String, String>, String> {
    let mut out = HashMap::with_capacity(pairs.len());
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!("invalid --env {pair:?}: expected KEY=VALUE"));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("invalid --env {pair:?}: empty key"));
        }
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(argv)
    }

    #[test]
    fn command_and_args_are_captured_verbatim() {
        let args = parse(&["stdio-boundary", "npx", "-y", "@acme/server", "--port", "0"]).unwrap();
        let (cmd, rest) = args.split_command().unwrap();
        assert_eq!(cmd, "npx");
        assert_eq!(rest, ["-y", "@acme/server", "--port", "0"]);
    }

    #[test]
    fn own_flags_precede_command() {
        let args = parse(&[
            "stdio-boundary",
            "--env",
            "A=1",
            "--env",
            "B=x=y",
            "--read-buffer",
            "4096",
            "--log-level",
            "debug",
            "server",
        ])
        .unwrap();
        assert_eq!(args.env, ["A=1", "B=x=y"]);
        assert_eq!(args.read_buffer, Some(4096));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.command, ["server"]);
    }

    #[test]
    fn double_dash_separates_child_flags() {
        let args = parse(&["stdio-boundary", "--", "server", "--config", "x.toml"]).unwrap();
        assert!(args.config.is_none());
        assert_eq!(args.command, ["server", "--config", "x.toml"]);
    }

    #[test]
    fn command_is_required() {
        assert!(parse(&["stdio-boundary"]).is_err());
    }

    #[test]
    fn env_pairs_split_on_first_equals() {
        let env = parse_env_pairs(&["A=1".into(), "URL=http://h/?q=1".into(), "EMPTY=".into()])
            .unwrap();
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
        assert_eq!(env.get("URL").map(String::as_str), Some("http://h/?q=1"));
        assert_eq!(env.get("EMPTY").map(String::as_str), Some(""));
    }

    #[test]
    fn malformed_env_pairs_are_rejected() {
        assert!(parse_env_pairs(&["NOEQUALS".into()]).is_err());
        assert!(parse_env_pairs(&["=value".into()]).is_err());
    }
}
