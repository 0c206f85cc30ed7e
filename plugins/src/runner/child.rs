use anyhow::Result;
use async_trait::async_trait;
use boundary_core::runner::{RunOutcome, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

/// Spawns the wrapped tool server as a plain child process.
///
/// stdin and stdout are piped so the filter can own them; stderr is inherited
/// so startup noise reaches the operator unfiltered. The working directory is
/// inherited as well.
pub struct ChildProcessRunner {}

impl ChildProcessRunner {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ChildProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerPlugin for ChildProcessRunner {
    fn name(&self) -> &str {
        "child"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        let child = Command::new(&args.cmd)
            .args(&args.args)
            .envs(&args.envs)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("{}: {e}", args.cmd))?;

        tracing::debug!(cmd = %args.cmd, pid = ?child.id(), "child spawned");
        Ok(Box::new(ChildSession { child }))
    }
}

struct ChildSession {
    child: Child,
}

#[async_trait]
impl RunnerSession for ChildSession {
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
        self.child
            .stdin
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncWrite + Unpin + Send>)
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> Result<()> {
        match signal {
            Signal::Kill => self.child.kill().await?,
            Signal::Term => self.terminate()?,
        }
        Ok(())
    }

    async fn wait(&mut self) -> Result<RunOutcome> {
        let status = self.child.wait().await?;
        Ok(RunOutcome {
            exit_code: status.code(),
            signal: exit_signal(&status),
        })
    }
}

impl ChildSession {
    #[cfg(unix)]
    fn terminate(&mut self) -> Result<()> {
        use nix::sys::signal::{kill, Signal as NixSignal};
        use nix::unistd::Pid;

        // Already reaped: nothing left to signal.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        kill(Pid::from_raw(pid as i32), NixSignal::SIGTERM)
            .map_err(|e| anyhow::anyhow!("SIGTERM to {pid} failed: {e}"))
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<()> {
        // No graceful termination on this platform.
        self.child.start_kill()?;
        Ok(())
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
