use boundary_core::runner::RunnerPlugin;

use crate::runner::ChildProcessRunner;

pub fn build_runner() -> Box<dyn RunnerPlugin> {
    Box::new(ChildProcessRunner::new())
}
