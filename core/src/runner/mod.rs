mod abort;
pub mod boundary;
pub mod exit;
pub mod io_pump;
mod runtime;
pub mod types;

mod run;
mod traits;

pub use boundary::{find_boundary, BoundaryScanner, ScanState, BOUNDARY_MARKER};
pub use exit::exit_code_from_outcome;
pub use run::run_session;
pub use run::RunSessionArgs;
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{PumpStats, RunOutcome, RunnerResult, RunnerStartArgs, Signal};
