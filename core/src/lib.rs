//! boundary-core: stdout protocol-boundary filtering for wrapped stdio tool servers.

pub mod config;
pub mod error;
pub mod runner;
