pub mod child;

pub use child::ChildProcessRunner;
