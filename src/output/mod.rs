//! Persisted artifacts and user-facing rendering

pub mod artifacts;
pub mod formatter;

pub use artifacts::ArtifactPaths;
pub use formatter::{formatter_for, ConsoleFormatter, JsonFormatter, OutputFormatter};
