//! Code blocks in agent replies: locating them, saving them to disk and
//! running the saved scripts.

mod error;
mod fence;
mod runner;

pub use error::ScriptError;
pub use fence::CodeFence;
pub use runner::{ScriptOutput, ScriptRunner};

/// The result of running a script: its captured output on success.
pub type ScriptResult = Result<ScriptOutput, ScriptError>;
