use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};

/// Describes why a script did not run to a successful exit.
#[derive(Debug)]
pub enum ScriptError {
    /// The interpreter could not be launched.
    Spawn {
        /// The script that was about to run.
        path: PathBuf,
        /// The underlying launch error.
        source: io::Error,
    },
    /// The script ran but exited unsuccessfully.
    ExitStatus {
        /// The script that ran.
        path: PathBuf,
        /// The exit code, or `None` if the process was killed by a signal.
        code: Option<i32>,
        /// Everything the script wrote to standard error.
        stderr: String,
    },
}

impl ScriptError {
    /// Returns the path of the script.
    #[inline]
    pub fn path(&self) -> &Path {
        match self {
            ScriptError::Spawn { path, .. }
            | ScriptError::ExitStatus { path, .. } => path,
        }
    }

    /// Returns the captured standard error, if the script ran and wrote any.
    #[inline]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ScriptError::ExitStatus { stderr, .. } if !stderr.is_empty() => {
                Some(stderr)
            }
            _ => None,
        }
    }
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Spawn { path, source } => {
                write!(f, "cannot launch {}: {source}", path.display())
            }
            ScriptError::ExitStatus {
                path,
                code: Some(code),
                ..
            } => {
                write!(f, "{} exited with status {code}", path.display())
            }
            ScriptError::ExitStatus {
                path, code: None, ..
            } => {
                write!(f, "{} was terminated by a signal", path.display())
            }
        }
    }
}

impl StdError for ScriptError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ScriptError::Spawn { source, .. } => Some(source),
            ScriptError::ExitStatus { .. } => None,
        }
    }
}
