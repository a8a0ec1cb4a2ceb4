use std::ffi::{OsStr, OsString};
use std::path::Path;

use tokio::process::Command;

use super::{ScriptError, ScriptResult};

/// The captured streams of a script that exited successfully.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScriptOutput {
    /// Everything the script wrote to standard output.
    pub stdout: String,
    /// Everything the script wrote to standard error, e.g. warnings.
    pub stderr: String,
}

/// The interpreter used when none is configured.
const DEFAULT_INTERPRETER: &str = "python3";

/// Runs saved scripts with an external interpreter.
///
/// The script is passed as the only argument. There is no timeout and no
/// sandbox: the script runs with the privileges and environment of this
/// process.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScriptRunner {
    interpreter: OsString,
}

impl ScriptRunner {
    /// Creates a runner that launches scripts with `interpreter`.
    #[inline]
    pub fn new<S: Into<OsString>>(interpreter: S) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Returns the interpreter program.
    #[inline]
    pub fn interpreter(&self) -> &OsStr {
        &self.interpreter
    }

    /// Runs the script at `path` and returns what it wrote.
    ///
    /// On failure the captured standard error is moved into the error.
    pub async fn run<P: AsRef<Path>>(&self, path: P) -> ScriptResult {
        let path = path.as_ref();
        debug!("running {} with {:?}", path.display(), self.interpreter);

        let output = Command::new(&self.interpreter)
            .arg(path)
            .output()
            .await
            .map_err(|source| ScriptError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            warn!("{} failed: {}", path.display(), output.status);
            return Err(ScriptError::ExitStatus {
                path: path.to_path_buf(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(ScriptOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Default for ScriptRunner {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}
