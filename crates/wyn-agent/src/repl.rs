//! The interactive console loop around an agent.
//!
//! [`Repl`] reads user lines, prints replies and drives the save and run
//! flow for code blocks.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use wyn_agent_core::{Agent, SendError};

/// Any line containing this token ends the session.
pub const EXIT_TOKEN: &str = "EXIT";

/// The only answer that allows a saved script to run.
const CONFIRM_TOKEN: &str = "Y";

const HUMAN_PROMPT: &str = "🧑 Human: ";
const BOT_LABEL: &str = "🤖 Bot: ";
const BOT_OUTPUT_LABEL: &str = "🤖 Bot Output: ";
const SAVE_PROMPT: &str = "💻 What name do you want to save for this script? ";
const RUN_PROMPT: &str =
    "💻 Do you want to execute this script? Enter 'Y' or 'N'. ";
const EXIT_HINT: &str = "NOTE: Enter 'EXIT' if you want to quit the program.";

/// Error that ends a [`Repl`] session.
#[derive(Debug)]
pub enum Error {
    /// The remote agent failed to reply.
    Agent(SendError),
    /// Reading from or writing to the console failed.
    Io(io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Agent(err) => write!(f, "agent error ({}): {err}", err.kind()),
            Error::Io(err) => write!(f, "console error: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Agent(err) => Some(err.as_ref()),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<SendError> for Error {
    #[inline]
    fn from(err: SendError) -> Self {
        Error::Agent(err)
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// The interactive chat loop.
///
/// Each turn reads one line, sends it to the agent and prints the reply. If
/// the reply contains a code block, the user may save it under a name of
/// their choice and run it.
///
/// Everything happens in sequence: the loop waits for the user, then for
/// the agent, then for the script.
pub struct Repl<R, W> {
    agent: Agent,
    input: R,
    output: W,
    script_dir: PathBuf,
    show_progress: bool,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Creates a loop reading from `input` and printing to `output`.
    ///
    /// Scripts are saved in the current directory and no spinner is shown
    /// by default.
    pub fn new(agent: Agent, input: R, output: W) -> Self {
        Self {
            agent,
            input,
            output,
            script_dir: PathBuf::from("."),
            show_progress: false,
        }
    }

    /// Sets the directory saved scripts are written to.
    ///
    /// The directory must already exist.
    #[inline]
    pub fn with_script_dir<P: Into<PathBuf>>(mut self, script_dir: P) -> Self {
        self.script_dir = script_dir.into();
        self
    }

    /// Shows a spinner on stderr while waiting for the agent.
    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Returns the agent driven by this loop.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Consumes the loop and returns its output sink.
    #[inline]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs the loop until the exit token or the end of input.
    ///
    /// Returns an error if the agent fails to reply; failures of saved
    /// scripts are printed and the loop goes on.
    pub async fn run(&mut self) -> Result<(), Error> {
        loop {
            self.prompt(&HUMAN_PROMPT.bright_green().to_string())?;
            let Some(line) = self.read_line().await? else {
                break;
            };
            if line.contains(EXIT_TOKEN) {
                debug!("exit token received");
                break;
            }

            let reply = self.send(line).await?;
            writeln!(
                self.output,
                "{}{}",
                BOT_LABEL.bright_cyan(),
                reply.bright_white()
            )?;

            if self.agent.code_fence().appears_in(&reply)
                && self.offer_script(&reply).await?.is_break()
            {
                break;
            }

            writeln!(self.output, "{}", EXIT_HINT.dimmed())?;
        }
        self.output.flush()?;
        Ok(())
    }

    async fn send(&mut self, line: String) -> Result<String, SendError> {
        let progress_bar = self.show_progress.then(|| {
            let style = ProgressStyle::with_template("{spinner} {wide_msg}")
                .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            let progress_bar = ProgressBar::new_spinner();
            progress_bar.set_style(style);
            progress_bar.set_message("🤔 Thinking...");
            progress_bar.enable_steady_tick(Duration::from_millis(100));
            progress_bar
        });

        let reply = self.agent.send(line).await;

        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = progress_bar {
            progress_bar.finish_and_clear();
        }
        reply
    }

    /// Asks whether to save the code block in `reply` and then whether to
    /// run it. Breaks when the input ends.
    async fn offer_script(
        &mut self,
        reply: &str,
    ) -> Result<ControlFlow<()>, Error> {
        self.prompt(SAVE_PROMPT)?;
        let Some(name) = self.read_line().await? else {
            return Ok(ControlFlow::Break(()));
        };
        let name = name.split_whitespace().collect::<Vec<_>>().join("_");
        let file_name = format!("{name}.{}", self.agent.code_fence().extension());
        let path = self.script_dir.join(file_name);

        let path = match self.agent.extract_code_block(reply, &path) {
            Ok(Some(path)) => path,
            Ok(None) => {
                writeln!(
                    self.output,
                    "No complete {} block found in the reply.",
                    self.agent.code_fence().opener()
                )?;
                return Ok(ControlFlow::Continue(()));
            }
            Err(err) => {
                warn!("cannot write {}: {err}", path.display());
                writeln!(
                    self.output,
                    "{} {}: {err}",
                    "Failed to save the script to".bright_red(),
                    path.display()
                )?;
                return Ok(ControlFlow::Continue(()));
            }
        };
        writeln!(self.output, "Saved to {}.", path.display())?;

        writeln!(
            self.output,
            "{}",
            "⚠️  The script runs unsandboxed, with your privileges.".bright_yellow()
        )?;
        self.prompt(RUN_PROMPT)?;
        let Some(answer) = self.read_line().await? else {
            return Ok(ControlFlow::Break(()));
        };
        if answer != CONFIRM_TOKEN {
            debug!("script execution declined");
            return Ok(ControlFlow::Continue(()));
        }

        match self.agent.run_script(&path).await {
            Ok(output) => {
                writeln!(self.output, "Script executed successfully.")?;
                writeln!(self.output, "{}", BOT_OUTPUT_LABEL.bright_cyan())?;
                writeln!(self.output, "{}", output.stdout)?;
                if !output.stderr.is_empty() {
                    write!(self.output, "{}", output.stderr.red())?;
                }
            }
            Err(err) => {
                writeln!(
                    self.output,
                    "{} {err}",
                    "Failed to execute the script.".bright_red()
                )?;
                if let Some(stderr) = err.stderr() {
                    write!(self.output, "{}", stderr.red())?;
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        write!(self.output, "{prompt}")?;
        self.output.flush()
    }

    /// Reads one line without its line ending. Returns `None` at the end of
    /// input.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match self.input.read_line(&mut line).await {
            Ok(0) => Ok(None),
            Ok(_) => {
                let len = line.trim_end_matches(['\r', '\n']).len();
                line.truncate(len);
                Ok(Some(line))
            }
            Err(err) => {
                error!("error reading input: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use wyn_agent_core::AgentBuilder;
    use wyn_agent_core::code::CodeFence;
    use wyn_agent_model::ErrorKind;
    use wyn_agent_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    async fn run_session(
        model_provider: TestModelProvider,
        input: &'static str,
        script_dir: &std::path::Path,
    ) -> (Result<(), Error>, String, usize) {
        let agent = AgentBuilder::with_model_provider(model_provider)
            .with_code_fence(CodeFence::new("sh", "sh"))
            .with_interpreter("sh")
            .build();
        let mut repl =
            Repl::new(agent, input.as_bytes(), Vec::new()).with_script_dir(script_dir);
        let result = repl.run().await;
        let history_len = repl.agent().history().len();
        let output = String::from_utf8(repl.into_output()).unwrap();
        (result, output, history_len)
    }

    #[tokio::test]
    async fn test_exit_without_sending() {
        let model_provider = TestModelProvider::default();
        let dir = tempfile::tempdir().unwrap();
        let (result, output, history_len) =
            run_session(model_provider.clone(), "EXIT\n", dir.path()).await;
        result.unwrap();
        assert_eq!(history_len, 0);
        assert!(model_provider.requests().is_empty());
        assert!(output.contains("Human: "));
        assert!(!output.contains("Bot: "));
    }

    #[tokio::test]
    async fn test_exit_token_anywhere_in_line() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_exchange(PresetResponse::with_text("Hello!"));
        let dir = tempfile::tempdir().unwrap();
        let (result, output, history_len) = run_session(
            model_provider.clone(),
            "hi\nplease EXIT now\nnever sent\n",
            dir.path(),
        )
        .await;
        result.unwrap();
        assert_eq!(history_len, 2);
        assert_eq!(model_provider.requests().len(), 1);
        assert!(output.contains("Hello!"));
        assert!(output.contains(EXIT_HINT));
    }

    #[tokio::test]
    async fn test_lowercase_exit_is_a_message() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_exchange(PresetResponse::with_text("Bye?"));
        let dir = tempfile::tempdir().unwrap();
        let (result, _, history_len) =
            run_session(model_provider, "exit\n", dir.path()).await;
        result.unwrap();
        assert_eq!(history_len, 2);
    }

    #[tokio::test]
    async fn test_save_and_run_script() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_exchange(PresetResponse::with_text(
            "Here you go:\n```sh\necho $((1+1))\n```\nEnjoy.",
        ));
        let dir = tempfile::tempdir().unwrap();
        let (result, output, _) = run_session(
            model_provider,
            "add numbers\nmy  adder script\nY\nEXIT\n",
            dir.path(),
        )
        .await;
        result.unwrap();

        let path = dir.path().join("my_adder_script.sh");
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo $((1+1))");
        assert!(output.contains("Script executed successfully."));
        assert!(output.contains("Bot Output: "));
        assert!(output.contains("2\n"));
    }

    #[tokio::test]
    async fn test_successful_script_stderr_is_shown() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_exchange(PresetResponse::with_text(
            "```sh\necho out\necho warn$((6*7)) >&2\n```",
        ));
        let dir = tempfile::tempdir().unwrap();
        let (result, output, _) =
            run_session(model_provider, "go\nnoisy\nY\nEXIT\n", dir.path())
                .await;
        result.unwrap();

        let (_, after_run) = output
            .split_once("Script executed successfully.")
            .unwrap();
        assert!(after_run.contains("out\n"));
        assert!(after_run.contains("warn42\n"));
        assert!(!output.contains("Failed to execute the script."));
    }

    #[tokio::test]
    async fn test_decline_execution() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_exchange(PresetResponse::with_text(
            "```sh\ntouch ran.txt\n```",
        ));
        let dir = tempfile::tempdir().unwrap();
        let (result, output, _) =
            run_session(model_provider, "go\ntoucher\ny\nEXIT\n", dir.path())
                .await;
        result.unwrap();

        assert!(dir.path().join("toucher.sh").exists());
        assert!(!output.contains("Script executed successfully."));
        assert!(!output.contains("Failed to execute the script."));
    }

    #[tokio::test]
    async fn test_failed_script_continues() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_exchange(PresetResponse::with_text(
            "```sh\necho broken >&2\nexit 2\n```",
        ));
        model_provider.add_exchange(PresetResponse::with_text("Still here."));
        let dir = tempfile::tempdir().unwrap();
        let (result, output, history_len) = run_session(
            model_provider,
            "run it\nbroken\nY\nare you there?\nEXIT\n",
            dir.path(),
        )
        .await;
        result.unwrap();

        assert!(output.contains("Failed to execute the script."));
        assert!(output.contains("broken\n"));
        assert!(output.contains("Still here."));
        assert_eq!(history_len, 4);
    }

    #[tokio::test]
    async fn test_incomplete_block_skips_execution() {
        let mut model_provider = TestModelProvider::default();
        model_provider
            .add_exchange(PresetResponse::with_text("```sh\necho cut off"));
        let dir = tempfile::tempdir().unwrap();
        let (result, output, _) =
            run_session(model_provider, "go\npartial\nEXIT\n", dir.path())
                .await;
        result.unwrap();

        assert!(output.contains("No complete ```sh block found"));
        assert!(!output.contains("Do you want to execute"));
        assert!(!dir.path().join("partial.sh").exists());
    }

    #[tokio::test]
    async fn test_agent_failure_ends_session() {
        let mut model_provider = TestModelProvider::default();
        model_provider
            .add_exchange(PresetResponse::with_failure(ErrorKind::RateLimitExceeded));
        let dir = tempfile::tempdir().unwrap();
        let (result, _, history_len) =
            run_session(model_provider, "hello\nEXIT\n", dir.path()).await;

        let Err(Error::Agent(err)) = result else {
            panic!("expected an agent error");
        };
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(history_len, 0);
    }

    #[tokio::test]
    async fn test_unreadable_input_is_an_error() {
        let agent =
            AgentBuilder::with_model_provider(TestModelProvider::default())
                .build();
        let input: &[u8] = b"\xff\xfe\n";
        let mut repl = Repl::new(agent, input, Vec::new());

        let result = repl.run().await;
        let Err(Error::Io(err)) = result else {
            panic!("expected a console error");
        };
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(repl.agent().history().is_empty());
    }

    #[tokio::test]
    async fn test_end_of_input() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_exchange(PresetResponse::with_text("```sh\necho hi\n```"));
        let dir = tempfile::tempdir().unwrap();
        let (result, output, history_len) =
            run_session(model_provider, "go\n", dir.path()).await;
        result.unwrap();
        assert_eq!(history_len, 2);
        assert!(output.contains("What name do you want"));
    }
}
