use std::ffi::OsString;

use wyn_agent_model::ModelProvider;

use super::Agent;
use crate::code::{CodeFence, ScriptRunner};
use crate::model_client::ModelClient;

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) code_fence: CodeFence,
    pub(crate) script_runner: ScriptRunner,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// The agent looks for Python blocks and runs them with the default
    /// interpreter unless configured otherwise.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            code_fence: CodeFence::default(),
            script_runner: ScriptRunner::default(),
        }
    }

    /// Sets the fence used to find code blocks.
    #[inline]
    pub fn with_code_fence(mut self, code_fence: CodeFence) -> Self {
        self.code_fence = code_fence;
        self
    }

    /// Sets the interpreter used to run saved scripts.
    #[inline]
    pub fn with_interpreter<S: Into<OsString>>(mut self, interpreter: S) -> Self {
        self.script_runner = ScriptRunner::new(interpreter);
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
