mod builder;
#[cfg(test)]
mod tests;

use std::io;
use std::path::{Path, PathBuf};

use wyn_agent_model::{ModelFinishReason, ModelProviderError};

use crate::code::{CodeFence, ScriptResult, ScriptRunner};
use crate::conversation::{Conversation, Message};
use crate::model_client::ModelClient;
pub use builder::AgentBuilder;

/// The error returned when the remote agent could not produce a reply.
pub type SendError = Box<dyn ModelProviderError>;

/// A conversation with one remote agent.
///
/// The agent owns the message history of the session. Every call to
/// [`Agent::send`] sends the entire history, so the history only ever grows
/// and always alternates between user and assistant messages, starting with
/// a user message.
pub struct Agent {
    model_client: ModelClient,
    conversation: Conversation,
    code_fence: CodeFence,
    script_runner: ScriptRunner,
}

impl Agent {
    /// Sends a user message and returns the agent's reply.
    ///
    /// Both the message and the reply are appended to the history. If the
    /// request fails the history is left unchanged and the error is
    /// returned as is; no retry is attempted.
    pub async fn send<S: Into<String>>(
        &mut self,
        text: S,
    ) -> Result<String, SendError> {
        self.conversation.push(Message::user(text.into()));

        let request = self.conversation.to_model_request();
        debug!("sending {} messages", request.messages.len());
        let resp = match self.model_client.send_request(request).await {
            Ok(resp) => resp,
            Err(err) => {
                self.conversation.discard_pending_input();
                return Err(err);
            }
        };

        match resp.finish_reason {
            Some(ModelFinishReason::Stop) => {}
            Some(ModelFinishReason::Length) => {
                warn!("the reply was cut off by the token limit");
            }
            Some(ModelFinishReason::Error) => {
                warn!("the agent reported an error while replying");
            }
            None => debug!("the reply has no finish reason"),
        }

        let reply = resp.transcript;
        self.conversation.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    /// Returns the messages exchanged so far, oldest first.
    #[inline]
    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Returns the fence used to find code blocks in replies.
    #[inline]
    pub fn code_fence(&self) -> &CodeFence {
        &self.code_fence
    }

    /// Saves the first code block of `text` to `path`.
    ///
    /// Returns the path when a block was found and written, `None` when
    /// there is no block. See [`CodeFence::save`].
    #[inline]
    pub fn extract_code_block<P: AsRef<Path>>(
        &self,
        text: &str,
        path: P,
    ) -> io::Result<Option<PathBuf>> {
        self.code_fence.save(text, path)
    }

    /// Runs a saved script and returns its captured output.
    ///
    /// See [`ScriptRunner::run`].
    #[inline]
    pub async fn run_script<P: AsRef<Path>>(&self, path: P) -> ScriptResult {
        self.script_runner.run(path).await
    }
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            code_fence,
            script_runner,
        } = builder;

        Self {
            model_client,
            conversation: Default::default(),
            code_fence,
            script_runner,
        }
    }
}
