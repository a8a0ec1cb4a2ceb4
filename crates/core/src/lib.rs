//! Core logic including the conversation agent, code block extraction and
//! script execution.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod code;
pub mod conversation;
mod model_client;

pub use agent::{Agent, AgentBuilder, SendError};
