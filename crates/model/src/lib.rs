//! An abstraction layer for the remote conversational agent.
//!
//! This crate establishes the protocol between the chat session and a
//! completion backend, so that the session can talk to the hosted agent
//! in production and to a scripted fake in tests without modifying the
//! core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
