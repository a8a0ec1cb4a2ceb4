//! A console chat with a remote agent that can save and run the code it
//! writes.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use the [`Repl`] as a library with your own agent and console streams.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod repl;

pub use repl::Repl;

/// Re-exports of [`wyn_agent_core`] crate.
pub mod core {
    pub use wyn_agent_core::*;
}
