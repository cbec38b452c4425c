//! Jargonaut client library.
//!
//! A single-channel IRC client core: the network backend, session state and
//! transcript rendering. The binary is a thin terminal front end over it.

pub mod backend;
pub mod buffer;
pub mod colors;
pub mod commands;
pub mod config;
pub mod events;
pub mod format;
pub mod input_state;
pub mod logging;
pub mod nickname;
pub mod protocol;
pub mod render;
pub mod roster;
pub mod state;
pub mod validation;
pub mod wire;

#[cfg(test)]
mod backend_tests;
