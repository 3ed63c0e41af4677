//! Core domain for the Brainstorm diagram assistant.
//!
//! Turns loosely structured generator output into a consistent,
//! non-duplicated diagram and drives multi-step plan execution per session.
//! The generator itself is an external collaborator behind the
//! [`generator::Generator`] trait.

pub mod board;
pub mod config;
pub mod element;
pub mod error;
pub mod generator;
pub mod plan;
pub mod repair;
pub mod session;
pub mod synth;

// Re-export common types
pub use error::{BrainstormError, Result};
pub use generator::{Generator, GeneratorRequest, GeneratorRole, RawOutput};
