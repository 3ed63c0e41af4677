//! Application layer for Brainstorm.
//!
//! Coordinates the core's session state machine, synthesizer and the
//! generator collaborator into the operations a transport exposes.

pub mod diagram_usecase;
pub mod intent;
pub mod session;

pub use diagram_usecase::{ChatOutcome, DiagramUseCase, PlanOutcome, StepOutcome};
pub use session::SessionStore;
