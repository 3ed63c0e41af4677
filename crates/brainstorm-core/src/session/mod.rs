//! Session domain module.
//!
//! # Module Structure
//!
//! - `message`: Chat history types (`MessageRole`, `ChatMessage`)
//! - `model`: The per-connection `Session` record
//! - `state`: Plan state machine (`SessionPhase`, `StepTicket`, `StepStart`)
//!
//! # Usage
//!
//! ```ignore
//! use brainstorm_core::session::{Session, SessionPhase, StepStart};
//!
//! let mut session = Session::new("conn-1");
//! let round = session.begin_planning();
//! session.apply_plan(round, vec!["Add a user".into()])?;
//! if let StepStart::Run(ticket) = session.begin_step()? {
//!     session.commit_step(&ticket, elements)?;
//! }
//! ```

mod message;
mod model;
mod state;

pub use message::{ChatMessage, MessageRole};
pub use model::Session;
pub use state::{SessionPhase, StepStart, StepTicket};
