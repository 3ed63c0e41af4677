//! Plan state machine.
//!
//! ```text
//! Empty --begin_planning--> Planning --apply_plan--> Ready
//! Ready --begin_step--> Executing --commit_step--> Ready | Complete
//! any   --begin_planning--> Planning (prior plan discarded on apply)
//! ```
//!
//! Generator calls happen between `begin_*` and `apply_plan`/`commit_step`,
//! outside any lock held on the session. The in-flight marker plus the
//! planning round make results that arrive after a newer request harmless.

use super::model::Session;
use crate::element::Element;
use crate::error::{BrainstormError, Result};

/// Observable state of a session's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No plan has been produced yet.
    Empty,
    /// Waiting for the planner.
    Planning,
    /// A plan exists and steps remain.
    Ready,
    /// One step is in flight.
    Executing,
    /// Every step has been executed.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InFlight {
    Planning { round: u64 },
    Executing { index: usize, round: u64 },
}

/// Handed out by [`Session::begin_step`]; redeemed by `commit_step` or
/// `abort_step`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTicket {
    /// Zero-based index of the step being executed.
    pub index: usize,
    pub text: String,
    round: u64,
}

/// Result of asking for the next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStart {
    Run(StepTicket),
    /// The plan is finished; nothing to execute.
    Complete { total: usize },
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        match self.in_flight {
            Some(InFlight::Planning { .. }) => SessionPhase::Planning,
            Some(InFlight::Executing { .. }) => SessionPhase::Executing,
            None if self.plan_steps.is_empty() => SessionPhase::Empty,
            None if self.plan_complete => SessionPhase::Complete,
            None => SessionPhase::Ready,
        }
    }

    /// Starts a planning round from any state and returns its number.
    ///
    /// The current plan stays in place until [`apply_plan`](Self::apply_plan)
    /// replaces it; an in-flight step can no longer be committed.
    pub fn begin_planning(&mut self) -> u64 {
        self.planning_round += 1;
        self.in_flight = Some(InFlight::Planning {
            round: self.planning_round,
        });
        tracing::debug!("[Session] {} planning round {}", self.id, self.planning_round);
        self.planning_round
    }

    /// Installs the steps produced for `round`, replacing any prior plan and
    /// resetting the cursor.
    pub fn apply_plan(&mut self, round: u64, steps: Vec<String>) -> Result<()> {
        if round != self.planning_round {
            return Err(BrainstormError::PlanSuperseded { round });
        }

        self.plan_complete = steps.is_empty();
        self.plan_steps = steps;
        self.current_step = 0;
        self.in_flight = None;
        tracing::info!(
            "[Session] {} plan installed with {} steps",
            self.id,
            self.plan_steps.len()
        );
        Ok(())
    }

    /// Clears the planning marker after a failed planner call. Prior plan
    /// state is left as it was.
    pub fn abort_planning(&mut self, round: u64) {
        if self.in_flight == Some(InFlight::Planning { round }) {
            self.in_flight = None;
        }
    }

    /// Claims the current step for execution.
    ///
    /// Returns [`StepStart::Complete`] once the plan is finished. Fails with
    /// `NoPlan` before the first plan and `StepInFlight` while another plan
    /// operation is pending.
    pub fn begin_step(&mut self) -> Result<StepStart> {
        if self.in_flight.is_some() {
            return Err(BrainstormError::StepInFlight);
        }
        if self.plan_steps.is_empty() {
            return Err(BrainstormError::NoPlan);
        }
        if self.plan_complete {
            return Ok(StepStart::Complete {
                total: self.plan_steps.len(),
            });
        }

        let index = self.current_step;
        let round = self.planning_round;
        self.in_flight = Some(InFlight::Executing { index, round });
        Ok(StepStart::Run(StepTicket {
            index,
            text: self.plan_steps[index].clone(),
            round,
        }))
    }

    /// Appends the step's elements and advances the cursor.
    pub fn commit_step(&mut self, ticket: &StepTicket, elements: Vec<Element>) -> Result<()> {
        let expected = Some(InFlight::Executing {
            index: ticket.index,
            round: ticket.round,
        });
        if self.in_flight != expected || ticket.round != self.planning_round {
            return Err(BrainstormError::PlanSuperseded { round: ticket.round });
        }

        self.elements.extend(elements);
        self.current_step += 1;
        self.plan_complete = self.current_step >= self.plan_steps.len();
        self.in_flight = None;
        Ok(())
    }

    /// Releases the step claim without advancing, so the same step can be
    /// retried.
    pub fn abort_step(&mut self, ticket: &StepTicket) {
        let claimed = Some(InFlight::Executing {
            index: ticket.index,
            round: ticket.round,
        });
        if self.in_flight == claimed {
            self.in_flight = None;
        }
    }
}
