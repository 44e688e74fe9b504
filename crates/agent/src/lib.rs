//! The planloop agent loop.
//!
//! Each run follows a **perceive → decide → act** cycle:
//!
//! 1. **Snapshot** the registry's tools once at run start
//! 2. **Perceive** intent and entities in the current query
//! 3. **Decide** the next action as one line of protocol text
//! 4. **Act**: a `FUNCTION_CALL` is dispatched, and its result becomes the
//!    next query unless it opens with `FINAL_ANSWER:` or `ERROR:`
//!
//! The run stops on a final answer, on any error, or when the step budget
//! (`max_steps`, default 3) is used up.

pub mod decision;
pub mod dispatcher;
pub mod loop_runner;
pub mod perception;
pub mod step;

pub use decision::LlmDecision;
pub use dispatcher::Dispatcher;
pub use loop_runner::{AgentLoop, RunOutcome, RunReport, StepRecord};
pub use perception::LlmPerception;
pub use step::{FailureKind, PlanningStep, StepOutcome, StepReport};

#[cfg(test)]
pub(crate) mod test_helpers;
