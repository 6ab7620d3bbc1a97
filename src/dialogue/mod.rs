//! Dialogue module for the appointment conversation
//!
//! Provides a hierarchical state machine with these phases:
//! - Prepare: waiting for the speech transport
//! - WaitToStart: idle until the start trigger
//! - Greeting: greet and listen for the first utterance
//! - CheckGrammar: report whether the utterance is known
//! - Appointment: collect person, day, whole-day flag and time, then confirm
//! - Done: end of the cycle, restartable

mod context;
mod guards;
mod machine;
mod prompts;
mod state;

pub use context::AppointmentDetails;
pub use machine::DialogueMachine;
pub use state::DialogueState;
