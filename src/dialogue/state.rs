//! Dialogue state path
//!
//! The top level phases and the nested states of the Greeting and
//! Appointment sub-machines.

/// Sub-states of the Greeting phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingState {
    /// Speaking the greeting
    Prompt,
    /// Listening for the first utterance
    Ask,
    /// Telling the user nothing was heard
    NoInput,
}

/// Sub-states of the Appointment phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentState {
    Prompt,
    NoInput,
    PromptPerson,
    AskPerson,
    PersonIdentified,
    PromptDay,
    AskDay,
    DayIdentified,
    PromptWholeDay,
    AskWholeDay,
    WholeDayIdentified,
    PromptTime,
    AskTime,
    TimeIdentified,
    PromptCreateAppointmentWithTime,
    PromptCreateAppointmentWholeDay,
    Confirmation,
    /// Speaking the success message; leaves to the global Done
    Done,
}

/// The active state path of the dialogue machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// Waiting for the transport to become ready
    Prepare,
    /// Idle until the start trigger
    WaitToStart,
    Greeting(GreetingState),
    /// Speaking whether the last utterance is in the grammar
    CheckGrammar,
    Appointment(AppointmentState),
    /// End of one dialogue cycle; the start trigger restarts the greeting
    Done,
}

impl Default for DialogueState {
    fn default() -> Self {
        Self::Prepare
    }
}

impl std::fmt::Display for GreetingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::fmt::Display for AppointmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogueState::Prepare => write!(f, "Prepare"),
            DialogueState::WaitToStart => write!(f, "WaitToStart"),
            DialogueState::Greeting(sub) => write!(f, "Greeting.{}", sub),
            DialogueState::CheckGrammar => write!(f, "CheckGrammar"),
            DialogueState::Appointment(sub) => write!(f, "Appointment.{}", sub),
            DialogueState::Done => write!(f, "Done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(DialogueState::default(), DialogueState::Prepare);
    }

    #[test]
    fn test_state_path_display() {
        assert_eq!(
            DialogueState::Greeting(GreetingState::Ask).to_string(),
            "Greeting.Ask"
        );
        assert_eq!(
            DialogueState::Appointment(AppointmentState::PromptCreateAppointmentWholeDay).to_string(),
            "Appointment.PromptCreateAppointmentWholeDay"
        );
        assert_eq!(DialogueState::Done.to_string(), "Done");
    }
}
