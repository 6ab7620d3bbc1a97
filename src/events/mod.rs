//! Events module for the dialogue event/command contract
//!
//! Provides the events consumed by the dialogue machine, the commands it
//! issues to the speech transport, and the notifications it emits for
//! the presentation side.

use serde::{Deserialize, Serialize};

use crate::dialogue::AppointmentDetails;

/// One recognition hypothesis from the speech recogniser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub utterance: String,
    pub confidence: f64,
}

/// Ordered hypotheses for one recognition, best first
pub type RecognitionResult = Vec<Hypothesis>;

/// Events consumed by the dialogue machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DialogueEvent {
    /// Transport finished preparing
    #[serde(rename = "ASRTTS_READY")]
    AsrTtsReady,

    /// Synthesis of the last utterance finished
    #[serde(rename = "SPEAK_COMPLETE")]
    SpeakComplete,

    /// Recognition ended
    #[serde(rename = "LISTEN_COMPLETE")]
    ListenComplete,

    /// Speech was recognised
    #[serde(rename = "RECOGNISED")]
    Recognised {
        value: RecognitionResult,
    },

    /// Recognition timed out on silence
    #[serde(rename = "ASR_NOINPUT")]
    AsrNoInput,

    /// External start trigger from the presentation side
    #[serde(rename = "CLICK", alias = "START")]
    Start,
}

impl std::fmt::Display for DialogueEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogueEvent::AsrTtsReady => write!(f, "ASRTTS_READY"),
            DialogueEvent::SpeakComplete => write!(f, "SPEAK_COMPLETE"),
            DialogueEvent::ListenComplete => write!(f, "LISTEN_COMPLETE"),
            DialogueEvent::Recognised { value } => match value.first() {
                Some(h) => write!(f, "RECOGNISED ({:?}, {:.2})", h.utterance, h.confidence),
                None => write!(f, "RECOGNISED (empty)"),
            },
            DialogueEvent::AsrNoInput => write!(f, "ASR_NOINPUT"),
            DialogueEvent::Start => write!(f, "CLICK"),
        }
    }
}

/// Commands issued by the dialogue machine to the speech transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Initialise the transport; answered by ASRTTS_READY
    Prepare,

    /// Synthesise an utterance; answered by SPEAK_COMPLETE
    Speak { utterance: String },

    /// Start recognition; answered by RECOGNISED/LISTEN_COMPLETE or ASR_NOINPUT
    Listen,
}

impl Command {
    pub fn speak(utterance: impl Into<String>) -> Self {
        Command::Speak {
            utterance: utterance.into(),
        }
    }
}

/// Slots collected during appointment creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Person,
    Day,
    WholeDay,
    Time,
}

/// Notifications emitted by the dialogue machine for observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// The active state path changed
    StateChanged { from: String, to: String },

    /// A slot was filled from the current interpretation
    SlotFilled { slot: Slot, value: String },

    /// The user confirmed the appointment
    AppointmentCreated { details: AppointmentDetails },
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::StateChanged { from, to } => write!(f, "STATE_CHANGED ({} -> {})", from, to),
            StateEvent::SlotFilled { slot, value } => write!(f, "SLOT_FILLED ({:?} = {})", slot, value),
            StateEvent::AppointmentCreated { details } => write!(f, "APPOINTMENT_CREATED ({})", details),
        }
    }
}
