//! Mutable data owned by the dialogue machine

use serde::{Deserialize, Serialize};

use crate::events::RecognitionResult;
use crate::grammar::{self, SlotRecord};

/// Slots gathered so far in the current appointment attempt
///
/// Each field is set once by its identification step and stays set
/// until the Appointment phase restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub person: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub whole_day: Option<bool>,
}

impl std::fmt::Display for AppointmentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let person = self.person.as_deref().unwrap_or("?");
        let day = self.day.as_deref().unwrap_or("?");
        match (self.whole_day, self.time.as_deref()) {
            (Some(true), _) => write!(f, "{} on {}, whole day", person, day),
            (_, Some(time)) => write!(f, "{} on {} at {}", person, day, time),
            _ => write!(f, "{} on {}", person, day),
        }
    }
}

/// Context threaded through every transition
#[derive(Debug, Clone, Default)]
pub struct DialogueContext {
    /// Raw result of the most recent recognition, if any since the last clear
    pub last_result: Option<RecognitionResult>,
    /// Interpretation of `last_result`
    pub slots: SlotRecord,
    pub details: AppointmentDetails,
}

impl DialogueContext {
    /// Store a recognition and its interpretation, replacing the previous one
    pub fn recognise(&mut self, result: RecognitionResult) {
        self.slots = grammar::interpret(&result);
        self.last_result = Some(result);
    }

    /// Forget the last recognition and its interpretation
    pub fn clear_data(&mut self) {
        self.last_result = None;
        self.slots = SlotRecord::default();
    }

    pub fn reset_details(&mut self) {
        self.details = AppointmentDetails::default();
    }

    /// Text of the best hypothesis of the last recognition
    pub fn last_utterance(&self) -> Option<&str> {
        self.last_result
            .as_ref()
            .and_then(|result| result.first())
            .map(|h| h.utterance.as_str())
    }
}
