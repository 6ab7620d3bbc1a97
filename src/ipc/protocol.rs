//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::dialogue::AppointmentDetails;
use crate::events::{Slot, StateEvent};

/// Largest accepted frame body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from UI to daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current dialogue status
    GetStatus,

    /// Start trigger: leaves WaitToStart or restarts from Done
    Start,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to dialogue notifications
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current dialogue status
    Status(DialogueStatus),

    /// Start trigger forwarded to the dialogue
    Started,

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Dialogue { event: StateEvent },
}

/// Dialogue status snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueStatus {
    /// Daemon version
    pub version: String,

    /// Active state path, e.g. "Appointment.AskDay"
    pub state: String,

    /// Slots gathered in the current appointment attempt
    pub details: AppointmentDetails,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DialogueStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: "Prepare".to_string(),
            details: AppointmentDetails::default(),
            uptime_secs: 0,
        }
    }
}

impl DialogueStatus {
    /// Fold a dialogue notification into the snapshot
    pub fn apply(&mut self, event: &StateEvent) {
        match event {
            StateEvent::StateChanged { to, .. } => {
                if to == "Appointment.Prompt" {
                    self.details = AppointmentDetails::default();
                }
                self.state = to.clone();
            }
            StateEvent::SlotFilled { slot, value } => match slot {
                Slot::Person => self.details.person = Some(value.clone()),
                Slot::Day => self.details.day = Some(value.clone()),
                Slot::WholeDay => self.details.whole_day = value.parse().ok(),
                Slot::Time => self.details.time = Some(value.clone()),
            },
            StateEvent::AppointmentCreated { details } => self.details = details.clone(),
        }
    }
}
