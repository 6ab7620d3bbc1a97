//! Speech transport module
//!
//! Executes the dialogue's commands and reports their completion back
//! as dialogue events. The console transport stands in for speech
//! synthesis and recognition with plain text.

mod console;

pub use console::{ConsoleTransport, TransportError};
