//! Grammar module for utterance interpretation
//!
//! Provides the fixed vocabulary the dialogue understands and the
//! interpreter that turns recognised text into partial slot values.

mod interpreter;
mod table;

pub use interpreter::{interpret, is_known};
pub use table::SlotRecord;
