//! Utterance interpretation against the grammar table
//!
//! Normalisation is a case-fold only. No trimming, no partial matching.

use crate::events::Hypothesis;

use super::table::{GrammarTable, SlotRecord};

/// Interpret raw utterance text. Unknown text yields an empty record.
pub fn lookup(raw: &str) -> SlotRecord {
    GrammarTable::global()
        .get(&raw.to_lowercase())
        .cloned()
        .unwrap_or_default()
}

/// Whether the utterance is a grammar key after normalisation
pub fn is_known(raw: &str) -> bool {
    GrammarTable::global().get(&raw.to_lowercase()).is_some()
}

/// Interpret a recognition result; only the first hypothesis counts
pub fn interpret(hypotheses: &[Hypothesis]) -> SlotRecord {
    hypotheses
        .first()
        .map(|h| lookup(&h.utterance))
        .unwrap_or_default()
}
