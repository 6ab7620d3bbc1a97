//! Static grammar table
//!
//! Maps normalised utterance text to the partial slot values it carries.
//! The table is built once per process and never mutated.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Partial slot values carried by a single utterance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    /// Hour of day in "HH:00" form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Affirmative (true) or negative (false) answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl SlotRecord {
    fn person(name: &str) -> Self {
        Self {
            person: Some(name.to_string()),
            ..Self::default()
        }
    }

    fn day(day: &str) -> Self {
        Self {
            day: Some(day.to_string()),
            ..Self::default()
        }
    }

    fn time(hour: u8) -> Self {
        Self {
            time: Some(format!("{:02}:00", hour)),
            ..Self::default()
        }
    }

    fn value(value: bool) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    fn kind(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Self::default()
        }
    }

    /// True when no field is populated
    pub fn is_empty(&self) -> bool {
        self.person.is_none()
            && self.day.is_none()
            && self.time.is_none()
            && self.value.is_none()
            && self.kind.is_none()
    }
}

const PEOPLE: &[(&str, &str)] = &[
    ("vlad", "Vladislav Maraev"),
    ("bora", "Bora Kara"),
    ("tal", "Talha Bedir"),
    ("tom", "Tom Södahl Bladsjö"),
    ("eugene", "Eugene Wong"),
];

const DAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const AFFIRMATIVE: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "sure",
    "of course",
    "absolutely",
    "that's right",
    "correct",
    "sounds good",
    "do it",
    "ja",
    "positive",
];

const NEGATIVE: &[&str] = &[
    "no",
    "nope",
    "nah",
    "no way",
    "cancel",
    "incorrect",
    "wrong",
    "don't do that",
    "nej",
    "negative",
];

/// The vocabulary understood by the dialogue
#[derive(Debug)]
pub struct GrammarTable {
    entries: HashMap<String, SlotRecord>,
}

impl GrammarTable {
    fn build() -> Self {
        let mut entries = HashMap::new();

        for (key, name) in PEOPLE {
            entries.insert(key.to_string(), SlotRecord::person(name));
        }
        for day in DAYS {
            entries.insert(day.to_lowercase(), SlotRecord::day(day));
        }
        for hour in 1..=23u8 {
            entries.insert(hour.to_string(), SlotRecord::time(hour));
        }
        for phrase in AFFIRMATIVE {
            entries.insert(phrase.to_string(), SlotRecord::value(true));
        }
        for phrase in NEGATIVE {
            entries.insert(phrase.to_string(), SlotRecord::value(false));
        }
        entries.insert("appointment".to_string(), SlotRecord::kind("appointment"));

        Self { entries }
    }

    /// The process-wide table
    pub fn global() -> &'static GrammarTable {
        static TABLE: OnceLock<GrammarTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    /// Exact match on an already-normalised key
    pub fn get(&self, key: &str) -> Option<&SlotRecord> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size() {
        // 5 people, 7 days, 23 hours, 13 yes, 10 no, 1 type marker
        assert_eq!(GrammarTable::global().len(), 59);
    }

    #[test]
    fn test_hours_are_zero_padded() {
        let table = GrammarTable::global();
        assert_eq!(table.get("1").unwrap().time.as_deref(), Some("01:00"));
        assert_eq!(table.get("23").unwrap().time.as_deref(), Some("23:00"));
        assert!(table.get("0").is_none());
        assert!(table.get("24").is_none());
    }

    #[test]
    fn test_day_keys_are_lowercase() {
        let table = GrammarTable::global();
        assert_eq!(table.get("friday").unwrap().day.as_deref(), Some("Friday"));
        assert!(table.get("Friday").is_none());
    }

    #[test]
    fn test_record_serialization() {
        let record = SlotRecord::kind("appointment");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"type":"appointment"}"#);
    }

    #[test]
    fn test_empty_record() {
        assert!(SlotRecord::default().is_empty());
        assert!(!SlotRecord::value(false).is_empty());
    }
}
