//! Utterances spoken by the dialogue

use crate::grammar;

use super::context::{AppointmentDetails, DialogueContext};

pub const GREETING: &str = "Hello world!";
pub const CANT_HEAR: &str = "I can't hear you!";
pub const APPOINTMENT_INTRO: &str = "Let's create an appointment.";
pub const APPOINTMENT_CREATED: &str = "Your appointment has been created!";

/// A slot question, or its "didn't catch" variant after a failed attempt
pub fn question(ctx: &DialogueContext, plain: &str, missed: &str) -> String {
    if ctx.last_result.is_some() {
        format!("I didn't catch {}. {}", missed, plain)
    } else {
        plain.to_string()
    }
}

pub fn ask_person(ctx: &DialogueContext) -> String {
    question(ctx, "Who are you meeting with?", "the name")
}

pub fn ask_day(ctx: &DialogueContext) -> String {
    question(ctx, "On which day is your meeting?", "the day")
}

pub fn ask_whole_day(ctx: &DialogueContext) -> String {
    question(ctx, "Will it take the whole day?", "your answer")
}

pub fn ask_time(ctx: &DialogueContext) -> String {
    question(ctx, "What time is your meeting?", "the time")
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

pub fn person_summary(details: &AppointmentDetails) -> String {
    format!("You are meeting with {}", field(&details.person))
}

pub fn day_summary(details: &AppointmentDetails) -> String {
    format!(
        "You are meeting with {} on {}",
        field(&details.person),
        field(&details.day)
    )
}

pub fn whole_day_summary(details: &AppointmentDetails) -> String {
    let duration = if details.whole_day == Some(true) {
        "it will take the whole day"
    } else {
        "it will not take the whole day"
    };
    format!(
        "You are meeting with {} on {} and {}",
        field(&details.person),
        field(&details.day),
        duration
    )
}

pub fn time_summary(details: &AppointmentDetails) -> String {
    format!(
        "You are meeting with {} on {} at {}",
        field(&details.person),
        field(&details.day),
        field(&details.time)
    )
}

pub fn confirm_with_time(details: &AppointmentDetails) -> String {
    format!(
        "Do you want me to create an appointment with {} on {} at {}?",
        field(&details.person),
        field(&details.day),
        field(&details.time)
    )
}

pub fn confirm_whole_day(details: &AppointmentDetails) -> String {
    format!(
        "Do you want me to create an appointment with {} on {} for the whole day?",
        field(&details.person),
        field(&details.day)
    )
}

/// Diagnostic sentence about the last utterance and the grammar
pub fn grammar_check(ctx: &DialogueContext) -> String {
    let utterance = ctx.last_utterance().unwrap_or_default();
    let verdict = if grammar::is_known(utterance) { "is" } else { "is not" };
    format!(
        "You just said: {}. And it {} in the grammar.",
        utterance, verdict
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Hypothesis;

    fn heard(text: &str) -> DialogueContext {
        let mut ctx = DialogueContext::default();
        ctx.recognise(vec![Hypothesis {
            utterance: text.to_string(),
            confidence: 0.5,
        }]);
        ctx
    }

    #[test]
    fn test_plain_question_without_result() {
        let ctx = DialogueContext::default();
        assert_eq!(ask_person(&ctx), "Who are you meeting with?");
    }

    #[test]
    fn test_missed_variant_after_result() {
        assert_eq!(
            ask_day(&heard("someday")),
            "I didn't catch the day. On which day is your meeting?"
        );
        assert_eq!(
            ask_whole_day(&heard("hmm")),
            "I didn't catch your answer. Will it take the whole day?"
        );
    }

    #[test]
    fn test_grammar_check_sentence() {
        assert_eq!(
            grammar_check(&heard("Friday")),
            "You just said: Friday. And it is in the grammar."
        );
        assert_eq!(
            grammar_check(&heard("Vladislav")),
            "You just said: Vladislav. And it is not in the grammar."
        );
    }

    #[test]
    fn test_whole_day_summary() {
        let mut details = AppointmentDetails {
            person: Some("Tom Södahl Bladsjö".to_string()),
            day: Some("Sunday".to_string()),
            whole_day: Some(true),
            ..AppointmentDetails::default()
        };
        assert_eq!(
            whole_day_summary(&details),
            "You are meeting with Tom Södahl Bladsjö on Sunday and it will take the whole day"
        );
        details.whole_day = Some(false);
        assert!(whole_day_summary(&details).ends_with("it will not take the whole day"));
    }
}
