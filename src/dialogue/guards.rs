//! Named guards and ordered guard cascades
//!
//! A cascade is evaluated top to bottom and the first branch whose guard
//! holds picks the target. Unguarded branches always hold.

use super::context::DialogueContext;
use super::state::{AppointmentState as A, DialogueState, GreetingState};

/// Closed set of conditions used by transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Last utterance mentions "appointment" or was interpreted as that type
    IsAppointment,
    /// A recognition happened since the last clear
    HasRecognition,
    HasIdentifiedPerson,
    HasIdentifiedDay,
    HasIdentifiedWholeDay,
    HasIdentifiedTime,
    /// Reads the gathered details, not the current interpretation
    IsWholeDay,
    HasConfirmed,
    HasDenied,
    MissingPerson,
    MissingDay,
    MissingWholeDay,
    /// Only missing when whole-day was explicitly answered with no
    MissingTime,
}

impl Guard {
    pub fn check(self, ctx: &DialogueContext) -> bool {
        let slots = &ctx.slots;
        let details = &ctx.details;
        match self {
            Guard::IsAppointment => {
                let text = ctx.last_utterance().unwrap_or_default().to_lowercase();
                text.contains("appointment") || slots.kind.as_deref() == Some("appointment")
            }
            Guard::HasRecognition => ctx.last_result.is_some(),
            Guard::HasIdentifiedPerson => slots.person.is_some(),
            Guard::HasIdentifiedDay => slots.day.is_some(),
            Guard::HasIdentifiedWholeDay => slots.value.is_some(),
            Guard::HasIdentifiedTime => slots.time.is_some(),
            Guard::IsWholeDay => details.whole_day == Some(true),
            Guard::HasConfirmed => slots.value == Some(true),
            Guard::HasDenied => slots.value == Some(false),
            Guard::MissingPerson => details.person.is_none(),
            Guard::MissingDay => details.day.is_none(),
            Guard::MissingWholeDay => details.whole_day.is_none(),
            Guard::MissingTime => details.whole_day == Some(false) && details.time.is_none(),
        }
    }
}

/// One entry of a cascade
#[derive(Debug, Clone, Copy)]
pub struct Branch {
    pub guard: Option<Guard>,
    pub target: DialogueState,
}

impl Branch {
    pub const fn when(guard: Guard, target: DialogueState) -> Self {
        Self {
            guard: Some(guard),
            target,
        }
    }

    pub const fn otherwise(target: DialogueState) -> Self {
        Self {
            guard: None,
            target,
        }
    }
}

/// First matching target of a cascade
pub fn select(cascade: &[Branch], ctx: &DialogueContext) -> Option<DialogueState> {
    cascade
        .iter()
        .find(|branch| branch.guard.map_or(true, |guard| guard.check(ctx)))
        .map(|branch| branch.target)
}

const fn appt(state: A) -> DialogueState {
    DialogueState::Appointment(state)
}

pub const GREETING_HEARD: &[Branch] = &[
    Branch::when(Guard::IsAppointment, appt(A::Prompt)),
    Branch::when(Guard::HasRecognition, DialogueState::CheckGrammar),
    Branch::otherwise(DialogueState::Greeting(GreetingState::NoInput)),
];

pub const PERSON_HEARD: &[Branch] = &[
    Branch::when(Guard::HasIdentifiedPerson, appt(A::PersonIdentified)),
    Branch::otherwise(appt(A::PromptPerson)),
];

pub const DAY_HEARD: &[Branch] = &[
    Branch::when(Guard::HasIdentifiedDay, appt(A::DayIdentified)),
    Branch::otherwise(appt(A::PromptDay)),
];

pub const WHOLE_DAY_HEARD: &[Branch] = &[
    Branch::when(Guard::HasIdentifiedWholeDay, appt(A::WholeDayIdentified)),
    Branch::otherwise(appt(A::PromptWholeDay)),
];

pub const TIME_HEARD: &[Branch] = &[
    Branch::when(Guard::HasIdentifiedTime, appt(A::TimeIdentified)),
    Branch::otherwise(appt(A::PromptTime)),
];

pub const AFTER_WHOLE_DAY: &[Branch] = &[
    Branch::when(Guard::IsWholeDay, appt(A::PromptCreateAppointmentWholeDay)),
    Branch::otherwise(appt(A::PromptTime)),
];

pub const NO_INPUT_RECOVERY: &[Branch] = &[
    Branch::when(Guard::MissingPerson, appt(A::PromptPerson)),
    Branch::when(Guard::MissingDay, appt(A::PromptDay)),
    Branch::when(Guard::MissingWholeDay, appt(A::PromptWholeDay)),
    Branch::when(Guard::MissingTime, appt(A::PromptTime)),
    Branch::otherwise(appt(A::Prompt)),
];

pub const CONFIRMATION_HEARD: &[Branch] = &[
    Branch::when(Guard::HasConfirmed, appt(A::Done)),
    Branch::when(Guard::HasDenied, appt(A::Prompt)),
    Branch::when(Guard::IsWholeDay, appt(A::PromptCreateAppointmentWholeDay)),
    Branch::otherwise(appt(A::PromptCreateAppointmentWithTime)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::AppointmentDetails;
    use crate::events::Hypothesis;

    fn heard(text: &str) -> DialogueContext {
        let mut ctx = DialogueContext::default();
        ctx.recognise(vec![Hypothesis {
            utterance: text.to_string(),
            confidence: 0.9,
        }]);
        ctx
    }

    fn details(person: bool, day: bool, whole_day: Option<bool>, time: bool) -> AppointmentDetails {
        AppointmentDetails {
            person: person.then(|| "Bora Kara".to_string()),
            day: day.then(|| "Monday".to_string()),
            whole_day,
            time: time.then(|| "10:00".to_string()),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let cascade = [
            Branch::when(Guard::HasRecognition, DialogueState::CheckGrammar),
            Branch::otherwise(DialogueState::Done),
        ];
        assert_eq!(select(&cascade, &heard("x")), Some(DialogueState::CheckGrammar));
        assert_eq!(select(&cascade, &DialogueContext::default()), Some(DialogueState::Done));
    }

    #[test]
    fn test_is_appointment_by_substring() {
        assert!(Guard::IsAppointment.check(&heard("I want an Appointment please")));
        assert!(Guard::IsAppointment.check(&heard("appointment")));
        assert!(!Guard::IsAppointment.check(&heard("vlad")));
        assert!(!Guard::IsAppointment.check(&DialogueContext::default()));
    }

    #[test]
    fn test_whole_day_identified_on_negative() {
        assert!(Guard::HasIdentifiedWholeDay.check(&heard("nope")));
        assert!(!Guard::HasIdentifiedWholeDay.check(&heard("maybe")));
    }

    #[test]
    fn test_no_input_recovery_table() {
        let cases = [
            (details(false, false, None, false), A::PromptPerson),
            (details(false, true, Some(true), true), A::PromptPerson),
            (details(true, false, None, false), A::PromptDay),
            (details(true, false, Some(false), true), A::PromptDay),
            (details(true, true, None, false), A::PromptWholeDay),
            (details(true, true, Some(false), false), A::PromptTime),
            (details(true, true, Some(false), true), A::Prompt),
            (details(true, true, Some(true), false), A::Prompt),
            (details(true, true, Some(true), true), A::Prompt),
        ];

        for (details, expected) in cases {
            let ctx = DialogueContext {
                details: details.clone(),
                ..DialogueContext::default()
            };
            assert_eq!(
                select(NO_INPUT_RECOVERY, &ctx),
                Some(appt(expected)),
                "{:?}",
                details
            );
        }
    }

    #[test]
    fn test_confirmation_prefers_gathered_whole_day() {
        let mut ctx = heard("maybe");
        ctx.details = details(true, true, Some(true), false);
        assert_eq!(
            select(CONFIRMATION_HEARD, &ctx),
            Some(appt(A::PromptCreateAppointmentWholeDay))
        );

        ctx.details.whole_day = Some(false);
        assert_eq!(
            select(CONFIRMATION_HEARD, &ctx),
            Some(appt(A::PromptCreateAppointmentWithTime))
        );
    }
}
