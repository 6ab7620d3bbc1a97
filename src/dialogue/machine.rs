//! Core dialogue state machine
//!
//! Consumes transport and trigger events one at a time, runs the entry
//! actions of every state it enters, and returns the commands those
//! actions issued. It never performs I/O itself.

use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::events::{Command, DialogueEvent, Slot, StateEvent};

use super::context::{AppointmentDetails, DialogueContext};
use super::guards::{self, Branch};
use super::prompts;
use super::state::{AppointmentState, DialogueState, GreetingState};

/// The dialogue machine driving one conversation at a time
pub struct DialogueMachine {
    state: DialogueState,
    context: DialogueContext,
    /// Time when the current state was entered
    state_entered_at: Instant,
    /// Channel for emitting notifications to observers
    event_tx: broadcast::Sender<StateEvent>,
}

impl DialogueMachine {
    /// Create a machine resting in Prepare; call `start` to run its entry
    pub fn new(event_tx: broadcast::Sender<StateEvent>) -> Self {
        Self {
            state: DialogueState::Prepare,
            context: DialogueContext::default(),
            state_entered_at: Instant::now(),
            event_tx,
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn context(&self) -> &DialogueContext {
        &self.context
    }

    pub fn details(&self) -> &AppointmentDetails {
        &self.context.details
    }

    /// Run the entry actions of the initial state
    pub fn start(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        self.enter(DialogueState::Prepare, &mut commands);
        commands
    }

    /// Run the machine, feeding issued commands to the transport
    pub async fn run(
        &mut self,
        mut event_rx: mpsc::Receiver<DialogueEvent>,
        command_tx: mpsc::Sender<Command>,
    ) {
        info!("dialogue machine started");

        let mut pending = self.start();
        loop {
            for command in pending.drain(..) {
                if command_tx.send(command).await.is_err() {
                    warn!("transport command channel closed");
                    return;
                }
            }

            match event_rx.recv().await {
                Some(event) => pending = self.handle(event),
                None => break,
            }
        }

        info!("dialogue machine stopped");
    }

    /// Process one event to completion
    pub fn handle(&mut self, event: DialogueEvent) -> Vec<Command> {
        debug!(state = %self.state, %event, "event received");

        let mut commands = Vec::new();
        if let Some(target) = self.react(event) {
            self.enter(target, &mut commands);
        }
        commands
    }

    /// Apply transition actions for an event and pick the target, if any
    fn react(&mut self, event: DialogueEvent) -> Option<DialogueState> {
        use DialogueState as S;

        match (self.state, event) {
            (S::Prepare, DialogueEvent::AsrTtsReady) => Some(S::WaitToStart),
            (S::WaitToStart | S::Done, DialogueEvent::Start) => {
                Some(S::Greeting(GreetingState::Prompt))
            }
            (S::Greeting(sub), event) => self.react_greeting(sub, event),
            (S::CheckGrammar, DialogueEvent::SpeakComplete) => Some(S::Done),
            (S::Appointment(sub), event) => self.react_appointment(sub, event),
            (state, event) => {
                debug!(%state, %event, "event ignored");
                None
            }
        }
    }

    fn react_greeting(&mut self, sub: GreetingState, event: DialogueEvent) -> Option<DialogueState> {
        match (sub, event) {
            (GreetingState::Prompt | GreetingState::NoInput, DialogueEvent::SpeakComplete) => {
                Some(DialogueState::Greeting(GreetingState::Ask))
            }
            (GreetingState::Ask, DialogueEvent::Recognised { value }) => {
                self.context.recognise(value);
                None
            }
            (GreetingState::Ask, DialogueEvent::AsrNoInput) => {
                self.context.clear_data();
                Some(DialogueState::Greeting(GreetingState::NoInput))
            }
            (GreetingState::Ask, DialogueEvent::ListenComplete) => {
                self.choose(guards::GREETING_HEARD)
            }
            (sub, event) => {
                debug!(state = %sub, %event, "greeting event ignored");
                None
            }
        }
    }

    fn react_appointment(
        &mut self,
        sub: AppointmentState,
        event: DialogueEvent,
    ) -> Option<DialogueState> {
        use AppointmentState as A;

        let next = |state| Some(DialogueState::Appointment(state));

        match event {
            DialogueEvent::Recognised { value } => {
                self.context.recognise(value);
                None
            }
            DialogueEvent::AsrNoInput => {
                self.context.clear_data();
                next(A::NoInput)
            }
            DialogueEvent::ListenComplete => match sub {
                A::AskPerson => self.choose(guards::PERSON_HEARD),
                A::AskDay => self.choose(guards::DAY_HEARD),
                A::AskWholeDay => self.choose(guards::WHOLE_DAY_HEARD),
                A::AskTime => self.choose(guards::TIME_HEARD),
                A::Confirmation => self.choose(guards::CONFIRMATION_HEARD),
                _ => next(A::NoInput),
            },
            DialogueEvent::SpeakComplete => match sub {
                A::Prompt => next(A::PromptPerson),
                A::NoInput => self.choose(guards::NO_INPUT_RECOVERY),
                A::PromptPerson => next(A::AskPerson),
                A::PersonIdentified => next(A::PromptDay),
                A::PromptDay => next(A::AskDay),
                A::DayIdentified => next(A::PromptWholeDay),
                A::PromptWholeDay => next(A::AskWholeDay),
                A::WholeDayIdentified => self.choose(guards::AFTER_WHOLE_DAY),
                A::PromptTime => next(A::AskTime),
                A::TimeIdentified => next(A::PromptCreateAppointmentWithTime),
                A::PromptCreateAppointmentWithTime | A::PromptCreateAppointmentWholeDay => {
                    next(A::Confirmation)
                }
                A::Done => Some(DialogueState::Done),
                A::AskPerson | A::AskDay | A::AskWholeDay | A::AskTime | A::Confirmation => {
                    debug!(state = %sub, "speech completion while listening ignored");
                    None
                }
            },
            DialogueEvent::AsrTtsReady | DialogueEvent::Start => {
                debug!(state = %sub, "appointment event ignored");
                None
            }
        }
    }

    fn choose(&self, cascade: &[Branch]) -> Option<DialogueState> {
        let target = guards::select(cascade, &self.context);
        debug!(?target, "guard cascade evaluated");
        target
    }

    /// Enter a state and run its entry actions in order
    fn enter(&mut self, target: DialogueState, commands: &mut Vec<Command>) {
        self.transition_to(target);

        match target {
            DialogueState::Prepare => issue(commands, Command::Prepare),
            DialogueState::WaitToStart | DialogueState::Done => {}
            DialogueState::Greeting(sub) => match sub {
                GreetingState::Prompt => issue(commands, Command::speak(prompts::GREETING)),
                GreetingState::Ask => issue(commands, Command::Listen),
                GreetingState::NoInput => issue(commands, Command::speak(prompts::CANT_HEAR)),
            },
            DialogueState::CheckGrammar => {
                issue(commands, Command::speak(prompts::grammar_check(&self.context)));
            }
            DialogueState::Appointment(sub) => self.enter_appointment(sub, commands),
        }
    }

    fn enter_appointment(&mut self, sub: AppointmentState, commands: &mut Vec<Command>) {
        use AppointmentState as A;

        match sub {
            A::Prompt => {
                issue(commands, Command::speak(prompts::APPOINTMENT_INTRO));
                self.context.clear_data();
                self.context.reset_details();
            }
            A::NoInput => issue(commands, Command::speak(prompts::CANT_HEAR)),
            A::PromptPerson => issue(commands, Command::speak(prompts::ask_person(&self.context))),
            A::PromptDay => issue(commands, Command::speak(prompts::ask_day(&self.context))),
            A::PromptWholeDay => {
                issue(commands, Command::speak(prompts::ask_whole_day(&self.context)));
            }
            A::PromptTime => issue(commands, Command::speak(prompts::ask_time(&self.context))),
            A::AskPerson | A::AskDay | A::AskWholeDay | A::AskTime => {
                issue(commands, Command::Listen);
            }
            A::PersonIdentified => {
                self.context.details.person = self.context.slots.person.clone();
                self.slot_filled(Slot::Person, self.context.details.person.clone());
                issue(commands, Command::speak(prompts::person_summary(&self.context.details)));
                self.context.clear_data();
            }
            A::DayIdentified => {
                self.context.details.day = self.context.slots.day.clone();
                self.slot_filled(Slot::Day, self.context.details.day.clone());
                issue(commands, Command::speak(prompts::day_summary(&self.context.details)));
                self.context.clear_data();
            }
            A::WholeDayIdentified => {
                self.context.details.whole_day = self.context.slots.value;
                self.slot_filled(
                    Slot::WholeDay,
                    self.context.details.whole_day.map(|v| v.to_string()),
                );
                issue(commands, Command::speak(prompts::whole_day_summary(&self.context.details)));
                self.context.clear_data();
            }
            A::TimeIdentified => {
                self.context.details.time = self.context.slots.time.clone();
                self.slot_filled(Slot::Time, self.context.details.time.clone());
                issue(commands, Command::speak(prompts::time_summary(&self.context.details)));
                self.context.clear_data();
            }
            A::PromptCreateAppointmentWithTime => {
                issue(commands, Command::speak(prompts::confirm_with_time(&self.context.details)));
            }
            A::PromptCreateAppointmentWholeDay => {
                issue(commands, Command::speak(prompts::confirm_whole_day(&self.context.details)));
            }
            A::Confirmation => {
                issue(commands, Command::Listen);
                self.context.clear_data();
            }
            A::Done => {
                issue(commands, Command::speak(prompts::APPOINTMENT_CREATED));
                info!(details = %self.context.details, "appointment created");
                let _ = self.event_tx.send(StateEvent::AppointmentCreated {
                    details: self.context.details.clone(),
                });
            }
        }
    }

    fn slot_filled(&self, slot: Slot, value: Option<String>) {
        let value = value.unwrap_or_default();
        info!(?slot, %value, "slot filled");
        let _ = self.event_tx.send(StateEvent::SlotFilled { slot, value });
    }

    /// Record a state change and notify observers
    fn transition_to(&mut self, new_state: DialogueState) {
        let old_state = self.state;
        let duration_ms = self.state_entered_at.elapsed().as_millis() as u64;

        info!(
            from = %old_state,
            to = %new_state,
            duration_ms = duration_ms,
            "state transition"
        );

        self.state = new_state;
        self.state_entered_at = Instant::now();

        let _ = self.event_tx.send(StateEvent::StateChanged {
            from: old_state.to_string(),
            to: new_state.to_string(),
        });
    }
}

fn issue(commands: &mut Vec<Command>, command: Command) {
    debug!(?command, "issuing command");
    commands.push(command);
}
