//! Console speech transport
//!
//! Speaking writes a line to the output, listening reads one line from
//! the input. A blank line or silence past the no-input timeout counts
//! as no input.

use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin,
    Stdout,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SpeechSettings;
use crate::events::{Command, DialogueEvent, Hypothesis};

/// Errors that stop the transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("dialogue event channel closed")]
    ChannelClosed,
}

/// Outcome of a single listen
enum Heard {
    Text(String),
    Nothing,
    EndOfInput,
}

/// Text-based stand-in for speech synthesis and recognition
pub struct ConsoleTransport<R, W> {
    settings: SpeechSettings,
    lines: Lines<R>,
    output: W,
    event_tx: mpsc::Sender<DialogueEvent>,
}

impl ConsoleTransport<BufReader<Stdin>, Stdout> {
    /// Transport reading stdin and writing stdout
    pub fn stdio(settings: SpeechSettings, event_tx: mpsc::Sender<DialogueEvent>) -> Self {
        Self::new(settings, BufReader::new(io::stdin()), io::stdout(), event_tx)
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        settings: SpeechSettings,
        input: R,
        output: W,
        event_tx: mpsc::Sender<DialogueEvent>,
    ) -> Self {
        Self {
            settings,
            lines: input.lines(),
            output,
            event_tx,
        }
    }

    /// Execute commands until the command channel closes or input ends
    pub async fn run(&mut self, mut command_rx: mpsc::Receiver<Command>) -> Result<(), TransportError> {
        info!("console transport started");

        while let Some(command) = command_rx.recv().await {
            debug!(?command, "executing command");
            if !self.execute(command).await? {
                info!("end of console input");
                break;
            }
        }

        info!("console transport stopped");
        Ok(())
    }

    /// Returns false once the input is exhausted
    async fn execute(&mut self, command: Command) -> Result<bool, TransportError> {
        match command {
            Command::Prepare => {
                info!(
                    locale = %self.settings.locale,
                    voice = %self.settings.voice,
                    no_input_ms = self.settings.no_input_timeout.as_millis() as u64,
                    complete_ms = self.settings.complete_timeout.as_millis() as u64,
                    "preparing speech transport"
                );
                self.emit(DialogueEvent::AsrTtsReady).await?;
            }
            Command::Speak { utterance } => {
                let line = format!("{}: {}\n", self.settings.voice, utterance);
                self.output.write_all(line.as_bytes()).await?;
                self.output.flush().await?;
                self.emit(DialogueEvent::SpeakComplete).await?;
            }
            Command::Listen => match self.listen().await? {
                Heard::Text(utterance) => {
                    let value = vec![Hypothesis {
                        utterance,
                        confidence: 1.0,
                    }];
                    self.emit(DialogueEvent::Recognised { value }).await?;
                    self.emit(DialogueEvent::ListenComplete).await?;
                }
                Heard::Nothing => self.emit(DialogueEvent::AsrNoInput).await?,
                Heard::EndOfInput => return Ok(false),
            },
        }
        Ok(true)
    }

    async fn listen(&mut self) -> Result<Heard, TransportError> {
        let timeout = self.settings.no_input_timeout;
        let line = if timeout.is_zero() {
            self.lines.next_line().await?
        } else {
            match tokio::time::timeout(timeout, self.lines.next_line()).await {
                Ok(line) => line?,
                Err(_) => {
                    debug!(timeout_ms = timeout.as_millis() as u64, "listen timed out");
                    return Ok(Heard::Nothing);
                }
            }
        };

        Ok(match line {
            None => Heard::EndOfInput,
            Some(text) if text.trim().is_empty() => Heard::Nothing,
            Some(text) => Heard::Text(text.trim().to_string()),
        })
    }

    async fn emit(&self, event: DialogueEvent) -> Result<(), TransportError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::{Builder, Mock};

    fn transport(
        input: Mock,
    ) -> (ConsoleTransport<BufReader<Mock>, Vec<u8>>, mpsc::Receiver<DialogueEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let settings = SpeechSettings {
            voice: "test-voice".to_string(),
            no_input_timeout: Duration::from_secs(5),
            ..SpeechSettings::default()
        };
        (ConsoleTransport::new(settings, BufReader::new(input), Vec::new(), tx), rx)
    }

    async fn run_commands(
        transport: &mut ConsoleTransport<BufReader<Mock>, Vec<u8>>,
        commands: Vec<Command>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        for command in commands {
            tx.send(command).await.unwrap();
        }
        drop(tx);
        tokio_test::assert_ok!(transport.run(rx).await);
    }

    fn drain(rx: &mut mpsc::Receiver<DialogueEvent>) -> Vec<DialogueEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_prepare_and_speak() {
        let (mut transport, mut rx) = transport(Builder::new().build());
        run_commands(&mut transport, vec![Command::Prepare, Command::speak("Hello world!")]).await;

        assert_eq!(
            drain(&mut rx),
            vec![DialogueEvent::AsrTtsReady, DialogueEvent::SpeakComplete]
        );
        assert_eq!(
            String::from_utf8(transport.output.clone()).unwrap(),
            "test-voice: Hello world!\n"
        );
    }

    #[tokio::test]
    async fn test_listen_recognises_line() {
        let (mut transport, mut rx) = transport(Builder::new().read(b"  Vlad \n").build());
        run_commands(&mut transport, vec![Command::Listen]).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        match &events[0] {
            DialogueEvent::Recognised { value } => assert_eq!(value[0].utterance, "Vlad"),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[1], DialogueEvent::ListenComplete);
    }

    #[tokio::test]
    async fn test_blank_line_is_no_input() {
        let (mut transport, mut rx) = transport(Builder::new().read(b"\nfriday\n").build());
        run_commands(&mut transport, vec![Command::Listen, Command::Listen]).await;

        let events = drain(&mut rx);
        assert_eq!(events[0], DialogueEvent::AsrNoInput);
        assert!(matches!(events[1], DialogueEvent::Recognised { .. }));
        assert_eq!(events[2], DialogueEvent::ListenComplete);
    }

    #[tokio::test]
    async fn test_end_of_input_stops() {
        let (mut transport, mut rx) = transport(Builder::new().build());
        run_commands(&mut transport, vec![Command::Listen, Command::speak("unreached")]).await;

        assert!(drain(&mut rx).is_empty());
        assert!(transport.output.is_empty());
    }

    #[tokio::test]
    async fn test_closed_event_channel_is_error() {
        let (mut transport, rx) = transport(Builder::new().build());
        drop(rx);

        let (tx, command_rx) = mpsc::channel(1);
        tx.send(Command::Prepare).await.unwrap();
        let result = transport.run(command_rx).await;
        assert!(matches!(result, Err(TransportError::ChannelClosed)));
    }
}
