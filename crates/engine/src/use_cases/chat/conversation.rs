//! Conversation use case: one game's chat.
//!
//! Receives chat lines, answers commands directly and hands free text to the
//! game's [`ChatSession`]. Every outgoing reply goes through the sanitizer.

use std::sync::Arc;
use std::time::Duration;

use chatbridge_domain::{sanitize_reply, ChatCommand, ChatInput, ChatLine, MAX_CHAT_CHARS};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::infrastructure::ports::{ChallengeQueuePort, ChatTransport, EnginePort, GamePort};

use super::session::ChatSession;

pub const HELP_REPLY: &str = "Supported commands: !wait (wait a minute for my first move), !name, \
!eval (or any text starting with !eval), !queue";
pub const WAIT_REPLY: &str = "Waiting 60 seconds...";
pub const EVAL_REFUSED_REPLY: &str = "I don't tell that to my opponent, sorry.";
pub const EMPTY_QUEUE_REPLY: &str = "No challenges queued.";

const ABORT_EXTENSION: Duration = Duration::from_secs(60);

/// What to do with a received chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Command(ChatCommand),
    /// Free text for the language model.
    Forward(String),
}

pub struct Conversation {
    game: Arc<dyn GamePort>,
    engine: Arc<dyn EnginePort>,
    challenges: Arc<dyn ChallengeQueuePort>,
    transport: Arc<dyn ChatTransport>,
    session: ChatSession,
    version: String,
    command_prefix: char,
    messages: Mutex<Vec<ChatLine>>,
}

impl Conversation {
    pub fn new(
        game: Arc<dyn GamePort>,
        engine: Arc<dyn EnginePort>,
        challenges: Arc<dyn ChallengeQueuePort>,
        transport: Arc<dyn ChatTransport>,
        session: ChatSession,
        version: impl Into<String>,
        command_prefix: char,
    ) -> Self {
        Self {
            game,
            engine,
            challenges,
            transport,
            session,
            version: version.into(),
            command_prefix,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Decide what a line asks for. Lines from the bot itself only count
    /// when they request an evaluation.
    pub fn route(&self, line: &ChatLine) -> Option<Action> {
        let from_self = line.is_from(&self.game.username());

        match ChatInput::parse(&line.text, self.command_prefix) {
            ChatInput::Command(ChatCommand::Eval) => Some(Action::Command(ChatCommand::Eval)),
            _ if from_self => None,
            ChatInput::Command(command) => Some(Action::Command(command)),
            ChatInput::FreeText(text) => Some(Action::Forward(text)),
            ChatInput::UnknownCommand(command) => {
                tracing::debug!(command = %command, "Ignoring unknown chat command");
                None
            }
            ChatInput::Empty => None,
        }
    }

    /// Handle a received line. Command replies are sent before this returns;
    /// for free text the returned task delivers the reply once generated.
    pub async fn react(&self, line: ChatLine) -> Option<JoinHandle<()>> {
        tracing::info!(
            "*** {} [{}] {}: {}",
            self.game.url(),
            line.room,
            line.username,
            line.text
        );
        self.messages.lock().await.push(line.clone());

        match self.route(&line)? {
            Action::Command(command) => {
                if let Some(reply) = self.run_command(&line, command) {
                    self.send_reply(&line, &reply).await;
                }
                None
            }
            Action::Forward(text) => {
                let pending = self.session.submit(text);
                let transport = Arc::clone(&self.transport);
                let game = Arc::clone(&self.game);
                let room = line.room;
                Some(tokio::spawn(async move {
                    let reply = pending.wait().await;
                    deliver(transport.as_ref(), game.as_ref(), &room, &reply).await;
                }))
            }
        }
    }

    /// Reply for a command, or `None` when the command gets no answer.
    pub fn run_command(&self, line: &ChatLine, command: ChatCommand) -> Option<String> {
        match command {
            ChatCommand::Help => Some(HELP_REPLY.to_string()),
            ChatCommand::Wait => {
                if !self.game.is_abortable() {
                    return None;
                }
                self.game.extend_abort_timer(ABORT_EXTENSION);
                Some(WAIT_REPLY.to_string())
            }
            ChatCommand::Name => Some(format!(
                "{} running {} (chatbridge v{})",
                self.game.display_name(),
                self.engine.name(),
                self.version
            )),
            ChatCommand::Eval => {
                let from_self = line.is_from(&self.game.username());
                if from_self || line.is_spectator_room() {
                    Some(self.engine.stats().join(", "))
                } else {
                    Some(EVAL_REFUSED_REPLY.to_string())
                }
            }
            ChatCommand::Queue => {
                let challengers = self.challenges.challengers();
                if challengers.is_empty() {
                    return Some(EMPTY_QUEUE_REPLY.to_string());
                }
                let queue = challengers
                    .iter()
                    .rev()
                    .map(|name| format!("@{name}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!("Challenge queue: {queue}"))
            }
        }
    }

    /// Reply in the room the line came from.
    pub async fn send_reply(&self, line: &ChatLine, reply: &str) {
        deliver(self.transport.as_ref(), self.game.as_ref(), &line.room, reply).await;
    }

    /// Send an unprompted message to a room.
    pub async fn send_message(&self, room: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        deliver(self.transport.as_ref(), self.game.as_ref(), room, text).await;
    }

    /// Every line received so far, oldest first.
    pub async fn messages(&self) -> Vec<ChatLine> {
        self.messages.lock().await.clone()
    }
}

async fn deliver(transport: &dyn ChatTransport, game: &dyn GamePort, room: &str, reply: &str) {
    let reply = sanitize_reply(reply, MAX_CHAT_CHARS);
    if reply.is_empty() {
        return;
    }

    tracing::info!("*** {} [{}] {}: {}", game.url(), room, game.username(), reply);
    if let Err(e) = transport.send(&game.id(), room, &reply).await {
        tracing::warn!(game_id = %game.id(), room = %room, error = %e, "Failed to send chat message");
    }
}
