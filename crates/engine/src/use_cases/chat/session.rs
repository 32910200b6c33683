//! Chat session use case.
//!
//! One session per game conversation. It selects a completion backend once by
//! probing, then answers free-text chat through the history/completion cycle:
//!
//! 1. Refuse with a fixed apology when disabled or disconnected (a disconnected
//!    session probes again first, at most once per cooldown)
//! 2. Build the system prompt from the live game context
//! 3. Append the user turn
//! 4. Ask the backend for a completion
//! 5. On failure roll the user turn back, on success append the reply
//!
//! Messages submitted to a session are handled one at a time, in submission
//! order, by a worker task owned by the session.

use std::sync::Arc;

use chatbridge_domain::Transcript;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::time::Instant;

use crate::infrastructure::completion::CompletionClient;
use crate::infrastructure::ports::{BackendKind, EnginePort, GamePort, ProbePort};
use crate::infrastructure::settings::ChatSettings;

use super::prompt::SystemPromptBuilder;

/// Reply while the feature is off or no backend is available.
pub const DISCONNECTED_REPLY: &str = "My brain is currently disconnected.";
/// Reply when a completion attempt failed.
pub const GENERATION_FAILED_REPLY: &str = "I'm lost for words...";

/// Lifecycle of a session's link to its completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Feature turned off; terminal.
    Disabled,
    Uninitialized,
    Probing,
    Connected,
    /// Leaves this state only through a fresh probe, retried on incoming
    /// messages once the re-probe cooldown has passed.
    Disconnected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disabled => write!(f, "disabled"),
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Probing => write!(f, "probing"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// The backends a session may pick from when it probes.
#[derive(Clone)]
pub struct BackendCatalog {
    pub probe: Arc<dyn ProbePort>,
    /// Remote server behind `probe`; its state is shared by every session.
    pub remote: CompletionClient,
    /// Used when the remote server cannot be reached.
    pub local: Option<CompletionClient>,
}

enum Link {
    Disabled,
    Uninitialized,
    Probing,
    Ready(CompletionClient),
    Unavailable,
}

struct SessionInner {
    id: String,
    settings: Arc<ChatSettings>,
    catalog: BackendCatalog,
    game: Arc<dyn GamePort>,
    engine: Arc<dyn EnginePort>,
    prompt: SystemPromptBuilder,
    link: RwLock<Link>,
    last_probe: Mutex<Option<Instant>>,
    transcript: Mutex<Transcript>,
}

struct Job {
    text: String,
    reply: oneshot::Sender<String>,
}

/// A reply being generated in the background.
pub struct PendingReply {
    rx: oneshot::Receiver<String>,
}

impl PendingReply {
    /// Wait for the reply. A session that went away yields the failure reply.
    pub async fn wait(self) -> String {
        self.rx
            .await
            .unwrap_or_else(|_| GENERATION_FAILED_REPLY.to_string())
    }
}

pub struct ChatSession {
    inner: Arc<SessionInner>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl ChatSession {
    /// Create a session in the `Uninitialized` state. Must be called from
    /// within a Tokio runtime: the session's worker task starts here.
    pub fn new(
        id: impl Into<String>,
        settings: Arc<ChatSettings>,
        catalog: BackendCatalog,
        game: Arc<dyn GamePort>,
        engine: Arc<dyn EnginePort>,
    ) -> Self {
        let inner = Arc::new(SessionInner {
            id: id.into(),
            prompt: SystemPromptBuilder::new(settings.score_stat_index),
            transcript: Mutex::new(Transcript::new(settings.max_history_messages)),
            link: RwLock::new(Link::Uninitialized),
            last_probe: Mutex::new(None),
            settings,
            catalog,
            game,
            engine,
        });

        let (jobs, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(Arc::clone(&inner), rx));

        Self { inner, jobs }
    }

    /// Create a session and probe its backend.
    pub async fn start(
        id: impl Into<String>,
        settings: Arc<ChatSettings>,
        catalog: BackendCatalog,
        game: Arc<dyn GamePort>,
        engine: Arc<dyn EnginePort>,
    ) -> Self {
        let session = Self::new(id, settings, catalog, game, engine);
        session.connect().await;
        session
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Probe the backend and select the completion client to use.
    pub async fn connect(&self) -> SessionState {
        self.inner.connect().await
    }

    /// Probe again, e.g. after the backend was marked disconnected.
    pub async fn reprobe(&self) -> SessionState {
        self.inner.connect().await
    }

    pub async fn state(&self) -> SessionState {
        self.inner.state().await
    }

    /// Kind of the selected backend, if one is selected.
    pub async fn backend_kind(&self) -> Option<BackendKind> {
        match &*self.inner.link.read().await {
            Link::Ready(client) => Some(client.kind()),
            _ => None,
        }
    }

    /// Answer one chat message. Concurrent calls are serialized on the transcript.
    pub async fn handle_message(&self, text: &str) -> String {
        self.inner.handle_message(text).await
    }

    /// Queue a message for the session worker and return without waiting.
    pub fn submit(&self, text: impl Into<String>) -> PendingReply {
        let (reply, rx) = oneshot::channel();
        let job = Job {
            text: text.into(),
            reply,
        };
        if self.jobs.send(job).is_err() {
            tracing::warn!(session_id = %self.inner.id, "Chat session worker has stopped");
        }
        PendingReply { rx }
    }

    /// Copy of the current transcript.
    pub async fn transcript(&self) -> Transcript {
        self.inner.transcript.lock().await.clone()
    }
}

impl SessionInner {
    async fn connect(&self) -> SessionState {
        if !self.settings.enabled {
            *self.link.write().await = Link::Disabled;
            tracing::info!(session_id = %self.id, "AI chat disabled");
            return SessionState::Disabled;
        }

        *self.link.write().await = Link::Probing;
        *self.last_probe.lock().await = Some(Instant::now());
        let probe = &self.catalog.probe;
        let result = probe.probe().await;

        let link = if result.reachable {
            self.catalog.remote.state().mark_connected(result.model_id);
            Link::Ready(self.catalog.remote.clone())
        } else {
            self.catalog.remote.state().mark_disconnected();
            match &self.catalog.local {
                Some(local) => {
                    tracing::info!(
                        session_id = %self.id,
                        endpoint = %probe.endpoint(),
                        "Completion server unreachable, using in-process backend"
                    );
                    local.state().mark_connected(None);
                    Link::Ready(local.clone())
                }
                None => {
                    tracing::warn!(
                        session_id = %self.id,
                        endpoint = %probe.endpoint(),
                        "Completion server unreachable, AI chat unavailable"
                    );
                    Link::Unavailable
                }
            }
        };

        *self.link.write().await = link;
        let state = self.state().await;
        tracing::info!(session_id = %self.id, state = %state, "Chat session probed");
        state
    }

    async fn state(&self) -> SessionState {
        match &*self.link.read().await {
            Link::Disabled => SessionState::Disabled,
            Link::Uninitialized => SessionState::Uninitialized,
            Link::Probing => SessionState::Probing,
            Link::Ready(client) if client.state().is_connected() => SessionState::Connected,
            Link::Ready(_) | Link::Unavailable => SessionState::Disconnected,
        }
    }

    async fn connected_client(&self) -> Option<CompletionClient> {
        match &*self.link.read().await {
            Link::Ready(client) if client.state().is_connected() => Some(client.clone()),
            _ => None,
        }
    }

    /// The connected client, probing again first when the session is
    /// disconnected and the cooldown since the last probe has passed.
    async fn usable_client(&self) -> Option<CompletionClient> {
        if let Some(client) = self.connected_client().await {
            return Some(client);
        }
        if self.state().await != SessionState::Disconnected || !self.reprobe_due().await {
            return None;
        }

        tracing::info!(session_id = %self.id, "Backend disconnected, probing again");
        self.connect().await;
        self.connected_client().await
    }

    async fn reprobe_due(&self) -> bool {
        match *self.last_probe.lock().await {
            Some(at) => at.elapsed() >= self.settings.reprobe_cooldown(),
            None => true,
        }
    }

    async fn handle_message(&self, text: &str) -> String {
        // Checked under the lock so a request queued behind one that
        // disconnected the backend sees the new state.
        let mut transcript = self.transcript.lock().await;
        let Some(client) = self.usable_client().await else {
            tracing::debug!(session_id = %self.id, "Chat message ignored, no backend connected");
            return DISCONNECTED_REPLY.to_string();
        };

        let system_prompt = self.prompt.build(self.game.as_ref(), self.engine.as_ref());
        let settings = self
            .settings
            .completion_settings(client.state().model_id());

        transcript.append_user(text);
        let messages = transcript.render_for_request(&system_prompt);

        let reply = client.complete(messages, settings).await;
        if reply.is_empty() {
            transcript.rollback_unanswered();
            return GENERATION_FAILED_REPLY.to_string();
        }

        transcript.append_assistant(reply.clone());
        reply
    }
}

async fn run_worker(inner: Arc<SessionInner>, mut jobs: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = jobs.recv().await {
        let reply = inner.handle_message(&job.text).await;
        if job.reply.send(reply).is_err() {
            tracing::debug!(session_id = %inner.id, "Reply dropped, nobody is waiting");
        }
    }
    tracing::debug!(session_id = %inner.id, "Chat session worker stopped");
}
