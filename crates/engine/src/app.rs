//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    backend_state::BackendState,
    completion::CompletionClient,
    in_process::{CannedQuips, InProcessBackend},
    ports::{ChallengeQueuePort, ChatTransport, EnginePort, GamePort, RandomPort},
    probe::HttpBackendProbe,
    random::SystemRandom,
    remote_http::RemoteHttpBackend,
    settings::ChatSettings,
};
use crate::use_cases::chat::{BackendCatalog, ChatSession, Conversation};

/// Version reported by the `name` command.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main application state.
///
/// Holds the settings and the backends shared by every conversation. Each
/// game gets its own [`Conversation`] with a fresh chat session.
pub struct App {
    pub settings: Arc<ChatSettings>,
    pub transport: Arc<dyn ChatTransport>,
    backends: BackendCatalog,
}

impl App {
    /// Wire the remote server from settings, plus the in-process fallback when enabled.
    pub fn new(settings: ChatSettings, transport: Arc<dyn ChatTransport>) -> Self {
        let remote_state = Arc::new(BackendState::new(
            settings.url.clone(),
            settings.enabled,
            settings.server_error_threshold,
        ));
        let remote = CompletionClient::new(
            Arc::new(RemoteHttpBackend::new(&settings.url)),
            remote_state,
        );
        let probe = Arc::new(HttpBackendProbe::new(&settings.url, settings.probe_timeout()));

        let local = settings.local_fallback.then(|| {
            let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
            let backend = InProcessBackend::new(Arc::new(CannedQuips::new(random)));
            tracing::info!(
                generator = backend.generator_name(),
                "In-process fallback enabled"
            );
            CompletionClient::new(
                Arc::new(backend),
                Arc::new(BackendState::new(
                    "in-process",
                    settings.enabled,
                    settings.server_error_threshold,
                )),
            )
        });

        Self::with_backends(
            settings,
            transport,
            BackendCatalog {
                probe,
                remote,
                local,
            },
        )
    }

    pub fn with_backends(
        settings: ChatSettings,
        transport: Arc<dyn ChatTransport>,
        backends: BackendCatalog,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            transport,
            backends,
        }
    }

    /// State of the remote server, shared by all conversations.
    pub fn remote_state(&self) -> &Arc<BackendState> {
        self.backends.remote.state()
    }

    /// Open the chat of a game: creates and probes its session.
    pub async fn start_conversation(
        &self,
        game: Arc<dyn GamePort>,
        engine: Arc<dyn EnginePort>,
        challenges: Arc<dyn ChallengeQueuePort>,
    ) -> Conversation {
        let session = ChatSession::start(
            game.id(),
            Arc::clone(&self.settings),
            self.backends.clone(),
            Arc::clone(&game),
            Arc::clone(&engine),
        )
        .await;

        tracing::info!(
            game_id = %game.id(),
            state = %session.state().await,
            "Conversation started"
        );

        Conversation::new(
            game,
            engine,
            challenges,
            Arc::clone(&self.transport),
            session,
            VERSION,
            self.settings.command_prefix,
        )
    }
}
