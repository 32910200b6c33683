//! Mock wiring shared by the chat use case tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chatbridge_domain::Color;

use crate::infrastructure::backend_state::BackendState;
use crate::infrastructure::completion::CompletionClient;
use crate::infrastructure::ports::{
    BackendKind, CompletionRequest, LlmError, MockCompletionPort, MockEnginePort, MockGamePort,
    MockProbePort, ProbeResult,
};
use crate::infrastructure::settings::ChatSettings;

use super::session::{BackendCatalog, ChatSession};

pub(crate) const BOT_NAME: &str = "WittyBot";
pub(crate) const GAME_ID: &str = "abcd1234";
pub(crate) const ENDPOINT: &str = "http://localhost:11434";

pub(crate) fn settings(max_history_messages: usize) -> ChatSettings {
    ChatSettings {
        max_history_messages,
        ..ChatSettings::default()
    }
}

pub(crate) fn connected_probe(model: Option<&str>) -> MockProbePort {
    let model = model.map(str::to_string);
    let mut probe = MockProbePort::new();
    probe.expect_endpoint().return_const(ENDPOINT.to_string());
    probe
        .expect_probe()
        .returning(move || ProbeResult::reachable(model.clone()));
    probe
}

pub(crate) fn unreachable_probe() -> MockProbePort {
    let mut probe = MockProbePort::new();
    probe.expect_endpoint().return_const(ENDPOINT.to_string());
    probe.expect_probe().returning(ProbeResult::unreachable);
    probe
}

pub(crate) fn replying_backend<F>(kind: BackendKind, reply: F) -> MockCompletionPort
where
    F: Fn(&CompletionRequest) -> String + Send + 'static,
{
    let mut backend = MockCompletionPort::new();
    backend.expect_kind().return_const(kind);
    backend
        .expect_complete()
        .returning(move |request| Ok(reply(&request)));
    backend
}

pub(crate) fn failing_backend(error: LlmError) -> MockCompletionPort {
    let mut backend = MockCompletionPort::new();
    backend.expect_kind().return_const(BackendKind::RemoteHttp);
    backend
        .expect_complete()
        .returning(move |_| Err(error.clone()));
    backend
}

/// Overloaded (503) for the first `failures` requests, then replies with `reply`.
pub(crate) fn flaky_backend(failures: usize, reply: &str) -> MockCompletionPort {
    let reply = reply.to_string();
    let calls = AtomicUsize::new(0);
    let mut backend = MockCompletionPort::new();
    backend.expect_kind().return_const(BackendKind::RemoteHttp);
    backend.expect_complete().returning(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) < failures {
            Err(LlmError::ServerOverloaded { status: 503 })
        } else {
            Ok(reply.clone())
        }
    });
    backend
}

/// A backend that must never be asked for a completion.
pub(crate) fn idle_backend(kind: BackendKind) -> MockCompletionPort {
    let mut backend = MockCompletionPort::new();
    backend.expect_kind().return_const(kind);
    backend.expect_complete().never();
    backend
}

pub(crate) fn remote_client(backend: MockCompletionPort) -> CompletionClient {
    CompletionClient::new(
        Arc::new(backend),
        Arc::new(BackendState::new(ENDPOINT, true, 1)),
    )
}

pub(crate) fn local_client(backend: MockCompletionPort) -> CompletionClient {
    CompletionClient::new(
        Arc::new(backend),
        Arc::new(BackendState::new("in-process", true, 1)),
    )
}

pub(crate) fn game_with(abortable: bool) -> MockGamePort {
    let mut game = MockGamePort::new();
    game.expect_id().return_const(GAME_ID.to_string());
    game.expect_url()
        .return_const(format!("https://lichess.org/{GAME_ID}"));
    game.expect_username().return_const(BOT_NAME.to_string());
    game.expect_display_name().return_const(BOT_NAME.to_string());
    game.expect_my_color().return_const(Color::White);
    game.expect_side_to_move().return_const(Color::White);
    game.expect_is_abortable().return_const(abortable);
    game
}

pub(crate) fn game() -> MockGamePort {
    game_with(false)
}

pub(crate) fn engine_with_stats(stats: &[&str]) -> MockEnginePort {
    let stats: Vec<String> = stats.iter().map(|s| s.to_string()).collect();
    let mut engine = MockEnginePort::new();
    engine.expect_name().return_const("Stockfish 16".to_string());
    engine.expect_stats().returning(move || stats.clone());
    engine
}

/// Builds a [`ChatSession`] from mocks, defaulting anything not set.
pub(crate) struct SessionFixture {
    settings: ChatSettings,
    probe: Option<MockProbePort>,
    remote: Option<CompletionClient>,
    local: Option<CompletionClient>,
    engine: Option<MockEnginePort>,
}

impl SessionFixture {
    pub(crate) fn new(settings: ChatSettings) -> Self {
        Self {
            settings,
            probe: None,
            remote: None,
            local: None,
            engine: None,
        }
    }

    pub(crate) fn probe(mut self, probe: MockProbePort) -> Self {
        self.probe = Some(probe);
        self
    }

    pub(crate) fn remote(self, backend: MockCompletionPort) -> Self {
        self.remote_client(remote_client(backend))
    }

    pub(crate) fn remote_client(mut self, client: CompletionClient) -> Self {
        self.remote = Some(client);
        self
    }

    pub(crate) fn local(mut self, backend: MockCompletionPort) -> Self {
        self.local = Some(local_client(backend));
        self
    }

    pub(crate) fn engine(mut self, engine: MockEnginePort) -> Self {
        self.engine = Some(engine);
        self
    }

    pub(crate) fn build(self) -> ChatSession {
        let catalog = BackendCatalog {
            probe: Arc::new(self.probe.unwrap_or_else(unreachable_probe)),
            remote: self
                .remote
                .unwrap_or_else(|| remote_client(idle_backend(BackendKind::RemoteHttp))),
            local: self.local,
        };
        ChatSession::new(
            GAME_ID,
            Arc::new(self.settings),
            catalog,
            Arc::new(game()),
            Arc::new(
                self.engine
                    .unwrap_or_else(|| engine_with_stats(&["Evaluation: +0.35"])),
            ),
        )
    }

    pub(crate) async fn start(self) -> ChatSession {
        let session = self.build();
        session.connect().await;
        session
    }
}
