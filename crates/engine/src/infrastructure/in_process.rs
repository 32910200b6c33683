//! In-process completion backend.
//!
//! Stands in for the remote server when it cannot be reached. The "network
//! call" is a local generator run on the blocking pool, bounded by the same
//! request timeout and reporting failures the same way.

use std::sync::Arc;

use async_trait::async_trait;
use chatbridge_domain::{Role, Turn};

use crate::infrastructure::ports::{
    BackendKind, CompletionPort, CompletionRequest, CompletionSettings, LlmError, RandomPort,
};

/// Synchronous text generator living inside this process.
pub trait LocalGenerator: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn generate(&self, messages: &[Turn], settings: &CompletionSettings)
        -> Result<String, LlmError>;
}

pub struct InProcessBackend {
    generator: Arc<dyn LocalGenerator>,
}

impl InProcessBackend {
    pub fn new(generator: Arc<dyn LocalGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }
}

#[async_trait]
impl CompletionPort for InProcessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::InProcess
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let timeout = request.settings.timeout;
        let generator = Arc::clone(&self.generator);
        let task = tokio::task::spawn_blocking(move || {
            generator.generate(&request.messages, &request.settings)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(LlmError::Generator(join_error.to_string())),
            Err(_) => Err(LlmError::Timeout),
        }
    }
}

const DEFAULT_QUIPS: &[&str] = &[
    "Interesting move... I need to think about that.",
    "Bold. Let's see if it holds up.",
    "I've seen this position before. It didn't end well for someone.",
    "Chat is fun, but the clock is ticking.",
    "Good luck, you may need it.",
    "Every move is a question. I have answers.",
];

/// Offline generator replying with a short canned line.
pub struct CannedQuips {
    quips: Vec<String>,
    random: Arc<dyn RandomPort>,
}

impl CannedQuips {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self::with_quips(DEFAULT_QUIPS.iter().map(|q| q.to_string()).collect(), random)
    }

    pub fn with_quips(quips: Vec<String>, random: Arc<dyn RandomPort>) -> Self {
        Self { quips, random }
    }
}

impl LocalGenerator for CannedQuips {
    fn name(&self) -> &str {
        "canned-quips"
    }

    fn generate(
        &self,
        messages: &[Turn],
        _settings: &CompletionSettings,
    ) -> Result<String, LlmError> {
        if messages.last().map(|turn| turn.role) != Some(Role::User) {
            return Err(LlmError::Generator("no user turn to answer".to_string()));
        }
        if self.quips.is_empty() {
            return Err(LlmError::Generator("no quips configured".to_string()));
        }
        let index = self.random.gen_index(self.quips.len());
        self.quips
            .get(index)
            .cloned()
            .ok_or_else(|| LlmError::Generator(format!("quip index {index} out of range")))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::ports::MockRandomPort;
    use crate::infrastructure::random::FixedRandom;

    fn request(messages: Vec<Turn>, timeout: Duration) -> CompletionRequest {
        CompletionRequest::new(
            messages,
            CompletionSettings {
                model: "local".to_string(),
                temperature: 0.7,
                max_tokens: 50,
                timeout,
            },
        )
    }

    struct SlowGenerator;

    impl LocalGenerator for SlowGenerator {
        fn name(&self) -> &str {
            "slow"
        }

        fn generate(&self, _: &[Turn], _: &CompletionSettings) -> Result<String, LlmError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok("too late".to_string())
        }
    }

    struct PanickingGenerator;

    impl LocalGenerator for PanickingGenerator {
        fn name(&self) -> &str {
            "panicking"
        }

        fn generate(&self, _: &[Turn], _: &CompletionSettings) -> Result<String, LlmError> {
            panic!("model weights missing")
        }
    }

    #[tokio::test]
    async fn canned_quip_answers_user_turn() {
        let mut random = MockRandomPort::new();
        random.expect_gen_index().withf(|len| *len == 2).return_const(1usize);
        let generator = CannedQuips::with_quips(
            vec!["first".to_string(), "second".to_string()],
            Arc::new(random),
        );
        let backend = InProcessBackend::new(Arc::new(generator));

        let reply = backend
            .complete(request(
                vec![Turn::system("be brief"), Turn::user("hi")],
                Duration::from_secs(1),
            ))
            .await
            .unwrap();
        assert_eq!(reply, "second");
        assert_eq!(backend.kind(), BackendKind::InProcess);
    }

    #[tokio::test]
    async fn nothing_to_answer_is_a_generator_error() {
        let backend =
            InProcessBackend::new(Arc::new(CannedQuips::new(Arc::new(FixedRandom(0)))));
        let err = backend
            .complete(request(vec![Turn::system("be brief")], Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Generator(_)));
    }

    #[tokio::test]
    async fn slow_generation_times_out() {
        let backend = InProcessBackend::new(Arc::new(SlowGenerator));
        let err = backend
            .complete(request(vec![Turn::user("hi")], Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::Timeout);
    }

    #[tokio::test]
    async fn generator_panic_is_contained() {
        let backend = InProcessBackend::new(Arc::new(PanickingGenerator));
        let err = backend
            .complete(request(vec![Turn::user("hi")], Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Generator(_)));
    }
}
