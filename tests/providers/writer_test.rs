//! Tests for the deadline and text contract of `ModelWriter`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use outreach::providers::writer::ModelWriter;
use outreach::providers::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderError, StopReason, UsageStats,
};

#[derive(Default)]
struct RecordingProvider {
    reply: String,
    delay: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

#[async_trait]
impl LlmProvider for RecordingProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().expect("lock").push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(CompletionResponse {
            text: self.reply.clone(),
            stop_reason: StopReason::EndTurn,
            usage: UsageStats::default(),
            model: "test/recording".to_owned(),
        })
    }

    fn model_id(&self) -> &str {
        "test/recording"
    }
}

fn writer(provider: &Arc<RecordingProvider>, timeout: Duration) -> ModelWriter {
    ModelWriter::new(Arc::clone(provider) as Arc<dyn LlmProvider>, timeout, 777)
}

#[tokio::test]
async fn draft_trims_and_forwards_prompts() {
    let provider = Arc::new(RecordingProvider {
        reply: "\n  Email 1 text  \n".to_owned(),
        ..RecordingProvider::default()
    });
    let text = writer(&provider, Duration::from_secs(5))
        .draft("system prompt", "user message")
        .await
        .expect("draft should succeed");
    assert_eq!(text, "Email 1 text");

    let requests = provider.requests.lock().expect("lock");
    let request = &requests[0];
    assert_eq!(request.system.as_deref(), Some("system prompt"));
    assert_eq!(request.messages[0].content, "user message");
    assert_eq!(request.max_tokens, Some(777));
    assert_eq!(request.temperature, None);
    assert!(!request.json_output);
}

#[tokio::test]
async fn rewrite_is_deterministic_and_json_is_constrained() {
    let provider = Arc::new(RecordingProvider {
        reply: "{}".to_owned(),
        ..RecordingProvider::default()
    });
    let model = writer(&provider, Duration::from_secs(5));
    model.rewrite("fix it", "text").await.expect("rewrite");
    model.json("pick", "candidates").await.expect("json");

    let requests = provider.requests.lock().expect("lock");
    assert_eq!(requests[0].temperature, Some(0.0));
    assert!(!requests[0].json_output);
    assert!(requests[1].json_output);
    assert_eq!(model.model_id(), "test/recording");
}

#[tokio::test]
async fn blank_reply_is_an_error() {
    let provider = Arc::new(RecordingProvider {
        reply: "  \n ".to_owned(),
        ..RecordingProvider::default()
    });
    let result = writer(&provider, Duration::from_secs(5)).draft("s", "u").await;
    assert!(matches!(result, Err(ProviderError::EmptyResponse)));
}

#[tokio::test(start_paused = true)]
async fn slow_provider_times_out() {
    let provider = Arc::new(RecordingProvider {
        reply: "late".to_owned(),
        delay: Some(Duration::from_secs(600)),
        ..RecordingProvider::default()
    });
    let timeout = Duration::from_secs(30);
    let result = writer(&provider, timeout).draft("s", "u").await;
    match result {
        Err(ProviderError::Timeout(after)) => assert_eq!(after, timeout),
        other => panic!("expected timeout, got {other:?}"),
    }
}
