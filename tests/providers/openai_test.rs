//! OpenAI-compatible wire format tests.

use outreach::providers::openai::{build_request, parse_response, OpenAiProvider};
use outreach::providers::{CompletionRequest, Message, ProviderError, StopReason};

fn simple_request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message::user("Hello")],
        system: Some("You are helpful.".to_owned()),
        max_tokens: Some(256),
        temperature: None,
        json_output: false,
    }
}

#[test]
fn build_request_sets_model_system_and_max_tokens() {
    let req = build_request("gpt-5", &simple_request());
    assert_eq!(req.model, "gpt-5");
    assert_eq!(req.max_tokens, Some(256));
    assert_eq!(req.messages.len(), 2);
    assert_eq!(req.messages[0].role, "system");
    assert_eq!(req.messages[0].content, "You are helpful.");
    assert_eq!(req.messages[1].role, "user");
    assert_eq!(req.messages[1].content, "Hello");
    assert!(req.response_format.is_none());
}

#[test]
fn build_request_omits_unset_fields() {
    let request = CompletionRequest {
        messages: vec![Message::user("Hi")],
        ..CompletionRequest::default()
    };
    let value = serde_json::to_value(build_request("sonar-pro", &request)).expect("serialize");
    assert_eq!(value["max_tokens"], 4096);
    assert!(value.get("temperature").is_none());
    assert!(value.get("response_format").is_none());
    assert_eq!(value["messages"].as_array().map(Vec::len), Some(1));
}

#[test]
fn build_request_json_mode_and_temperature() {
    let request = CompletionRequest {
        temperature: Some(0.0),
        json_output: true,
        ..simple_request()
    };
    let value = serde_json::to_value(build_request("gpt-5", &request)).expect("serialize");
    assert_eq!(value["response_format"]["type"], "json_object");
    assert_eq!(value["temperature"], 0.0);
}

#[test]
fn parse_response_reads_text_usage_and_stop_reason() {
    let body = r#"{
        "model": "gpt-5-2025",
        "choices": [{"message": {"content": "Email 1\nSubject: Hi"}, "finish_reason": "length"}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 34}
    }"#;
    let response = parse_response(body).expect("should parse");
    assert_eq!(response.text, "Email 1\nSubject: Hi");
    assert_eq!(response.stop_reason, StopReason::MaxTokens);
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 34);
    assert_eq!(response.model, "gpt-5-2025");
}

#[test]
fn parse_response_tolerates_missing_content_and_usage() {
    let body = r#"{"model": "sonar-pro", "choices": [{"message": {"content": null}}]}"#;
    let response = parse_response(body).expect("should parse");
    assert!(response.text.is_empty());
    assert_eq!(response.stop_reason, StopReason::EndTurn);
    assert_eq!(response.usage.input_tokens, 0);
}

#[test]
fn parse_response_rejects_empty_choices_and_garbage() {
    assert!(matches!(
        parse_response(r#"{"model": "m", "choices": []}"#),
        Err(ProviderError::Parse(_))
    ));
    assert!(matches!(
        parse_response("<html>bad gateway</html>"),
        Err(ProviderError::Parse(_))
    ));
}

#[test]
fn provider_rejects_invalid_endpoint() {
    let result = OpenAiProvider::new(
        "openai/gpt-5".to_owned(),
        "gpt-5".to_owned(),
        "sk-test".to_owned(),
        "not a url",
    );
    assert!(matches!(result, Err(ProviderError::Unavailable(_))));
}
