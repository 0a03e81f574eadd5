use std::sync::Arc;

use mockito::Matcher;
use newsdigest::llm::remote::RemoteLlmProvider;
use newsdigest::llm::summarizer::Summarizer;
use newsdigest::llm::{LlmProvider, LlmRequest};

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "model": "gemini-2.0-flash",
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
    .to_string()
}

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer fake-api-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gemini-2.0-flash",
            "max_tokens": 100
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("This is a test response"))
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.0-flash");

    let request = LlmRequest {
        prompt: "Test prompt".to_string(),
        max_tokens: Some(100),
        temperature: None,
        timeout_seconds: Some(10),
    };

    let result = provider.generate(request).await;

    assert!(result.is_ok());
    let response = result.unwrap();
    assert_eq!(response.content, "This is a test response");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gemini-2.0-flash");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_response_without_usage_is_accepted() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.0-flash");
    let response = provider.generate(LlmRequest::new("Test")).await.unwrap();

    assert_eq!(response.content, "ok");
    assert_eq!(response.usage.total_tokens, 0);
    assert_eq!(response.model, "gemini-2.0-flash");
}

#[tokio::test]
async fn test_summarizer_over_remote_provider() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::Regex("Summarize the following news article".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("  The council passed the budget.\n"))
        .expect(1)
        .create_async()
        .await;

    let provider = Arc::new(RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.0-flash"));
    let summarizer = Summarizer::new(provider);

    let summary = summarizer
        .summarize("The city council approved a new budget on Tuesday after a lengthy debate.")
        .await;

    assert_eq!(summary, Ok("The council passed the budget.".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .expect(2)
        .create_async()
        .await;

    let provider = Arc::new(RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.0-flash"));

    let result = provider.generate(LlmRequest::new("Test")).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("429"));

    // Through the summarizer the same failure becomes an inline message
    let summarizer = Summarizer::new(provider);
    let text = summarizer
        .summary_text("The city council approved a new budget on Tuesday after a lengthy debate.")
        .await;
    assert!(text.starts_with("Failed to generate summary due to an AI error:"));
    assert!(text.contains("429"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    // Mock slow response
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.0-flash");

    let request = LlmRequest {
        timeout_seconds: Some(1), // 1 second timeout
        ..LlmRequest::new("Test")
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("timed out"));
}
