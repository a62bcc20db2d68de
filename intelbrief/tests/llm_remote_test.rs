use intelbrief::llm::remote::RemoteLlmProvider;
use intelbrief::llm::{LlmProvider, LlmRequest};

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    // Mock successful OpenAI-compatible response
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "model": "gemini-2.5-flash",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "This is a test response"
                    },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 5,
                    "total_tokens": 15
                }
            }"#,
        )
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.5-flash");

    let request = LlmRequest {
        prompt: "Test prompt".to_string(),
        max_tokens: Some(100),
        temperature: Some(0.7),
        timeout_seconds: Some(10),
    };

    let result = provider.generate(request).await;

    assert!(result.is_ok());
    let response = result.unwrap();
    assert_eq!(response.content, "This is a test response");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gemini-2.5-flash");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_missing_usage_defaults_to_zero() {
    let mut server = mockito::Server::new_async().await;

    // Some endpoints omit the usage block entirely
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "reply"
                    }
                }]
            }"#,
        )
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.5-flash");

    let response = provider
        .generate(LlmRequest {
            prompt: "Test".to_string(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        })
        .await
        .expect("generate");

    assert_eq!(response.content, "reply");
    assert_eq!(response.usage.total_tokens, 0);
    // Falls back to the configured model name when the body omits it
    assert_eq!(response.model, "gemini-2.5-flash");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    // Mock API error
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.5-flash");

    let request = LlmRequest {
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("429"));

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

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.5-flash");

    let request = LlmRequest {
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: Some(1), // 1 second timeout
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("timed out"));
}

#[tokio::test]
async fn test_remote_provider_timeout_covers_body_read() {
    let mut server = mockito::Server::new_async().await;

    // Headers arrive promptly but the body stalls partway through
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            w.write_all(b"{\"choices\":")?;
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"[]}")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gemini-2.5-flash");

    let request = LlmRequest {
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: Some(1),
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("timed out"));
}
