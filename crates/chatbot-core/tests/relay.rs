use anyhow::Result;
use chatbot_core::{
    OpenAIClient, Product, RelayError, RelayService, Settings, StaticCatalog,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn configured_settings() -> Settings {
    Settings {
        openai_api_key: Some("sk-test".to_string()),
        chatbot_instructions: Some("You are Ada, the shop assistant.".to_string()),
        ..Settings::default()
    }
}

fn service_for(server: &MockServer) -> Result<RelayService> {
    Ok(RelayService::new(OpenAIClient::new(&server.uri())?, None))
}

fn hello_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
    }))
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1, "expected exactly one provider call");
    serde_json::from_slice(&requests[0].body).unwrap()
}

#[tokio::test]
async fn test_successful_reply() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .respond_with(hello_response())
        .expect(1)
        .mount(&server)
        .await;

    let reply = service_for(&server)?
        .relay(
            Some(r#"[{"role":"user","content":"Hi"}]"#),
            &configured_settings(),
        )
        .await
        .expect("relay should succeed");

    assert_eq!(reply.reply, "Hello!");
    Ok(())
}

#[tokio::test]
async fn test_outbound_request_shape() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(hello_response())
        .mount(&server)
        .await;

    let history = r#"[
        {"role":"user","content":"Do you ship abroad?"},
        {"role":"user"},
        {"role":"assistant","content":"Yes, to the EU."},
        {"role":"user","content":"How long?"}
    ]"#;
    service_for(&server)?
        .relay(Some(history), &configured_settings())
        .await
        .expect("relay should succeed");

    let body = sent_body(&server).await;
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 150);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "You are Ada, the shop assistant."},
            {"role": "user", "content": "Do you ship abroad?"},
            {"role": "assistant", "content": "Yes, to the EU."},
            {"role": "user", "content": "How long?"}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_configured_model_and_limit_forwarded() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(hello_response())
        .mount(&server)
        .await;

    let settings = Settings {
        model: Some("gpt-4o".to_string()),
        max_tokens: Some(320),
        ..configured_settings()
    };
    service_for(&server)?
        .relay(Some(r#"[{"role":"user","content":"Hi"}]"#), &settings)
        .await
        .expect("relay should succeed");

    let body = sent_body(&server).await;
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["max_tokens"], 320);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_message_passed_through() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "rate limited"}})),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)?
        .relay(
            Some(r#"[{"role":"user","content":"Hi"}]"#),
            &configured_settings(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, RelayError::ProviderError("rate limited".to_string()));
    assert_eq!(err.to_string(), "rate limited");
    Ok(())
}

#[tokio::test]
async fn test_unrecognised_bodies_give_generic_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let service = service_for(&server)?;
    let history = Some(r#"[{"role":"user","content":"Hi"}]"#);
    for _ in 0..2 {
        let err = service
            .relay(history, &configured_settings())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "An unknown API error occurred.");
    }
    Ok(())
}

#[tokio::test]
async fn test_error_message_survives_malformed_choices() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "choices": [{}],
            "error": {"message": "quota exceeded"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "choices": null,
            "error": {"message": "model overloaded"}
        })))
        .mount(&server)
        .await;

    let service = service_for(&server)?;
    let history = Some(r#"[{"role":"user","content":"Hi"}]"#);

    let first = service
        .relay(history, &configured_settings())
        .await
        .unwrap_err();
    assert_eq!(first, RelayError::ProviderError("quota exceeded".to_string()));

    let second = service
        .relay(history, &configured_settings())
        .await
        .unwrap_err();
    assert_eq!(second, RelayError::ProviderError("model overloaded".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_error_status_with_choices_still_fails() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "choices": [{"message": {"content": "partial"}}]
        })))
        .mount(&server)
        .await;

    let err = service_for(&server)?
        .relay(
            Some(r#"[{"role":"user","content":"Hi"}]"#),
            &configured_settings(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::ProviderError(_)));
    Ok(())
}

#[tokio::test]
async fn test_missing_key_makes_no_call() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(hello_response())
        .expect(0)
        .mount(&server)
        .await;

    let settings = Settings {
        openai_api_key: None,
        ..configured_settings()
    };
    let err = service_for(&server)?
        .relay(Some(r#"[{"role":"user","content":"Hi"}]"#), &settings)
        .await
        .unwrap_err();
    assert_eq!(err, RelayError::NotConfigured);
    Ok(())
}

#[tokio::test]
async fn test_input_failures_make_no_call() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(hello_response())
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server)?;
    let settings = configured_settings();
    assert_eq!(
        service.relay(None, &settings).await,
        Err(RelayError::InvalidInput)
    );
    assert_eq!(
        service.relay(Some("not valid json"), &settings).await,
        Err(RelayError::MalformedJson)
    );
    assert_eq!(
        service.relay(Some("[]"), &settings).await,
        Err(RelayError::EmptyMessage)
    );
    // an empty history wins over a missing key
    assert_eq!(
        service.relay(Some("[]"), &Settings::default()).await,
        Err(RelayError::EmptyMessage)
    );
    Ok(())
}

#[tokio::test]
async fn test_unreachable_provider() -> Result<()> {
    let service = RelayService::new(OpenAIClient::new("http://127.0.0.1:1")?, None);
    let err = service
        .relay(
            Some(r#"[{"role":"user","content":"Hi"}]"#),
            &configured_settings(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, RelayError::ProviderUnreachable);
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_unreachable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(hello_response().set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = OpenAIClient::with_timeout(&server.uri(), Duration::from_millis(50))?;
    let err = RelayService::new(client, None)
        .relay(
            Some(r#"[{"role":"user","content":"Hi"}]"#),
            &configured_settings(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, RelayError::ProviderUnreachable);
    Ok(())
}

#[tokio::test]
async fn test_reply_is_neutralized() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Try <script>alert(1)</script> & see"}}]
        })))
        .mount(&server)
        .await;

    let reply = service_for(&server)?
        .relay(
            Some(r#"[{"role":"user","content":"Hi"}]"#),
            &configured_settings(),
        )
        .await
        .expect("relay should succeed");
    assert_eq!(
        reply.reply,
        "Try &lt;script&gt;alert(1)&lt;/script&gt; &amp; see"
    );
    Ok(())
}

#[tokio::test]
async fn test_reply_quotes_are_escaped() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "See https://x.test/\"onmouseover=\"alert(1)"}}]
        })))
        .mount(&server)
        .await;

    let reply = service_for(&server)?
        .relay(
            Some(r#"[{"role":"user","content":"Hi"}]"#),
            &configured_settings(),
        )
        .await
        .expect("relay should succeed");
    assert!(!reply.reply.contains('"'));
    assert_eq!(
        reply.reply,
        "See https://x.test/&quot;onmouseover=&quot;alert(1)"
    );
    Ok(())
}

#[tokio::test]
async fn test_product_context_reaches_system_message() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(hello_response())
        .mount(&server)
        .await;

    let catalog = StaticCatalog::new(vec![Product {
        url: "https://shop.test/mug".to_string(),
        title: "Enamel Mug".to_string(),
        short_description: "<p>Keeps <em>tea</em> warm.</p>".to_string(),
        published: true,
    }]);
    let service = RelayService::new(
        OpenAIClient::new(&server.uri())?,
        Some(Arc::new(catalog)),
    );
    let settings = Settings {
        enable_products: true,
        important_urls: Some("Returns: https://shop.test/returns".to_string()),
        ..configured_settings()
    };
    service
        .relay(Some(r#"[{"role":"user","content":"Got mugs?"}]"#), &settings)
        .await
        .expect("relay should succeed");

    let body = sent_body(&server).await;
    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    assert!(system.contains("IMPORTANT PAGES:\nReturns: https://shop.test/returns"));
    assert!(system.contains(
        "AVAILABLE PRODUCTS:\nhttps://shop.test/mug - Enamel Mug - Description: Keeps tea warm."
    ));
    assert!(system.ends_with("INSTRUCTIONS:\nYou are Ada, the shop assistant."));
    Ok(())
}
