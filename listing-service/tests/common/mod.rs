#![allow(dead_code)]

use listing_service::config::{ListingConfig, OpenAiConfig, StorageConfig};
use listing_service::startup::Application;
use secrecy::Secret;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const TEST_BUCKET: &str = "property-images";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub openai: MockServer,
    pub storage: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the service on a random port, wired to fresh mock completion and
    /// storage servers.
    pub async fn spawn() -> Self {
        let openai = MockServer::start().await;
        let storage = MockServer::start().await;
        let storage_url = storage.uri();
        Self::spawn_with(openai, storage, storage_url).await
    }

    /// Like `spawn`, but the storage client points at `storage_url` instead of
    /// the mock server.
    pub async fn spawn_with(openai: MockServer, storage: MockServer, storage_url: String) -> Self {
        let config = test_config(&format!("{}/v1", openai.uri()), &storage_url);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            openai,
            storage,
            client,
        }
    }

    pub async fn post_generate(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/generate", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_asset(&self, query: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/api/storage{}", self.address, query))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn openai_requests(&self) -> Vec<Request> {
        self.openai.received_requests().await.unwrap_or_default()
    }

    pub async fn storage_requests(&self) -> Vec<Request> {
        self.storage.received_requests().await.unwrap_or_default()
    }
}

pub fn test_config(openai_base_url: &str, storage_url: &str) -> ListingConfig {
    ListingConfig {
        common: service_core::config::Config {
            port: 0,
            ..Default::default()
        },
        openai: OpenAiConfig {
            api_key: Secret::new("test-openai-key".to_string()),
            base_url: openai_base_url.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 500,
            timeout_secs: 5,
        },
        storage: StorageConfig {
            url: storage_url.to_string(),
            service_key: Secret::new("test-service-key".to_string()),
            default_bucket: TEST_BUCKET.to_string(),
            signed_url_ttl_secs: 3600,
            timeout_secs: 5,
        },
    }
}

/// OpenAI-style completion body.
pub fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200 }
    })
}

/// Replies with the given templates in order, repeating the last one.
pub struct Sequence {
    responses: Vec<ResponseTemplate>,
    next: AtomicUsize,
}

impl Sequence {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            next: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let last = self.responses.len() - 1;
        self.responses[index.min(last)].clone()
    }
}
