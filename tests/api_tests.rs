//! End-to-end tests for the /generate endpoint, with the generation backend
//! replaced by a recording stub and page content served in-process.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{http::StatusCode, routing::get, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use web_enhanced_llm::api::routes::create_router;
use web_enhanced_llm::config::Config;
use web_enhanced_llm::error::Result;
use web_enhanced_llm::llm::TextGenerator;
use web_enhanced_llm::AppState;

/// Records every prompt it is asked to generate from.
#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn recorded(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for RecordingGenerator {
    fn generate(&self, prompt: &str, _max_tokens: usize) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("generated text".to_string())
    }
}

fn test_config() -> Config {
    Config {
        server_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        model_path: PathBuf::from("unused.gguf"),
        context_size: 4096,
        gpu_layers: 0,
        batch_size: 2048,
    }
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Starts the service with a recording backend; returns its base URL and the
/// backend handle for inspection.
async fn spawn_app() -> (String, Arc<RecordingGenerator>) {
    let generator = Arc::new(RecordingGenerator::default());
    let state = AppState {
        config: Arc::new(test_config()),
        generator: generator.clone(),
    };
    let base = spawn(create_router(state)).await;
    (base, generator)
}

async fn post_generate(base: &str, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/generate", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let body: Value = response.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn prompt_without_url_is_passed_through_unmodified() {
    let (base, generator) = spawn_app().await;

    let (status, body) =
        post_generate(&base, json!({"prompt": "Tell me a story about a fox"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "generated text"}));
    assert_eq!(generator.recorded(), vec!["Tell me a story about a fox"]);
}

#[tokio::test]
async fn missing_prompt_defaults_to_empty_string() {
    let (base, generator) = spawn_app().await;

    let (status, body) = post_generate(&base, json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "generated text");
    assert_eq!(generator.recorded(), vec![""]);
}

#[tokio::test]
async fn prompt_ending_in_url_is_augmented_with_page_body() {
    let (base, generator) = spawn_app().await;
    let content_base = spawn(Router::new().route(
        "/",
        get(|| async { "<html><body>Example Domain</body></html>" }),
    ))
    .await;

    let prompt = format!("Summarize {}/", content_base);
    let (status, body) = post_generate(&base, json!({"prompt": prompt})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "generated text"}));
    assert_eq!(
        generator.recorded(),
        vec![format!(
            "{}\n\nExtracted web content:\n<html><body>Example Domain</body></html>",
            prompt
        )]
    );
}

#[tokio::test]
async fn fetched_content_is_capped_at_1000_characters() {
    let (base, generator) = spawn_app().await;
    let served: String = "a".repeat(1500);
    let content_base = spawn(Router::new().route(
        "/",
        get(move || {
            let body = served.clone();
            async move { body }
        }),
    ))
    .await;

    let prompt = format!("Summarize {}/", content_base);
    let (status, _) = post_generate(&base, json!({"prompt": prompt})).await;

    assert_eq!(status, StatusCode::OK);
    let recorded = generator.recorded();
    assert_eq!(
        recorded[0],
        format!("{}\n\nExtracted web content:\n{}", prompt, "a".repeat(1000))
    );
}

#[tokio::test]
async fn non_200_fetch_leaves_prompt_unmodified() {
    let (base, generator) = spawn_app().await;
    let content_base = spawn(Router::new().route(
        "/",
        get(|| async { (StatusCode::NOT_FOUND, "not here") }),
    ))
    .await;

    let prompt = format!("Summarize {}/", content_base);
    let (status, body) = post_generate(&base, json!({"prompt": prompt})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "generated text"}));
    assert_eq!(generator.recorded(), vec![prompt]);
}

#[tokio::test]
async fn empty_fetched_body_leaves_prompt_unmodified() {
    let (base, generator) = spawn_app().await;
    let content_base = spawn(Router::new().route("/", get(|| async { "" }))).await;

    let prompt = format!("Summarize {}/", content_base);
    let (status, _) = post_generate(&base, json!({"prompt": prompt})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(generator.recorded(), vec![prompt]);
}

#[tokio::test]
async fn unreachable_url_yields_error_response() {
    let (base, generator) = spawn_app().await;

    // Bind and drop a listener so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let prompt = format!("Summarize http://{}/", addr);
    let (status, body) = post_generate(&base, json!({"prompt": prompt})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
    assert!(generator.recorded().is_empty());
}
