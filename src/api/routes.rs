use axum::{
    routing::post,
    Router,
    extract::{Json, State},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::Result;
use crate::api::models::{GenerateRequest, GenerateResponse};
use crate::llm::MAX_GENERATION_TOKENS;
use crate::scraper::get_web_content;
use crate::AppState;

const WEB_CONTENT_HEADER: &str = "\n\nExtracted web content:\n";
const MAX_WEB_CONTENT_CHARS: usize = 1000;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    info!(prompt_len = req.prompt.len(), "Processing generation request");

    let prompt = resolve_prompt(&req.prompt).await?;
    let response = state.generator.generate(&prompt, MAX_GENERATION_TOKENS)?;

    Ok(Json(GenerateResponse { response }))
}

/// Expands the prompt with fetched page content when it names a URL.
///
/// The page body goes in exactly as fetched; markup is not stripped on this
/// path (`parse_content` serves the standalone extractor binary only). A
/// fetch that yields no content leaves the prompt untouched.
async fn resolve_prompt(prompt: &str) -> Result<String> {
    let Some(url) = url_candidate(prompt) else {
        return Ok(prompt.to_string());
    };

    debug!(url, "Prompt references a URL, fetching page");
    match get_web_content(url).await? {
        Some(content) if !content.is_empty() => Ok(augment_prompt(prompt, &content)),
        _ => {
            debug!(url, "No content fetched, using prompt as-is");
            Ok(prompt.to_string())
        }
    }
}

/// The last whitespace-delimited token is the URL candidate whenever the
/// prompt mentions "http" anywhere. No well-formedness check.
fn url_candidate(prompt: &str) -> Option<&str> {
    if !prompt.contains("http") {
        return None;
    }
    prompt.split_whitespace().last()
}

fn augment_prompt(prompt: &str, content: &str) -> String {
    let mut augmented =
        String::with_capacity(prompt.len() + WEB_CONTENT_HEADER.len() + MAX_WEB_CONTENT_CHARS);
    augmented.push_str(prompt);
    augmented.push_str(WEB_CONTENT_HEADER);
    // Character cap, so a multi-byte character is never split.
    augmented.extend(content.chars().take(MAX_WEB_CONTENT_CHARS));
    augmented
}
