//! Fetches a single page and prints its extracted text.

use std::env;

use web_enhanced_llm::scraper::{get_web_content, parse_content};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    if let Some(html) = get_web_content(&url).await? {
        println!("{}", parse_content(&html));
    }

    Ok(())
}
