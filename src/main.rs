use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use web_enhanced_llm::{
    config::Config,
    api::routes::create_router,
    llm::LlamaGenerator,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;

    // Load the model once; every request reads the same handle
    info!(model = %config.model_path.display(), "Loading model");
    let generator = LlamaGenerator::load(&config)?;

    // Create application state
    let app_state = AppState {
        config: Arc::new(config),
        generator: Arc::new(generator),
    };

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    info!(%server_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
