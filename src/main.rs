use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use memezy::config::Args;
use memezy::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env first so clap sees the keys
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("memezy=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    // bad upstream URLs stop the server here, not on the first request
    let chat = args.chat_settings()?;
    let caption = args.caption_settings()?;

    if chat.api_key.is_none() {
        warn!("AZURE_OPENAI_API_KEY is not set, /api/chat will fail");
    }
    if caption.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set, /api/generate-caption will fail");
    }

    info!(url = %chat.completions_url, model = %chat.model, "chat upstream");
    info!(url = %caption.generate_url, model = %caption.model, "caption upstream");

    let state = Arc::new(AppState::new(reqwest::Client::new(), chat, caption));
    let app = memezy::app(state, args.body_limit());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("memezy running on http://localhost:{}", args.port);
    axum::serve(listener, app).await?;
    Ok(())
}
