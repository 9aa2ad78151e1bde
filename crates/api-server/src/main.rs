//! API server binary entry point

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adlens_api_server::{start_server, ApiState};
use adlens_orchestrator::Pipeline;
use adlens_providers::{ClaudeCopyGenerator, GeminiAnalyzer};
use adlens_staging::{MediaStager, StagingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adlens_api_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Provider credentials are required up front; the server never starts
    // half-configured
    let gemini_key = std::env::var("GEMINI_API_KEY").map_err(|_| "GEMINI_API_KEY is not set")?;
    let anthropic_key =
        std::env::var("ANTHROPIC_API_KEY").map_err(|_| "ANTHROPIC_API_KEY is not set")?;

    let mut analyzer = GeminiAnalyzer::new(gemini_key)?;
    if let Ok(model) = std::env::var("GEMINI_MODEL") {
        analyzer = analyzer.with_model(model);
    }

    let mut copywriter = ClaudeCopyGenerator::new(anthropic_key)?;
    if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
        copywriter = copywriter.with_model(model);
    }

    let pipeline = Pipeline::new(
        MediaStager::new(StagingConfig::default()),
        Arc::new(analyzer),
        Arc::new(copywriter),
    );

    // Get bind address from environment or use default
    let addr = std::env::var("ADLENS_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    tracing::info!("Starting adlens media analysis server");
    start_server(&addr, ApiState::new(pipeline)).await?;

    Ok(())
}
