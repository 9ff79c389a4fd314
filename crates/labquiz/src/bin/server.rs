//! labquiz server binary
//!
//! Run with: cargo run -p labquiz --bin labquiz-server

use labquiz::{config::AppConfig, server::Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labquiz=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                        labquiz                            ║
║        Question Generation for Lab Documents              ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration (defaults + LABQUIZ_CONFIG file + env overrides)
    let config = AppConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Generation model: {}", config.llm.model);
    tracing::info!("  - Generation endpoint: {}", config.llm.base_url);
    tracing::info!("  - Data directory: {}", config.storage.data_dir.display());
    tracing::info!("  - Max upload size: {} bytes", config.server.max_upload_size);

    if config.llm.api_key.is_none() {
        tracing::warn!("No API key configured, set LABQUIZ_API_KEY for the generation service");
    }

    // Probe the generation service
    tracing::info!("Checking generation service at {}...", config.llm.base_url);
    let client = reqwest::Client::new();
    let mut probe = client.get(format!("{}/models", config.llm.base_url));
    if let Some(key) = &config.llm.api_key {
        probe = probe.bearer_auth(key);
    }
    match probe.send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Generation service is reachable");
        }
        _ => {
            tracing::warn!("Generation service not reachable at {}", config.llm.base_url);
            tracing::warn!("Uploads will work, but generation jobs will fail until it is.");
            tracing::warn!("  - Check LABQUIZ_BASE_URL and LABQUIZ_API_KEY");
        }
    }

    // Create and start server
    let server = Server::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}/api", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/documents - Upload a document");
    println!("  POST /api/generate  - Generate questions");
    println!("  GET  /api/jobs/:id  - Poll job progress");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
