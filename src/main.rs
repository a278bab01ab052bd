use std::sync::Arc;

use anyhow::Context;

use email_triage::config::AppConfig;
use email_triage::llm::create_provider;
use email_triage::pipeline::dataset::load_examples;
use email_triage::pipeline::{EmailProcessor, EnrichmentClient, TrainedRouter};
use email_triage::web::app_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    eprintln!("📬 Email Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Dataset: {}", config.dataset_path.display());

    // ── Local router ─────────────────────────────────────────────────────
    // Training must succeed before any request is served.
    let router = load_examples(&config.dataset_path)
        .and_then(|examples| TrainedRouter::train(&examples))
        .inspect_err(|e| tracing::error!(error = %e, "Failed to train local router"))
        .context("local router training failed")?;
    let [unproductive, productive] = router.class_counts();
    eprintln!(
        "   Router: {} features ({} productive / {} unproductive examples)",
        router.vocabulary_len(),
        productive,
        unproductive
    );

    // ── Enrichment ───────────────────────────────────────────────────────
    let enrichment = match &config.llm {
        Some(settings) => match create_provider(settings) {
            Ok(llm) => {
                eprintln!("   Model: {} (timeout {:?})", settings.model, settings.timeout);
                EnrichmentClient::new(llm).with_temperature(settings.temperature)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize Gemini client");
                eprintln!("   Model: unavailable ({e})");
                EnrichmentClient::disabled()
            }
        },
        None => {
            tracing::warn!("GEMINI_API_KEY not set, enrichment disabled");
            eprintln!("   Model: disabled (set GEMINI_API_KEY to enable)");
            EnrichmentClient::disabled()
        }
    };

    let processor = EmailProcessor::new(Arc::new(router), enrichment);
    let app = app_routes(processor, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    eprintln!("   API: http://{}/processar\n", config.bind_addr);
    tracing::info!(addr = %config.bind_addr, "Email triage server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
