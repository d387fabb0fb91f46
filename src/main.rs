use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use discourse_kb_scraper::config::Config;
use discourse_kb_scraper::fetcher::HttpFetcher;
use discourse_kb_scraper::output::OutputWriter;
use discourse_kb_scraper::scrape;
use discourse_kb_scraper::session::{BrowserLogin, SessionManager};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting discourse-kb-scraper");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        base_url = %config.base_url,
        category = %config.category_slug,
        category_id = config.category_id,
        from = %config.date_range.from,
        to = %config.date_range.to,
        output_dir = %config.output_dir.display(),
        "Configuration loaded"
    );

    let authenticator = BrowserLogin::from_config(&config);
    let sessions = SessionManager::new(&config, &authenticator);
    let session = sessions
        .ensure_session()
        .await
        .context("Failed to establish an authenticated session")?;

    let fetcher = HttpFetcher::new(&session, config.request_timeout)?;
    let writer = OutputWriter::create(&config.output_dir)
        .await
        .context("Failed to prepare output directory")?;

    scrape::run(&config, &fetcher, &writer).await?;

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,discourse_kb_scraper=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
