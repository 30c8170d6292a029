use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod config;
mod dispatch;
mod models;
mod pipeline;
mod provider;
mod scheduler;
mod server;

use config::Config;
use dispatch::{render_digest, DispatchSink, LogSink, TelegramSink};
use pipeline::{scorer_for, Pipeline};
use provider::{ApiFootball, FixtureProvider};
use scheduler::{spawn_daily_digest, DigestJob};
use server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let api_key = config
        .api_football_key
        .as_deref()
        .context("API_FOOTBALL_KEY is required")?;
    let provider: Arc<dyn FixtureProvider> = Arc::new(ApiFootball::new(
        &config.api_football_url,
        api_key,
        config.rate_limit(),
        config.request_timeout(),
    )?);

    let scorer = scorer_for(config.strategy, config.thresholds());
    let pipeline = Arc::new(Pipeline::new(
        Arc::clone(&provider),
        scorer,
        config.pipeline_settings(),
    ));
    info!(
        "Scanning {} day(s) via {} with {:?} strategy (≤{} req/min)",
        config.days,
        provider.name(),
        config.strategy,
        config.requests_per_minute
    );

    // One-shot mode: print the digest and exit
    if config.once {
        let today = Utc::now().date_naive();
        let report = pipeline
            .scan(today, config.days, Some(config.query_limit))
            .await;
        println!("{}", render_digest(&report));
        return Ok(());
    }

    // Digest sink: Telegram when configured, otherwise the log
    let (sink, destinations): (Arc<dyn DispatchSink>, Vec<String>) =
        match config.telegram_bot_token.as_deref() {
            Some(token) => (
                Arc::new(TelegramSink::new(
                    &config.telegram_api_url,
                    token,
                    config.request_timeout(),
                )?),
                config.telegram_chat_ids.clone(),
            ),
            None => (Arc::new(LogSink), vec!["log".to_string()]),
        };

    if config.no_digest {
        info!("Scheduled digest disabled");
    } else {
        info!(
            "Daily digest at {} UTC via {} to {} destination(s)",
            config.digest_time.format("%H:%M"),
            sink.name(),
            destinations.len()
        );
        spawn_daily_digest(
            Arc::clone(&pipeline),
            DigestJob {
                sink,
                destinations,
                cap: Some(config.digest_limit),
            },
            config.digest_time,
        );
    }

    // Liveness probe + interactive query endpoint
    let app = server::router(AppState {
        pipeline,
        query_cap: config.query_limit,
    });
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run HTTP server (blocks until shutdown)
    axum::serve(listener, app).await?;

    Ok(())
}
