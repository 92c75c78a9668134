//! Loads the trip catalog, hydrates the default trip and prints its price.

use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trip_pricing::pricing::format_price;
use trip_pricing::{Config, TripSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trip_pricing=info")),
        )
        .init();

    let config = Config::from_env();
    info!("Loading catalog from {}", config.catalog.catalog_url());

    let session = TripSession::new(&config)?;
    let catalog = session.load_catalog().await.context("loading trip catalog")?;
    info!("Trip '{}' loaded", catalog.trip.name);

    while !session.engine().is_settled() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let state = session.price_state();
    if let Some(error) = &state.error {
        tracing::warn!("Price calculation error: {}", error);
    }
    println!("{}", serde_json::to_string_pretty(&*state.breakdown)?);
    info!("Total: {}", format_price(state.breakdown.total()));

    session.dispose();
    Ok(())
}
