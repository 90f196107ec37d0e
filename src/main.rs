use std::env;
use std::sync::Arc;

use storefront_catalog::{
    AppConfig, CatalogSession, HttpProductRepository, LoadOutcome, load_config,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: AppConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let repository = match HttpProductRepository::new(&config) {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };
    let session = CatalogSession::new(repository, &config);

    info!("Loading catalog from {}...", config.api_base_url);
    let mut outcome = session.load().await;
    loop {
        match outcome {
            LoadOutcome::Loaded(_) => break,
            LoadOutcome::Stale => outcome = session.retry().await,
            LoadOutcome::Unavailable(e) => {
                if !session.availability().is_down {
                    error!("Catalog unavailable: {}", e);
                    return;
                }
                warn!(
                    "Backend unavailable ({}), retrying in {}s...",
                    e,
                    session.availability().seconds_remaining
                );
                outcome = session.retry_when_available().await;
            }
        }
    }

    let state = session.query_state().await;
    info!("Categories: {}", state.categories.join(", "));
    info!("Price ceiling: {:.2}", state.price_ceiling);
    info!(
        "Page {}/{} ({} matches)",
        state.current_page, state.total_pages, state.total_matches
    );
    for product in &state.visible_products {
        let stock_note = if product.is_sold_out() {
            " | sold out"
        } else if product.is_low_stock(config.low_stock_threshold) {
            " | low stock"
        } else {
            ""
        };
        info!(
            "{} | {:.2} (-{}%) | rating {}{}",
            product.name,
            product.price_after_discount,
            product.discount_percent(),
            product.rating_label(),
            stock_note
        );
    }
}
