//! A day at the shop: dispatches inventory actions, updates the owner's
//! profile, and fetches the user directory through the async lifecycle.
//!
//! Run with `RUST_LOG=info cargo run -p shop` to watch the logging
//! middleware record each before/after transition.

use std::sync::Arc;
use std::time::Duration;

use shop::user::HttpUserDirectory;
use shop::{fetch_users, order_cake, order_ice_cream, restock_cake, shop_store, update_street};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,uniflow_runtime=info,shop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let store = shop_store()?;

    let watched = store.clone();
    let subscription = store.subscribe(move || {
        tracing::info!(state = %watched.snapshot().to_json(), "store updated");
    });

    // Morning rush.
    store.dispatch(order_cake(None))?;
    store.dispatch(order_cake(None))?;
    store.dispatch(order_cake(Some(3)))?;
    store.dispatch(order_ice_cream(Some(2)))?;

    // Afternoon delivery.
    store.dispatch(restock_cake(Some(5)))?;

    // The owner moves across town.
    store.dispatch(update_street("456 Elm St"))?;

    // Kick off the directory fetch and give the resolution time to land.
    let directory = Arc::new(HttpUserDirectory::new(
        "https://jsonplaceholder.typicode.com",
    ));
    store.dispatch(fetch_users(directory))?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    subscription.unsubscribe();
    tracing::info!(state = %store.snapshot().to_json(), "closing time");
    Ok(())
}
