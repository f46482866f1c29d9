//! Interactive terminal client for the dual-backend store.

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use storectl::{InsertRouter, Menu, StoreClient, StoreConfig};

fn init_logging() {
    let filter = EnvFilter::try_from_env("STORECTL_LOG")
        .unwrap_or_else(|_| EnvFilter::new("storectl=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    run().await
}

async fn run() -> Result<()> {
    let config = StoreConfig::load()?;

    let mut client = StoreClient::new(config.entities.clone());
    let failures = client.connect(&config).await?;
    for failure in &failures {
        warn!("{failure}");
        eprintln!("Warning: {failure}");
    }

    if client.relational().is_some() {
        println!("Connected to PostgreSQL {}.", config.relational.database);
    }
    if client.document().is_some() {
        println!("Connected to MongoDB {}.", config.document.database);
    }

    let router = InsertRouter::new(config.routing.initial_target());
    let outcome = match Menu::new(&client, &router) {
        Ok(mut menu) => menu.run().await,
        Err(e) => Err(e),
    };

    client.shutdown().await;
    outcome
}
