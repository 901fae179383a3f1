use anyhow::Context;
use catalog_harvest::service::{self, catalog_router, ocr_router};
use catalog_harvest::{AppConfig, CatalogScraper};
use clap::Parser;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    }
    .apply_env();

    match args.command {
        Command::Scrape { persist, max_pages } => scrape(&config, persist, max_pages).await,
        Command::Serve { bind } => {
            let state = catalog_harvest::catalog_state(&config)
                .map_err(|e| anyhow::anyhow!(e))
                .context("building the catalog service")?;
            let addr = bind.unwrap_or_else(|| config.server.catalog_bind.clone());
            service::serve(&addr, catalog_router(state)).await?;
            Ok(())
        }
        Command::Ocr { bind } => {
            let addr = bind.unwrap_or_else(|| config.server.ocr_bind.clone());
            service::serve(&addr, ocr_router(catalog_harvest::ocr_state(&config))).await?;
            Ok(())
        }
    }
}

/// One-off scrape printing the records to stdout
async fn scrape(config: &AppConfig, persist: bool, max_pages: Option<usize>) -> anyhow::Result<()> {
    let mut scraper = CatalogScraper::new(config.scraper.clone())
        .map_err(|e| anyhow::anyhow!(e))
        .context("building the scraper")?;
    if let Some(max_pages) = max_pages {
        scraper = scraper.with_max_pages(max_pages);
    }

    let start_time = std::time::Instant::now();
    let outcome = scraper.run_with_outcome().await;
    ::log::info!(
        "Scraped {} products from {} pages in {:.2} seconds ({:?})",
        outcome.records.len(),
        outcome.pages_fetched,
        start_time.elapsed().as_secs_f64(),
        outcome.stop
    );

    if persist {
        let store = catalog_harvest::product_store(config)?;
        let report = store.insert_batch(&outcome.records).await;
        eprintln!(
            "total scraped: {}, new: {}, duplicates skipped: {}",
            report.total,
            report.inserted,
            report.skipped()
        );
    }

    println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    Ok(())
}
