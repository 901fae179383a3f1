use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(about = "Catalog scraper with a filtered product API, plus an OCR endpoint")]
#[command(version)]
pub struct Args {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the catalog once and print the records as JSON
    Scrape {
        /// Also save the records to the product store
        #[arg(long)]
        persist: bool,

        /// Override the page ceiling
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Serve the catalog API
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Serve the OCR API
    Ocr {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },
}
