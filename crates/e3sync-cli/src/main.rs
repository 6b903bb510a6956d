mod catalog;
mod check;
mod import;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "e3sync-cli")]
#[command(about = "Elektro3 to Shopify catalog import")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List one page of distributor products
    Products {
        /// Category code (codigo_categoria)
        #[arg(long)]
        category: Option<String>,
        /// Free-text search
        #[arg(long)]
        query: Option<String>,
        /// Only products with stock > 0
        #[arg(long)]
        in_stock: bool,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Page size (defaults to E3SYNC_PAGE_LIMIT)
        #[arg(long)]
        limit: Option<u32>,
        /// Print the raw page as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List distributor categories
    Categories,
    /// Check upstream authentication and destination store access
    Check,
    /// Import products into the Shopify store
    Import {
        /// JSON file with an array of raw upstream records (or `{"products": [...]}`)
        #[arg(long, conflicts_with = "codes", required_unless_present = "codes")]
        file: Option<PathBuf>,
        /// Upstream product code to fetch and import; repeatable
        #[arg(long = "code")]
        codes: Vec<String>,
        /// Normalize and report without creating anything in the store
        #[arg(long)]
        dry_run: bool,
        /// Destination calls in flight (1-8, defaults to E3SYNC_IMPORT_CONCURRENCY)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=8))]
        concurrency: Option<u8>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = e3sync_core::load_app_config()?;

    // Logs go to stderr so command output can be piped.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Products {
            category,
            query,
            in_stock,
            page,
            limit,
            json,
        } => {
            let filter = e3sync_upstream::ProductFilter {
                category,
                query,
                in_stock,
                code: None,
            };
            let limit = limit.unwrap_or(config.page_limit);
            catalog::run_products(&config, &filter, page, limit, json).await
        }
        Commands::Categories => catalog::run_categories(&config).await,
        Commands::Check => check::run_check(&config).await,
        Commands::Import {
            file,
            codes,
            dry_run,
            concurrency,
        } => {
            let source = match file {
                Some(path) => import::ImportSource::File(path),
                None => import::ImportSource::Codes(codes),
            };
            let concurrency = concurrency.map_or(config.import_concurrency, usize::from);
            import::run_import(&config, source, dry_run, concurrency).await
        }
    }
}

#[cfg(test)]
mod tests;
