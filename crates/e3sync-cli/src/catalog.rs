//! Read-only catalog commands.

use e3sync_core::{AppConfig, UNIDENTIFIED_CODE};
use e3sync_upstream::{normalize_product, Elektro3Client, ProductFilter, ProductPage};

pub(crate) async fn run_products(
    config: &AppConfig,
    filter: &ProductFilter,
    page: u32,
    limit: u32,
    json: bool,
) -> anyhow::Result<()> {
    let client = Elektro3Client::from_config(config)?;
    let listing = client.fetch_products(filter, page, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print_product_table(&listing);
    }
    Ok(())
}

fn print_product_table(listing: &ProductPage) {
    if listing.items.is_empty() {
        println!("no products found");
        return;
    }
    println!("{:<14} {:>10} {:>7}  TITLE", "CODE", "PRICE", "STOCK");
    for raw in &listing.items {
        match normalize_product(raw) {
            Ok(p) => println!(
                "{:<14} {:>10} {:>7}  {}",
                p.code, p.price, p.stock_quantity, p.title
            ),
            Err(e) => println!("{UNIDENTIFIED_CODE:<14} {:>10} {:>7}  ({e})", "-", "-"),
        }
    }
    println!(
        "page {}/{} ({} products)",
        listing.current_page, listing.total_pages, listing.total_count
    );
}

pub(crate) async fn run_categories(config: &AppConfig) -> anyhow::Result<()> {
    let client = Elektro3Client::from_config(config)?;
    let categories = client.fetch_categories().await?;

    if categories.is_empty() {
        println!("no categories found");
        return Ok(());
    }
    for category in &categories {
        println!(
            "{:<10} {}",
            category.code().unwrap_or_else(|| "-".to_owned()),
            category.name().unwrap_or_default()
        );
    }
    Ok(())
}
