use e3sync_core::AppConfig;
use e3sync_shopify::ShopifyAdminClient;
use e3sync_upstream::Elektro3Client;

/// Verifies both sides independently and fails if either is unreachable.
pub(crate) async fn run_check(config: &AppConfig) -> anyhow::Result<()> {
    let mut failures = 0usize;

    match Elektro3Client::from_config(config) {
        Ok(client) => match client.authenticate().await {
            Ok(_) => println!("upstream     ok ({})", client.base_url()),
            Err(e) => {
                failures += 1;
                println!("upstream     FAILED: {e}");
            }
        },
        Err(e) => {
            failures += 1;
            println!("upstream     FAILED: {e}");
        }
    }

    match ShopifyAdminClient::from_config(config) {
        Ok(client) => match client.query_shop_metadata().await {
            Ok(shop) => println!(
                "destination  ok ({} / {}, plan {}, {} mode)",
                shop.name,
                shop.domain,
                shop.plan,
                client.mode()
            ),
            Err(e) => {
                failures += 1;
                println!("destination  FAILED: {e}");
            }
        },
        Err(e) => {
            failures += 1;
            println!("destination  FAILED: {e}");
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} connection check(s) failed");
    }
    Ok(())
}
