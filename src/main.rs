//! main.rs - Demo entry point for the KLAYswap router
//!
//! Routes a few swaps across the bundled sample pools and prints the best
//! path, expected output and slippage-protected minimum for each, followed
//! by the derived token prices.

use klayswap_router::feed::{SAMPLE_KDAI, SAMPLE_KETH, SAMPLE_KSP, SAMPLE_KUSDT};
use klayswap_router::{
    DecimalCache, MockPoolFeed, RouteSelector, RouterConfig, TokenAddress, NAME, VERSION,
};
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Environment variable naming an optional TOML config file
const CONFIG_ENV: &str = "KLAYSWAP_ROUTER_CONFIG";

/// One whole token in 18-decimal internal units
const ONE_TOKEN: u64 = 1_000_000_000_000_000_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    info!("Starting {} v{}", NAME, VERSION);

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            info!("Loading config from {}", path);
            RouterConfig::load(&path)?
        }
        Err(_) => RouterConfig::default(),
    };
    info!("Fee rate {}, slippage defaults {:?}", config.fee_rate, config.slippage);

    let feed = Arc::new(MockPoolFeed::sample());
    let selector = RouteSelector::new(config, feed, Arc::new(DecimalCache::new()))?;

    let klay = TokenAddress::native();
    let ksp = TokenAddress::parse(SAMPLE_KSP)?;
    let kusdt = TokenAddress::parse(SAMPLE_KUSDT)?;
    let keth = TokenAddress::parse(SAMPLE_KETH)?;
    let kdai = TokenAddress::parse(SAMPLE_KDAI)?;

    let amount = Decimal::from(ONE_TOKEN) * Decimal::from(100);
    let pairs = [(&klay, &kusdt), (&ksp, &kdai), (&keth, &ksp), (&kdai, &klay)];

    println!();
    for (from, to) in pairs {
        match selector.quote(from, amount, to, None).await {
            Ok(route) => {
                println!("{}", route.format_path());
                println!("    out {} (min {}), best of {} paths", route.amount_out, route.min_amount_out, route.path_count);
            }
            Err(e) => error!("✗ Quote {} -> {} failed: {}", from, to, e),
        }

        match selector.plan_swap(from, amount, to, None).await {
            Ok(plan) => println!("    swap plan: {}", serde_json::to_string(&plan)?),
            Err(e) => warn!("Swap plan {} -> {} failed: {}", from, to, e),
        }
    }

    println!();
    match selector.token_prices(&[klay, ksp, kusdt, keth, kdai]).await {
        Ok(prices) => {
            for price in prices {
                println!("{:44} {:>14.6} KLAY  ${:>12.4}", price.token.to_string(), price.native_amount, price.price);
            }
        }
        Err(e) => error!("✗ Token prices failed: {}", e),
    }
    println!();

    Ok(())
}
