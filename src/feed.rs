//! feed.rs - Collaborators that supply pools, reserves, decimals and prices
//!
//! The router never talks to the chain itself. Pool lists and the native
//! token price come from the KLAYswap stat endpoints over HTTP; reserves and
//! decimals are contract reads owned by the caller's chain client, which
//! plugs in through the traits below.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::models::{parse_amount, PoolReserves, TokenAddress};

/// Token addresses used by `MockPoolFeed::sample`
pub const SAMPLE_KSP: &str = "0xC6a2Ad8cC6e4A7E08FC37cC5954be07d499E7654";
pub const SAMPLE_KUSDT: &str = "0xceE8FAF64bB97a73bb51E115Aa89C17FfA8dD167";
pub const SAMPLE_KETH: &str = "0x34d21b1e550D73cee41151c77F3c73359527a396";
pub const SAMPLE_KDAI: &str = "0x5c74070FDeA071359b86082bd9f9b3dEaafbe32b";

/// Source of the tracked pool addresses
#[async_trait]
pub trait PoolListProvider: Send + Sync {
    async fn pool_list(&self) -> Result<Vec<String>>;
}

/// Source of per-pool token pairs and reserves
#[async_trait]
pub trait PoolReserveProvider: Send + Sync {
    async fn pool_reserves(&self, pools: &[String]) -> Result<Vec<PoolReserves>>;
}

/// Source of a token's native decimal precision
#[async_trait]
pub trait DecimalsProvider: Send + Sync {
    async fn decimals(&self, token: &TokenAddress) -> Result<u8>;
}

/// Fiat price of the native token
#[async_trait]
pub trait NativePriceProvider: Send + Sync {
    async fn native_price(&self) -> Result<f64>;
}

// ============================================================================
// Pool status decoding
// ============================================================================

/// Column-wise `poolStatus(address[])` result: one entry per requested pool
/// in each column. The fifth column is not used for routing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolStatusColumns {
    pub token_a: Vec<String>,
    pub token_b: Vec<String>,
    pub reserve_a: Vec<String>,
    pub reserve_b: Vec<String>,
    #[serde(default)]
    pub extra: Vec<String>,
}

impl PoolStatusColumns {
    /// Zip the columns back into per-pool snapshots, in `pools` order
    pub fn into_reserves(self, pools: &[String]) -> Result<Vec<PoolReserves>> {
        let columns = [
            self.token_a.len(),
            self.token_b.len(),
            self.reserve_a.len(),
            self.reserve_b.len(),
        ];
        if columns.iter().any(|&len| len != pools.len()) {
            return Err(RouterError::Decode(format!(
                "pool status has column lengths {:?} for {} pools",
                columns,
                pools.len()
            )));
        }

        let mut reserves = Vec::with_capacity(pools.len());
        for (i, pool) in pools.iter().enumerate() {
            let token_a = TokenAddress::parse(&self.token_a[i])
                .map_err(|e| RouterError::Decode(e.to_string()))?;
            let token_b = TokenAddress::parse(&self.token_b[i])
                .map_err(|e| RouterError::Decode(e.to_string()))?;

            let amounts = parse_amount(&self.reserve_a[i])
                .and_then(|a| parse_amount(&self.reserve_b[i]).map(|b| (a, b)));
            let (reserve_a, reserve_b) = match amounts {
                Ok(amounts) => amounts,
                Err(RouterError::AmountOverflow) => {
                    warn!("Skipping pool {}: reserves {} / {} exceed the supported range",
                        pool, self.reserve_a[i], self.reserve_b[i]);
                    continue;
                }
                Err(e) => return Err(e),
            };

            reserves.push(PoolReserves::new(pool, token_a, token_b, reserve_a, reserve_b));
        }
        Ok(reserves)
    }
}

// ============================================================================
// KLAYswap stat API response structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct PoolListResponse {
    data: Vec<PoolStat>,
}

#[derive(Debug, Deserialize)]
struct PoolStat {
    exchange: String,
}

/// The price endpoint answers with a bare number, sometimes quoted
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn into_f64(self) -> Result<f64> {
        match self {
            PriceValue::Number(price) => Ok(price),
            PriceValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|e| RouterError::Decode(format!("native price `{}`: {}", text, e))),
        }
    }
}

// ============================================================================
// KlayswapStatFeed - HTTP pool list and native price
// ============================================================================

/// Reads the pool list and native price from the KLAYswap stat endpoints
#[derive(Debug, Clone)]
pub struct KlayswapStatFeed {
    client: Client,
    pool_list_url: String,
    native_price_url: String,
}

impl KlayswapStatFeed {
    pub fn new(config: &RouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(KlayswapStatFeed {
            client,
            pool_list_url: config.pool_list_url.clone(),
            native_price_url: config.native_price_url.clone(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!("Fetching from: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("{} returned status {}", url, status);
            return Err(RouterError::UpstreamFetch {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl PoolListProvider for KlayswapStatFeed {
    async fn pool_list(&self) -> Result<Vec<String>> {
        let response = self.get(&self.pool_list_url).await?;
        let body: PoolListResponse = response
            .json()
            .await
            .map_err(|e| RouterError::Decode(format!("pool list: {}", e)))?;

        let pools: Vec<String> = body.data.into_iter().map(|stat| stat.exchange).collect();
        info!("Pool list fetched: {} pools", pools.len());
        Ok(pools)
    }
}

#[async_trait]
impl NativePriceProvider for KlayswapStatFeed {
    async fn native_price(&self) -> Result<f64> {
        let response = self.get(&self.native_price_url).await?;
        let value: PriceValue = response
            .json()
            .await
            .map_err(|e| RouterError::Decode(format!("native price: {}", e)))?;

        value.into_f64()
    }
}

// ============================================================================
// MockPoolFeed - In-memory collaborators for tests and the demo
// ============================================================================

/// In-memory pools, decimals and price
#[derive(Debug, Default)]
pub struct MockPoolFeed {
    pools: Vec<PoolReserves>,
    decimals: HashMap<TokenAddress, u8>,
    native_price: f64,
    pool_list_failure: Option<(u16, String)>,
    decimals_lookups: AtomicUsize,
}

impl MockPoolFeed {
    pub fn new() -> Self {
        MockPoolFeed {
            native_price: 1.0,
            ..Default::default()
        }
    }

    pub fn with_pool(mut self, pool: PoolReserves) -> Self {
        self.pools.push(pool);
        self
    }

    pub fn with_decimals(mut self, token: TokenAddress, decimals: u8) -> Self {
        self.decimals.insert(token, decimals);
        self
    }

    pub fn with_native_price(mut self, price: f64) -> Self {
        self.native_price = price;
        self
    }

    /// Make `pool_list` fail with the given HTTP status
    pub fn with_pool_list_failure(mut self, status: u16, message: &str) -> Self {
        self.pool_list_failure = Some((status, message.to_string()));
        self
    }

    /// How many times `decimals` has been asked
    pub fn decimals_lookups(&self) -> usize {
        self.decimals_lookups.load(Ordering::SeqCst)
    }

    /// A small KLAYswap-like network: KLAY, KSP, KUSDT (6 decimals), KETH, KDAI.
    ///
    /// Amounts are in 18-decimal internal units.
    pub fn sample() -> Self {
        let unit = Decimal::from(1_000_000_000_000_000_000u64);
        let token = |address: &str| TokenAddress::parse(address).ok();

        let klay = TokenAddress::native();
        let (ksp, kusdt, keth, kdai) = match (
            token(SAMPLE_KSP),
            token(SAMPLE_KUSDT),
            token(SAMPLE_KETH),
            token(SAMPLE_KDAI),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => return MockPoolFeed::new(),
        };

        let reserves = |pool: &str, a: &TokenAddress, b: &TokenAddress, ra: u64, rb: u64| {
            PoolReserves::new(pool, a.clone(), b.clone(), Decimal::from(ra) * unit, Decimal::from(rb) * unit)
        };

        MockPoolFeed::new()
            .with_pool(reserves("0x34cf46c21539e03deb26e4fa406618650766f3b9", &klay, &ksp, 4_000_000, 1_000_000))
            .with_pool(reserves("0xd83f1b074d81869eff2c46c530d7308ffec18036", &klay, &kusdt, 9_000_000, 1_800_000))
            .with_pool(reserves("0xe75a6a3a800a2c5123e67e3bde911ba761fe0705", &ksp, &kusdt, 500_000, 510_000))
            .with_pool(reserves("0x27f80731dddb90c51cd934e9bd54bff2d4e99e8a", &klay, &keth, 3_000_000, 300))
            .with_pool(reserves("0x029e2a1b2bb91b66bd25027e1c211e5628dbcb93", &keth, &kusdt, 120, 240_000))
            .with_pool(reserves("0xa3987cf6c14f1992e8b4a9e23192eb79dc2969b8", &kusdt, &kdai, 800_000, 801_000))
            .with_decimals(ksp, 18)
            .with_decimals(kusdt, 6)
            .with_decimals(keth, 18)
            .with_decimals(kdai, 18)
            .with_native_price(0.21)
    }
}

#[async_trait]
impl PoolListProvider for MockPoolFeed {
    async fn pool_list(&self) -> Result<Vec<String>> {
        if let Some((status, message)) = &self.pool_list_failure {
            return Err(RouterError::UpstreamFetch {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(self.pools.iter().map(|p| p.pool.clone()).collect())
    }
}

#[async_trait]
impl PoolReserveProvider for MockPoolFeed {
    async fn pool_reserves(&self, pools: &[String]) -> Result<Vec<PoolReserves>> {
        pools
            .iter()
            .map(|id| {
                self.pools
                    .iter()
                    .find(|p| p.pool.eq_ignore_ascii_case(id))
                    .cloned()
                    .ok_or_else(|| RouterError::UnknownPool(id.clone()))
            })
            .collect()
    }
}

#[async_trait]
impl DecimalsProvider for MockPoolFeed {
    async fn decimals(&self, token: &TokenAddress) -> Result<u8> {
        self.decimals_lookups.fetch_add(1, Ordering::SeqCst);
        self.decimals
            .get(token)
            .copied()
            .ok_or_else(|| RouterError::Decode(format!("decimals() reverted for {}", token)))
    }
}

#[async_trait]
impl NativePriceProvider for MockPoolFeed {
    async fn native_price(&self) -> Result<f64> {
        Ok(self.native_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools() -> Vec<String> {
        vec!["0xpool1".to_string(), "0xpool2".to_string()]
    }

    #[test]
    fn test_pool_status_columns() {
        let columns: PoolStatusColumns = serde_json::from_str(r#"{
            "token_a": ["0x0000000000000000000000000000000000000000", "0xC6a2Ad8cC6e4A7E08FC37cC5954be07d499E7654"],
            "token_b": ["0xC6a2Ad8cC6e4A7E08FC37cC5954be07d499E7654", "0xceE8FAF64bB97a73bb51E115Aa89C17FfA8dD167"],
            "reserve_a": ["4000000000000000000000000", "10"],
            "reserve_b": ["1000000000000000000000000", "20"],
            "extra": ["1", "2"]
        }"#).unwrap();

        let reserves = columns.into_reserves(&pools()).unwrap();
        assert_eq!(reserves.len(), 2);
        assert_eq!(reserves[0].pool, "0xpool1");
        assert!(reserves[0].token_a.is_native());
        assert_eq!(reserves[1].reserve_b, Decimal::from(20));
    }

    #[test]
    fn test_oversized_reserve_skips_only_that_pool() {
        let columns = PoolStatusColumns {
            token_a: vec![
                "0x0000000000000000000000000000000000000000".to_string(),
                SAMPLE_KSP.to_string(),
            ],
            token_b: vec![SAMPLE_KSP.to_string(), SAMPLE_KUSDT.to_string()],
            reserve_a: vec!["4000000000000000000000000".to_string(), "100000000000000000000000000000".to_string()],
            reserve_b: vec!["1000000000000000000000000".to_string(), "20".to_string()],
            extra: Vec::new(),
        };

        let reserves = columns.into_reserves(&pools()).unwrap();
        assert_eq!(reserves.len(), 1);
        assert_eq!(reserves[0].pool, "0xpool1");
    }

    #[test]
    fn test_malformed_reserve_still_fails() {
        let columns = PoolStatusColumns {
            token_a: vec![SAMPLE_KSP.to_string(), SAMPLE_KSP.to_string()],
            token_b: vec![SAMPLE_KUSDT.to_string(), SAMPLE_KDAI.to_string()],
            reserve_a: vec!["10".to_string(), "ten".to_string()],
            reserve_b: vec!["10".to_string(), "10".to_string()],
            extra: Vec::new(),
        };
        assert!(matches!(columns.into_reserves(&pools()), Err(RouterError::Decode(_))));
    }

    #[test]
    fn test_pool_status_length_mismatch() {
        let columns = PoolStatusColumns {
            token_a: vec!["0x0000000000000000000000000000000000000000".to_string()],
            ..Default::default()
        };
        assert!(matches!(columns.into_reserves(&pools()), Err(RouterError::Decode(_))));
    }

    #[test]
    fn test_pool_list_response_shape() {
        let body: PoolListResponse = serde_json::from_str(
            r#"{"data": [{"exchange": "0xaaa", "tvl": 1}, {"exchange": "0xbbb"}]}"#,
        ).unwrap();
        let pools: Vec<String> = body.data.into_iter().map(|s| s.exchange).collect();
        assert_eq!(pools, vec!["0xaaa", "0xbbb"]);
    }

    #[test]
    fn test_price_value_forms() {
        let number: PriceValue = serde_json::from_str("0.2134").unwrap();
        let text: PriceValue = serde_json::from_str("\"0.2134\"").unwrap();
        let junk: PriceValue = serde_json::from_str("\"n/a\"").unwrap();

        assert!((number.into_f64().unwrap() - 0.2134).abs() < 1e-12);
        assert!((text.into_f64().unwrap() - 0.2134).abs() < 1e-12);
        assert!(junk.into_f64().is_err());
    }

    #[tokio::test]
    async fn test_mock_feed_round_trip() {
        let feed = MockPoolFeed::sample();
        let pools = feed.pool_list().await.unwrap();
        assert_eq!(pools.len(), 6);

        let reserves = feed.pool_reserves(&pools).await.unwrap();
        assert_eq!(reserves.len(), 6);
        assert!(feed.native_price().await.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_mock_unknown_pool() {
        let feed = MockPoolFeed::sample();
        let result = feed.pool_reserves(&["0xnope".to_string()]).await;
        assert!(matches!(result, Err(RouterError::UnknownPool(_))));
    }

    #[tokio::test]
    async fn test_mock_pool_list_failure() {
        let feed = MockPoolFeed::new().with_pool_list_failure(502, "Bad Gateway");
        match feed.pool_list().await {
            Err(RouterError::UpstreamFetch { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
