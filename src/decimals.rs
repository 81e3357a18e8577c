//! decimals.rs - Token decimal precision cache and fold/unfold conversion
//!
//! The router works in 18-decimal internal units. Folding converts an
//! internal amount down to a token's native precision, unfolding converts
//! back up.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{Result, RouterError};
use crate::feed::DecimalsProvider;
use crate::models::{TokenAddress, INTERNAL_DECIMALS};

/// Process-wide token -> decimals map, shared as `Arc<DecimalCache>`.
///
/// Entries never expire. The native token is seeded at 18.
#[derive(Debug)]
pub struct DecimalCache {
    entries: RwLock<HashMap<TokenAddress, u8>>,
}

impl DecimalCache {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(TokenAddress::native(), INTERNAL_DECIMALS);

        DecimalCache {
            entries: RwLock::new(entries),
        }
    }

    pub async fn get(&self, token: &TokenAddress) -> Option<u8> {
        self.entries.read().await.get(token).copied()
    }

    /// Prime the cache, replacing whatever was there
    pub async fn set(&self, token: &TokenAddress, decimals: u8) -> Result<()> {
        check_decimals(token, decimals as u32)?;
        self.entries.write().await.insert(token.clone(), decimals);
        Ok(())
    }

    /// Cached value, or ask `provider` and remember the answer.
    ///
    /// A value primed with `set` while the lookup was in flight is kept.
    pub async fn get_or_fetch(&self, token: &TokenAddress, provider: &dyn DecimalsProvider) -> Result<u8> {
        if let Some(decimals) = self.get(token).await {
            return Ok(decimals);
        }

        let fetched = provider.decimals(token).await?;
        check_decimals(token, fetched as u32)?;
        log::debug!("fetched decimals for {}: {}", token, fetched);

        let mut entries = self.entries.write().await;
        Ok(*entries.entry(token.clone()).or_insert(fetched))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for DecimalCache {
    fn default() -> Self {
        Self::new()
    }
}

fn check_decimals(token: &TokenAddress, decimals: u32) -> Result<()> {
    if decimals > INTERNAL_DECIMALS as u32 {
        return Err(RouterError::InvalidDecimals {
            token: token.to_string(),
            decimals,
        });
    }
    Ok(())
}

fn scale_factor(decimals: u8) -> Decimal {
    let shift = INTERNAL_DECIMALS.saturating_sub(decimals) as u32;
    Decimal::from(10u64.pow(shift))
}

/// Internal 18-decimal amount -> whole units of `decimals` precision (truncated)
pub fn fold_amount(amount: Decimal, decimals: u8) -> Result<Decimal> {
    if decimals >= INTERNAL_DECIMALS {
        return Ok(amount);
    }
    let folded = amount
        .checked_div(scale_factor(decimals))
        .ok_or(RouterError::AmountOverflow)?;
    Ok(folded.trunc())
}

/// Native `decimals` precision amount -> internal 18-decimal amount
pub fn unfold_amount(amount: Decimal, decimals: u8) -> Result<Decimal> {
    if decimals >= INTERNAL_DECIMALS {
        return Ok(amount);
    }
    amount
        .checked_mul(scale_factor(decimals))
        .ok_or(RouterError::AmountOverflow)
}
