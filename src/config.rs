//! config.rs - Router configuration
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! KLAYswap mainnet defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::amount::{validate_fee_rate, DEFAULT_FEE_RATE};
use crate::error::{Result, RouterError};
use crate::models::TokenAddress;
use crate::route::MAX_SLIPPAGE;

pub const DEFAULT_POOL_LIST_URL: &str = "https://s.klayswap.com/stat/recentPoolStatus.json";
pub const DEFAULT_NATIVE_PRICE_URL: &str = "https://s.klayswap.com/stat/klayPrice.json";

/// Default slippage tolerances, in parts per thousand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlippageDefaults {
    pub swap: u32,
    pub deposit: u32,
    pub withdraw: u32,
    pub quote: u32,
}

impl Default for SlippageDefaults {
    fn default() -> Self {
        SlippageDefaults {
            swap: 5,
            deposit: 5,
            withdraw: 10,
            quote: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub fee_rate: Decimal,
    pub native_token: TokenAddress,
    pub pool_list_url: String,
    pub native_price_url: String,
    pub request_timeout_secs: u64,
    pub slippage: SlippageDefaults,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            fee_rate: DEFAULT_FEE_RATE,
            native_token: TokenAddress::native(),
            pool_list_url: DEFAULT_POOL_LIST_URL.to_string(),
            native_price_url: DEFAULT_NATIVE_PRICE_URL.to_string(),
            request_timeout_secs: 10,
            slippage: SlippageDefaults::default(),
        }
    }
}

impl RouterConfig {
    /// Read and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RouterError::Config(format!("{}: {}", path.display(), e)))?;

        let config: RouterConfig = toml::from_str(&text)
            .map_err(|e| RouterError::Config(format!("{}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fee_rate(self.fee_rate)?;

        let SlippageDefaults { swap, deposit, withdraw, quote } = self.slippage;
        for slippage in [swap, deposit, withdraw, quote] {
            if slippage > MAX_SLIPPAGE {
                return Err(RouterError::InvalidSlippage(slippage));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(RouterError::Config("request_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}
