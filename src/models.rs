//! models.rs - Core data structures for the swap router
//!
//! Token addresses, pool reserve snapshots and the route/quote results
//! handed back to callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Result, RouterError};

/// Address of the native gas token (KLAY)
pub const NATIVE_TOKEN: &str = "0x0000000000000000000000000000000000000000";

/// Decimal precision of the router's internal fixed-point amounts
pub const INTERNAL_DECIMALS: u8 = 18;

/// A 20-byte hex address compared case-insensitively.
///
/// The text given at parse time is kept so it can be shown back to the
/// caller unchanged; equality, ordering and hashing use the lower-cased key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAddress {
    original: String,
    key: String,
}

impl TokenAddress {
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| RouterError::InvalidAddress(text.to_string()))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RouterError::InvalidAddress(text.to_string()));
        }

        Ok(TokenAddress {
            original: trimmed.to_string(),
            key: format!("0x{}", hex.to_ascii_lowercase()),
        })
    }

    /// The native gas token
    pub fn native() -> Self {
        TokenAddress {
            original: NATIVE_TOKEN.to_string(),
            key: NATIVE_TOKEN.to_string(),
        }
    }

    /// Lower-cased canonical form
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The address exactly as it was supplied
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_native(&self) -> bool {
        self.key == NATIVE_TOKEN
    }
}

impl PartialEq for TokenAddress {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TokenAddress {}

impl Hash for TokenAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for TokenAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl FromStr for TokenAddress {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        TokenAddress::parse(s)
    }
}

impl TryFrom<String> for TokenAddress {
    type Error = RouterError;

    fn try_from(value: String) -> Result<Self> {
        TokenAddress::parse(&value)
    }
}

impl From<TokenAddress> for String {
    fn from(address: TokenAddress) -> Self {
        address.original
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Reserves of one pool at snapshot time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolReserves {
    pub pool: String,
    pub token_a: TokenAddress,
    pub token_b: TokenAddress,
    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
}

impl PoolReserves {
    pub fn new(
        pool: &str,
        token_a: TokenAddress,
        token_b: TokenAddress,
        reserve_a: Decimal,
        reserve_b: Decimal,
    ) -> Self {
        PoolReserves {
            pool: pool.to_string(),
            token_a,
            token_b,
            reserve_a,
            reserve_b,
        }
    }

    /// Returns `(counterpart, reserve_of_token, reserve_of_counterpart)`
    /// when `token` is one side of this pool.
    pub fn counterpart(&self, token: &TokenAddress) -> Option<(&TokenAddress, Decimal, Decimal)> {
        if *token == self.token_a {
            Some((&self.token_b, self.reserve_a, self.reserve_b))
        } else if *token == self.token_b {
            Some((&self.token_a, self.reserve_b, self.reserve_a))
        } else {
            None
        }
    }
}

impl fmt::Display for PoolReserves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} {} / {} {}]",
            self.pool,
            self.reserve_a,
            self.token_a,
            self.reserve_b,
            self.token_b
        )
    }
}

/// Parse an on-chain integer amount (decimal string) into a `Decimal`.
///
/// A well-formed integer too large for `Decimal` is `AmountOverflow`,
/// anything else malformed is `Decode`.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw).map_err(|e| {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            RouterError::AmountOverflow
        } else {
            RouterError::Decode(format!("amount `{}`: {}", raw, e))
        }
    })
}

/// Outcome of an exhaustive path search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSearch {
    pub path: Vec<TokenAddress>,
    pub amount_out: Decimal,
    pub path_count: usize,
}

impl PathSearch {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Format the path as a string (e.g., "0xaa.. -> 0xbb.. -> 0xcc..")
    pub fn format_path(&self) -> String {
        format_path(&self.path)
    }
}

/// A routed quote with slippage applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<TokenAddress>,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub min_amount_out: Decimal,
    pub path_count: usize,
    pub quoted_at: chrono::DateTime<chrono::Utc>,
}

impl Route {
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn format_path(&self) -> String {
        format_path(&self.path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | in {} out {} (min {}) over {} candidate paths",
            self.format_path(),
            self.amount_in,
            self.amount_out,
            self.min_amount_out,
            self.path_count
        )
    }
}

/// Quote against one named pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolQuote {
    pub pool: String,
    pub from: TokenAddress,
    pub to: TokenAddress,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub min_amount_out: Decimal,
}

/// Fiat value of one whole token, derived from its route to the native token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPrice {
    pub token: TokenAddress,
    /// Native tokens received for one whole token
    pub native_amount: f64,
    pub price: f64,
}

/// Everything needed to submit a swap, in each token's native precision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapPlan {
    pub from: TokenAddress,
    pub to: TokenAddress,
    pub amount_in: Decimal,
    pub min_amount_out: Decimal,
    /// Route without its endpoints
    pub intermediates: Vec<TokenAddress>,
}

/// Output of the deposit helper's swap estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositEstimate {
    pub max_lp: Decimal,
    pub max_swap: Decimal,
    pub target_amount: Decimal,
}

/// Limits passed along with a liquidity deposit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositLimits {
    pub lp_limit: Decimal,
    pub input_for_liquidity: Decimal,
    pub target_for_liquidity: Decimal,
}

pub(crate) fn format_path(path: &[TokenAddress]) -> String {
    path.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const USDT: &str = "0xceE8FAF64bB97a73bb51E115Aa89C17FfA8dD167";

    #[test]
    fn test_address_is_case_insensitive() {
        let upper = TokenAddress::parse(USDT).unwrap();
        let lower = TokenAddress::parse(&USDT.to_lowercase()).unwrap();

        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), USDT.to_lowercase());
        assert_eq!(upper.original(), USDT);
        assert_eq!(upper.to_string(), USDT);
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(TokenAddress::parse("0x1234").is_err());
        assert!(TokenAddress::parse("ceE8FAF64bB97a73bb51E115Aa89C17FfA8dD167").is_err());
        assert!(TokenAddress::parse("0xzzE8FAF64bB97a73bb51E115Aa89C17FfA8dD167").is_err());
    }

    #[test]
    fn test_address_serde_keeps_original_case() {
        let address = TokenAddress::parse(USDT).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", USDT));

        let back: TokenAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back.original(), USDT);
    }

    #[test]
    fn test_native_token() {
        assert!(TokenAddress::native().is_native());
        assert!(TokenAddress::parse(NATIVE_TOKEN).unwrap().is_native());
    }

    #[test]
    fn test_pool_counterpart() {
        let usdt = TokenAddress::parse(USDT).unwrap();
        let klay = TokenAddress::native();
        let pool = PoolReserves::new("0xpool", klay.clone(), usdt.clone(), dec!(10), dec!(20));

        let (other, own, theirs) = pool.counterpart(&usdt).unwrap();
        assert_eq!(*other, klay);
        assert_eq!(own, dec!(20));
        assert_eq!(theirs, dec!(10));

        let stranger = TokenAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
        assert!(pool.counterpart(&stranger).is_none());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000000000000000000").unwrap(), dec!(1000000000000000000));
        assert!(matches!(parse_amount("12abc"), Err(RouterError::Decode(_))));
    }

    #[test]
    fn test_parse_amount_out_of_range() {
        assert!(matches!(parse_amount("100000000000000000000000000000"), Err(RouterError::AmountOverflow)));
        assert!(matches!(parse_amount(""), Err(RouterError::Decode(_))));
    }
}
