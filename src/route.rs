//! route.rs - Route selection around the path finder
//!
//! Fetches the pool snapshot, builds the graph, runs the path search and
//! then applies the boundary adjustments: slippage tolerance and token
//! decimal folding. The path search itself never sees either.

use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::amount::{swap_output, validate_fee_rate};
use crate::config::RouterConfig;
use crate::decimals::{fold_amount, unfold_amount, DecimalCache};
use crate::error::{Result, RouterError};
use crate::feed::{DecimalsProvider, NativePriceProvider, PoolListProvider, PoolReserveProvider};
use crate::graph::{build_graph, SwapGraph};
use crate::models::{
    DepositEstimate, DepositLimits, PoolQuote, PoolReserves, Route, SwapPlan, TokenAddress,
    TokenPrice, INTERNAL_DECIMALS,
};
use crate::path_finder::PathFinder;

/// Slippage is expressed in parts per thousand
pub const MAX_SLIPPAGE: u32 = 1000;

/// Share of the deposit helper's swap estimate that is committed (997/1000)
const DEPOSIT_SWAP_NUMERATOR: u32 = 997;

/// Minimum acceptable amount at `slippage` parts per thousand
pub fn min_amount(amount: Decimal, slippage: u32) -> Result<Decimal> {
    if slippage > MAX_SLIPPAGE {
        return Err(RouterError::InvalidSlippage(slippage));
    }
    scale_per_mille(amount, MAX_SLIPPAGE - slippage)
}

/// `min_amount` cut down to whole base units, for values submitted on-chain
fn min_units(amount: Decimal, slippage: u32) -> Result<Decimal> {
    Ok(min_amount(amount, slippage)?.trunc())
}

/// Minimum amounts received when burning `lp_amount` of a pool's LP supply
pub fn withdraw_limits(
    balances: [Decimal; 2],
    total_supply: Decimal,
    lp_amount: Decimal,
    slippage: u32,
) -> Result<[Decimal; 2]> {
    if total_supply.is_zero() {
        return Ok([Decimal::ZERO, Decimal::ZERO]);
    }

    let mut limits = [Decimal::ZERO; 2];
    for (limit, balance) in limits.iter_mut().zip(balances) {
        let share = balance
            .checked_mul(lp_amount)
            .and_then(|v| v.checked_div(total_supply))
            .ok_or(RouterError::AmountOverflow)?;
        *limit = min_units(share, slippage)?;
    }
    Ok(limits)
}

/// Limits for a single-sided liquidity deposit
pub fn deposit_limits(estimate: &DepositEstimate, slippage: u32) -> Result<DepositLimits> {
    Ok(DepositLimits {
        lp_limit: min_units(estimate.max_lp, slippage)?,
        input_for_liquidity: scale_per_mille(estimate.max_swap, DEPOSIT_SWAP_NUMERATOR)?.trunc(),
        target_for_liquidity: scale_per_mille(estimate.target_amount, DEPOSIT_SWAP_NUMERATOR)?.trunc(),
    })
}

fn scale_per_mille(amount: Decimal, numerator: u32) -> Result<Decimal> {
    amount
        .checked_mul(Decimal::from(numerator))
        .and_then(|scaled| scaled.checked_div(Decimal::from(MAX_SLIPPAGE)))
        .ok_or(RouterError::AmountOverflow)
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RouterError::InvalidAmount(amount));
    }
    Ok(())
}

/// Quotes and swap plans over a fresh snapshot per request
pub struct RouteSelector {
    config: RouterConfig,
    finder: PathFinder,
    decimal_cache: Arc<DecimalCache>,
    pool_list: Arc<dyn PoolListProvider>,
    reserves: Arc<dyn PoolReserveProvider>,
    decimals: Arc<dyn DecimalsProvider>,
    prices: Arc<dyn NativePriceProvider>,
}

impl RouteSelector {
    /// Selector over a single feed that provides every collaborator
    pub fn new<F>(config: RouterConfig, feed: Arc<F>, decimal_cache: Arc<DecimalCache>) -> Result<Self>
    where
        F: PoolListProvider + PoolReserveProvider + DecimalsProvider + NativePriceProvider + 'static,
    {
        Self::from_parts(
            config,
            feed.clone(),
            feed.clone(),
            feed.clone(),
            feed,
            decimal_cache,
        )
    }

    pub fn from_parts(
        config: RouterConfig,
        pool_list: Arc<dyn PoolListProvider>,
        reserves: Arc<dyn PoolReserveProvider>,
        decimals: Arc<dyn DecimalsProvider>,
        prices: Arc<dyn NativePriceProvider>,
        decimal_cache: Arc<DecimalCache>,
    ) -> Result<Self> {
        validate_fee_rate(config.fee_rate)?;

        Ok(RouteSelector {
            finder: PathFinder::new(config.fee_rate),
            config,
            decimal_cache,
            pool_list,
            reserves,
            decimals,
            prices,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn decimal_cache(&self) -> &Arc<DecimalCache> {
        &self.decimal_cache
    }

    /// Pool list first, then the reserves of exactly those pools
    pub async fn snapshot(&self) -> Result<Vec<PoolReserves>> {
        let pools = self.pool_list.pool_list().await?;
        let snapshot = self.reserves.pool_reserves(&pools).await?;
        debug!("snapshot: {} pools listed, {} with reserves", pools.len(), snapshot.len());
        Ok(snapshot)
    }

    pub async fn build_graph(&self) -> Result<SwapGraph> {
        Ok(build_graph(&self.snapshot().await?))
    }

    /// Best route on an already-built graph. `None` slippage means the
    /// quote-only default.
    pub fn quote_on_graph(
        &self,
        graph: &SwapGraph,
        from: &TokenAddress,
        amount: Decimal,
        to: &TokenAddress,
        slippage: Option<u32>,
    ) -> Result<Route> {
        check_amount(amount)?;
        let slippage = slippage.unwrap_or(self.config.slippage.quote);

        let search = self.finder.find_path(graph, from, amount, to)?;
        if search.is_empty() {
            return Err(RouterError::NoRouteFound {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let route = Route {
            min_amount_out: min_amount(search.amount_out, slippage)?,
            amount_out: search.amount_out,
            path: search.path,
            amount_in: amount,
            path_count: search.path_count,
            quoted_at: chrono::Utc::now(),
        };

        info!("Route {} -> {}: {} hops, out {} (min {}), {} candidates",
            from, to, route.hops(), route.amount_out, route.min_amount_out, route.path_count);
        Ok(route)
    }

    /// Quote-only read over a fresh snapshot
    pub async fn quote(
        &self,
        from: &TokenAddress,
        amount: Decimal,
        to: &TokenAddress,
        slippage: Option<u32>,
    ) -> Result<Route> {
        let graph = self.build_graph().await?;
        self.quote_on_graph(&graph, from, amount, to, slippage)
    }

    pub async fn quote_from_native(&self, amount: Decimal, to: &TokenAddress, slippage: Option<u32>) -> Result<Route> {
        let native = self.config.native_token.clone();
        self.quote(&native, amount, to, slippage).await
    }

    /// Quote a direct swap through one pool, whichever side `from` is on
    pub async fn quote_with_pool(
        &self,
        pool: &str,
        from: &TokenAddress,
        amount: Decimal,
        slippage: Option<u32>,
    ) -> Result<PoolQuote> {
        check_amount(amount)?;
        let slippage = slippage.unwrap_or(self.config.slippage.quote);

        let reserves = self.reserves.pool_reserves(&[pool.to_string()]).await?;
        let status = reserves
            .into_iter()
            .next()
            .ok_or_else(|| RouterError::UnknownPool(pool.to_string()))?;

        let (to, reserve_from, reserve_to) = status.counterpart(from).ok_or_else(|| RouterError::TokenNotInPool {
            pool: pool.to_string(),
            token: from.to_string(),
        })?;

        let amount_out = swap_output(reserve_from, reserve_to, amount, self.config.fee_rate)?;

        Ok(PoolQuote {
            pool: pool.to_string(),
            from: from.clone(),
            to: to.clone(),
            amount_in: amount,
            amount_out,
            min_amount_out: min_amount(amount_out, slippage)?,
        })
    }

    /// Route and size a swap in native token precision, ready to submit
    pub async fn plan_swap(
        &self,
        from: &TokenAddress,
        amount: Decimal,
        to: &TokenAddress,
        slippage: Option<u32>,
    ) -> Result<SwapPlan> {
        let slippage = slippage.unwrap_or(self.config.slippage.swap);
        let route = self.quote(from, amount, to, Some(0)).await?;

        let amount_in = self.fold(from, amount).await?;
        let amount_out = self.fold(to, route.amount_out).await?;
        let intermediates = route.path[1..route.path.len() - 1].to_vec();

        Ok(SwapPlan {
            from: from.clone(),
            to: to.clone(),
            amount_in,
            min_amount_out: min_units(amount_out, slippage)?,
            intermediates,
        })
    }

    /// Fiat price of one whole unit of each token, via its best route to
    /// the native token. Unroutable tokens price at zero.
    pub async fn token_prices(&self, tokens: &[TokenAddress]) -> Result<Vec<TokenPrice>> {
        let graph = self.build_graph().await?;
        let native = &self.config.native_token;
        let one = unit(INTERNAL_DECIMALS);

        let mut amounts = Vec::with_capacity(tokens.len());
        for token in tokens {
            let received = if token == native {
                one
            } else {
                self.finder.find_path(&graph, token, one, native)?.amount_out
            };
            amounts.push((token.clone(), (received / one).to_f64().unwrap_or(0.0)));
        }

        let native_price = self.prices.native_price().await?;

        Ok(amounts
            .into_iter()
            .map(|(token, native_amount)| TokenPrice {
                token,
                native_amount,
                price: native_amount * native_price,
            })
            .collect())
    }

    /// `withdraw_limits` at the configured withdraw slippage unless overridden
    pub fn withdraw_limits(
        &self,
        balances: [Decimal; 2],
        total_supply: Decimal,
        lp_amount: Decimal,
        slippage: Option<u32>,
    ) -> Result<[Decimal; 2]> {
        withdraw_limits(balances, total_supply, lp_amount, slippage.unwrap_or(self.config.slippage.withdraw))
    }

    /// `deposit_limits` at the configured deposit slippage unless overridden
    pub fn deposit_limits(&self, estimate: &DepositEstimate, slippage: Option<u32>) -> Result<DepositLimits> {
        deposit_limits(estimate, slippage.unwrap_or(self.config.slippage.deposit))
    }

    /// Internal amount -> `token`'s native precision
    pub async fn fold(&self, token: &TokenAddress, amount: Decimal) -> Result<Decimal> {
        let decimals = self.decimal_cache.get_or_fetch(token, self.decimals.as_ref()).await?;
        fold_amount(amount, decimals)
    }

    /// `token`'s native precision -> internal amount
    pub async fn unfold(&self, token: &TokenAddress, amount: Decimal) -> Result<Decimal> {
        let decimals = self.decimal_cache.get_or_fetch(token, self.decimals.as_ref()).await?;
        unfold_amount(amount, decimals)
    }
}

fn unit(decimals: u8) -> Decimal {
    Decimal::from(10u64.pow(decimals as u32))
}
