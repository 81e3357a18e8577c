//! path_finder.rs - Exhaustive simple-path search between two tokens
//!
//! Depth-first over an explicit stack of partial paths. Every simple path
//! that reaches the destination is priced hop by hop, compounding each
//! hop's output into the next, and the best one is kept. Sub-path amounts
//! are not memoised: a segment's value depends on the amount carried into it.
//!
//! Neighbours are pushed in ascending address order, so the stack visits
//! the highest address first. The result does not depend on that order:
//! equal outputs are broken by fewer hops, then by the smaller address
//! sequence.

use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::amount::{path_output, DEFAULT_FEE_RATE};
use crate::error::Result;
use crate::graph::SwapGraph;
use crate::models::{format_path, PathSearch, TokenAddress};

#[derive(Debug, Clone, Copy)]
pub struct PathFinder {
    fee_rate: Decimal,
}

impl PathFinder {
    pub fn new(fee_rate: Decimal) -> Self {
        PathFinder { fee_rate }
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    /// Best path from `source` to `destination` for `amount_in`.
    ///
    /// No route gives an empty path, zero amount and a zero count. A route
    /// whose output is zero, or cannot be represented, is counted but never
    /// chosen.
    pub fn find_path(
        &self,
        graph: &SwapGraph,
        source: &TokenAddress,
        amount_in: Decimal,
        destination: &TokenAddress,
    ) -> Result<PathSearch> {
        let mut best = PathSearch::default();

        if source == destination || !graph.contains(source) {
            return Ok(best);
        }

        let mut stack: Vec<Vec<TokenAddress>> = vec![vec![source.clone()]];

        while let Some(path) = stack.pop() {
            let last = match path.last() {
                Some(last) => last,
                None => continue,
            };

            if last == destination {
                best.path_count += 1;
                let amount_out = match path_output(graph, &path, amount_in, self.fee_rate) {
                    Ok(amount_out) => amount_out,
                    Err(e) => {
                        log::debug!("skipping path {}: {}", format_path(&path), e);
                        continue;
                    }
                };

                if is_better(&path, amount_out, &best) {
                    best.path = path;
                    best.amount_out = amount_out;
                }
                continue;
            }

            for (neighbor, _) in graph.neighbors(last) {
                if !path.contains(neighbor) {
                    let mut extended = path.clone();
                    extended.push(neighbor.clone());
                    stack.push(extended);
                }
            }
        }

        log::debug!(
            "path search {} -> {}: {} candidate paths, best {} ({} hops)",
            source,
            destination,
            best.path_count,
            best.amount_out,
            best.path.len().saturating_sub(1)
        );

        Ok(best)
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_RATE)
    }
}

/// `find_path` at the default 0.3% fee
pub fn find_path(
    graph: &SwapGraph,
    source: &TokenAddress,
    amount_in: Decimal,
    destination: &TokenAddress,
) -> Result<PathSearch> {
    PathFinder::default().find_path(graph, source, amount_in, destination)
}

fn is_better(path: &[TokenAddress], amount_out: Decimal, best: &PathSearch) -> bool {
    match amount_out.cmp(&best.amount_out) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal if best.path.is_empty() => false,
        Ordering::Equal => match path.len().cmp(&best.path.len()) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => path < best.path.as_slice(),
        },
    }
}
