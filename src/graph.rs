//! graph.rs - Token graph built from a pool reserve snapshot
//!
//! Every pool contributes one edge in each direction; the reverse edge
//! always carries the same reserves swapped.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{PoolReserves, TokenAddress};

/// Reserves seen from one side of a pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub pool: String,
    pub reserve_self: Decimal,
    pub reserve_neighbor: Decimal,
}

impl Edge {
    fn reversed(&self) -> Self {
        Edge {
            pool: self.pool.clone(),
            reserve_self: self.reserve_neighbor,
            reserve_neighbor: self.reserve_self,
        }
    }
}

/// Immutable snapshot of the pool network.
///
/// Ordered maps keep neighbour iteration, and so path search, deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SwapGraph {
    nodes: BTreeMap<TokenAddress, BTreeMap<TokenAddress, Edge>>,
}

impl SwapGraph {
    pub fn neighbors(&self, token: &TokenAddress) -> impl Iterator<Item = (&TokenAddress, &Edge)> {
        self.nodes.get(token).into_iter().flat_map(|edges| edges.iter())
    }

    pub fn edge(&self, from: &TokenAddress, to: &TokenAddress) -> Option<&Edge> {
        self.nodes.get(from).and_then(|edges| edges.get(to))
    }

    pub fn contains(&self, token: &TokenAddress) -> bool {
        self.nodes.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenAddress> {
        self.nodes.keys()
    }

    pub fn token_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct token pairs (undirected edges)
    pub fn pair_count(&self) -> usize {
        self.nodes.values().map(|edges| edges.len()).sum::<usize>() / 2
    }

    fn insert(&mut self, from: &TokenAddress, to: &TokenAddress, edge: Edge) {
        let reverse = edge.reversed();
        self.nodes.entry(from.clone()).or_default().insert(to.clone(), edge);
        self.nodes.entry(to.clone()).or_default().insert(from.clone(), reverse);
    }
}

/// Build the graph from a reserve snapshot.
///
/// A later pool for the same token pair replaces the earlier one. Pools
/// with empty reserves are kept; zero liquidity is handled when amounts
/// are computed.
pub fn build_graph(snapshot: &[PoolReserves]) -> SwapGraph {
    let mut graph = SwapGraph::default();

    for pool in snapshot {
        if graph.edge(&pool.token_a, &pool.token_b).is_some() {
            log::debug!("pool {} replaces earlier edge {} <-> {}", pool.pool, pool.token_a, pool.token_b);
        }

        graph.insert(&pool.token_a, &pool.token_b, Edge {
            pool: pool.pool.clone(),
            reserve_self: pool.reserve_a,
            reserve_neighbor: pool.reserve_b,
        });
    }

    log::debug!("built swap graph: {} tokens, {} pairs", graph.token_count(), graph.pair_count());
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn token(n: u8) -> TokenAddress {
        TokenAddress::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[test]
    fn test_edges_are_reserve_symmetric() {
        let snapshot = vec![
            PoolReserves::new("p1", token(1), token(2), dec!(100), dec!(300)),
            PoolReserves::new("p2", token(2), token(3), dec!(7), dec!(0)),
        ];
        let graph = build_graph(&snapshot);

        for pool in &snapshot {
            let forward = graph.edge(&pool.token_a, &pool.token_b).unwrap();
            let backward = graph.edge(&pool.token_b, &pool.token_a).unwrap();
            assert_eq!(forward.reserve_self, backward.reserve_neighbor);
            assert_eq!(forward.reserve_neighbor, backward.reserve_self);
            assert_eq!(forward.pool, backward.pool);
        }
        assert_eq!(graph.token_count(), 3);
        assert_eq!(graph.pair_count(), 2);
    }

    #[test]
    fn test_later_pool_wins() {
        let snapshot = vec![
            PoolReserves::new("old", token(1), token(2), dec!(1), dec!(2)),
            PoolReserves::new("new", token(2), token(1), dec!(50), dec!(60)),
        ];
        let graph = build_graph(&snapshot);

        let edge = graph.edge(&token(1), &token(2)).unwrap();
        assert_eq!(edge.pool, "new");
        assert_eq!(edge.reserve_self, dec!(60));
        assert_eq!(edge.reserve_neighbor, dec!(50));
        assert_eq!(graph.pair_count(), 1);
    }

    #[test]
    fn test_zero_reserve_pool_is_kept() {
        let snapshot = vec![PoolReserves::new("dry", token(1), token(2), dec!(0), dec!(0))];
        let graph = build_graph(&snapshot);
        assert!(graph.edge(&token(1), &token(2)).is_some());
    }

    #[test]
    fn test_lookup_ignores_case() {
        let mixed = TokenAddress::parse("0xABCDEF0000000000000000000000000000000001").unwrap();
        let lower = TokenAddress::parse("0xabcdef0000000000000000000000000000000001").unwrap();
        let snapshot = vec![PoolReserves::new("p", mixed, token(9), dec!(1), dec!(1))];
        let graph = build_graph(&snapshot);

        assert!(graph.contains(&lower));
        assert_eq!(graph.neighbors(&lower).count(), 1);
    }
}
