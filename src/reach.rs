// DOVESIM: Vanilla BGP Path Inference and Dovetail Path Sampling on the AS Graph
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Cost-indexed reachability over the pathlet graph.
//!
//! The primitives are the zero-weight neighborhood closure and the single
//! weight-k expansion step; layering them yields a cost map, i.e. for every
//! total weight `w` the set of vertices reachable from a source at exactly
//! that monetary cost. Run against the transpose graph, the cost map acts as
//! the back-reachability oracle pruning the sampler's DFS.

use std::collections::{BTreeMap, VecDeque};

use ahash::HashSet;
use dashmap::DashSet;
use rayon::prelude::*;

use crate::graph::{Graph, Vertex, Weight};

/// `weight -> vertices reachable at exactly that total weight`. Levels may
/// overlap: a vertex reachable at several total weights appears in each.
/// Levels with no vertices are absent.
pub type CostMap = BTreeMap<Weight, HashSet<Vertex>>;

/// All vertices reachable from `sources` using only weight-0 edges,
/// including the sources themselves.
pub fn zero_nbhd<G: Graph>(graph: &G, sources: &HashSet<Vertex>) -> HashSet<Vertex> {
    let mut nbhd = HashSet::default();
    let mut queue: VecDeque<Vertex> = sources.iter().copied().collect();

    while let Some(u) = queue.pop_front() {
        nbhd.insert(u);
        for &v in graph.adj_vertices(u, 0).unwrap_or_default() {
            if !nbhd.contains(&v) {
                queue.push_back(v);
            }
        }
    }

    nbhd
}

/// Parallel variant of [`zero_nbhd`]: each frontier is expanded concurrently
/// against a concurrent seen-set, newly discovered vertices feed the next
/// frontier.
pub fn zero_nbhd_parallel<G: Graph>(graph: &G, sources: &HashSet<Vertex>) -> HashSet<Vertex> {
    let seen: DashSet<Vertex> = DashSet::new();
    let mut frontier: Vec<Vertex> = sources
        .iter()
        .copied()
        .filter(|&u| seen.insert(u))
        .collect();

    while !frontier.is_empty() {
        frontier = frontier
            .par_iter()
            .flat_map_iter(|&u| {
                graph
                    .adj_vertices(u, 0)
                    .unwrap_or_default()
                    .iter()
                    .copied()
                    .filter(|&v| seen.insert(v))
            })
            .collect();
    }

    seen.into_iter().collect()
}

/// All immediate weight-`k` successors of `sources`. A single hop, no
/// closure.
pub fn k_step<G: Graph>(graph: &G, sources: &HashSet<Vertex>, k: Weight) -> HashSet<Vertex> {
    sources
        .iter()
        .flat_map(|&u| graph.adj_vertices(u, k).unwrap_or_default())
        .copied()
        .collect()
}

/// Compute the cost map from `source` for every total weight up to
/// `max_cost`: alternate a weight-1 expansion with a zero-weight closure.
pub fn compute_available_costs<G: Graph>(
    graph: &G,
    source: Vertex,
    max_cost: Weight,
) -> CostMap {
    let mut cost_map = CostMap::new();

    let mut zero = zero_nbhd_parallel(graph, &HashSet::from_iter([source]));
    cost_map.insert(0, zero.clone());

    for w in 1..=max_cost {
        let one = k_step(graph, &zero, 1);
        zero = zero_nbhd_parallel(graph, &one);
        if !zero.is_empty() {
            cost_map.insert(w, zero.clone());
        }
    }

    cost_map
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::BinaryWdg;

    fn vertex_set(vs: &[Vertex]) -> HashSet<Vertex> {
        vs.iter().copied().collect()
    }

    /// Three vertices chained by weight-0 edges; the closure must reach all
    /// of them regardless of traversal order.
    #[test]
    fn zero_closure_on_chain() {
        let mut g = BinaryWdg::new();
        for u in 1..=3 {
            g.add_vertex(u);
        }
        g.add_edge(1, 2, 0);
        g.add_edge(2, 3, 0);

        let expected = vertex_set(&[1, 2, 3]);
        assert_eq!(zero_nbhd(&g, &vertex_set(&[1])), expected);
        assert_eq!(zero_nbhd_parallel(&g, &vertex_set(&[1])), expected);
    }

    #[test]
    fn zero_closure_ignores_one_edges() {
        let mut g = BinaryWdg::new();
        for u in 0..3 {
            g.add_vertex(u);
        }
        g.add_edge(0, 1, 0);
        g.add_edge(1, 2, 1);

        assert_eq!(zero_nbhd(&g, &vertex_set(&[0])), vertex_set(&[0, 1]));
        assert_eq!(
            zero_nbhd_parallel(&g, &vertex_set(&[0])),
            vertex_set(&[0, 1])
        );
    }

    #[test]
    fn zero_closure_handles_cycles() {
        let mut g = BinaryWdg::new();
        for u in 0..2 {
            g.add_vertex(u);
        }
        g.add_edge(0, 1, 0);
        g.add_edge(1, 0, 0);

        assert_eq!(zero_nbhd(&g, &vertex_set(&[0])), vertex_set(&[0, 1]));
        assert_eq!(
            zero_nbhd_parallel(&g, &vertex_set(&[0])),
            vertex_set(&[0, 1])
        );
    }

    #[test]
    fn k_step_is_a_single_hop() {
        let mut g = BinaryWdg::new();
        for u in 0..4 {
            g.add_vertex(u);
        }
        g.add_edge(0, 1, 1);
        g.add_edge(1, 2, 1);
        g.add_edge(0, 3, 0);

        assert_eq!(k_step(&g, &vertex_set(&[0]), 1), vertex_set(&[1]));
        assert_eq!(k_step(&g, &vertex_set(&[0, 1]), 1), vertex_set(&[1, 2]));
        assert_eq!(k_step(&g, &vertex_set(&[0]), 0), vertex_set(&[3]));
    }

    #[test]
    fn cost_map_layers_expansions_and_closures() {
        // 0 -0-> 1 -1-> 2 -0-> 3 -1-> 4
        let mut g = BinaryWdg::new();
        for u in 0..5 {
            g.add_vertex(u);
        }
        g.add_edge(0, 1, 0);
        g.add_edge(1, 2, 1);
        g.add_edge(2, 3, 0);
        g.add_edge(3, 4, 1);

        let cost_map = compute_available_costs(&g, 0, 3);

        assert_eq!(cost_map[&0], vertex_set(&[0, 1]));
        assert_eq!(cost_map[&1], vertex_set(&[2, 3]));
        assert_eq!(cost_map[&2], vertex_set(&[4]));
        assert!(!cost_map.contains_key(&3));
    }

    #[test]
    fn cost_map_levels_may_overlap() {
        // Vertex 2 is reachable at cost 1 (via 0 -1-> 2) and at cost 2
        // (via 0 -1-> 1 -1-> 2).
        let mut g = BinaryWdg::new();
        for u in 0..3 {
            g.add_vertex(u);
        }
        g.add_edge(0, 2, 1);
        g.add_edge(0, 1, 1);
        g.add_edge(1, 2, 1);

        let cost_map = compute_available_costs(&g, 0, 2);

        assert!(cost_map[&1].contains(&2));
        assert!(cost_map[&2].contains(&2));
    }
}
