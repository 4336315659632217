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
//! The Dovetail path sampler.
//!
//! A sample fixes a matchmaker, derives per-cost sampling weights from the
//! polynomial of available costs (so that drawing a cost and then a uniform
//! path of that cost approximates uniform sampling over all eligible paths),
//! and enumerates equal-cost paths with a bounded parallel DFS pruned by the
//! transpose-side cost map.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use dashmap::{DashMap, DashSet};
use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

use dovesim_utils::sampling::{sample_by_weights, single_random_sample};

use crate::{
    graph::{Graph, Vertex, VertexPath, Weight},
    pathlets::DovetailProperties,
    poly::poly_roots,
    reach::{compute_available_costs, CostMap},
    AsNumber,
};

/// Sampling weight per cost level, in `[0, 1]`.
pub type CostWeights = std::collections::BTreeMap<Weight, f64>;

/// Minimum AS-hop cost of a source-to-matchmaker segment ("exp6" in the
/// Dovetail construction).
pub const SOURCE_TO_MM_MIN_COST: Weight = 6;

/// Compute the per-cost sampling weights for reaching `u`.
///
/// The polynomial `-1 + sum x^w` over all eligible cost levels `w` (at least
/// `min_cost_k`, with `u` present in `cost_map[w]`) has exactly one positive
/// real root `r`; the weight of level `w` is then `r^w`, which makes the
/// weights sum to one. Returns an empty map when no cost level is eligible.
pub fn exp_k_cost_weights(u: Vertex, cost_map: &CostMap, min_cost_k: Weight) -> CostWeights {
    assert!(min_cost_k > 0);

    let max_cost = *cost_map
        .keys()
        .next_back()
        .expect("cost map must hold at least the zero level");

    let mut coeff = vec![0.0; max_cost as usize + 1];
    coeff[0] = -1.0;

    for w in 1..=max_cost {
        if w >= min_cost_k && cost_map.get(&w).is_some_and(|s| s.contains(&u)) {
            coeff[w as usize] = 1.0;
        }
    }

    let Some(last_nonzero) = coeff.iter().rposition(|&c| c == 1.0) else {
        log::info!("no eligible cost level for vertex {u}");
        return CostWeights::new();
    };

    let roots = poly_roots(&coeff[..=last_nonzero]);
    let root = roots
        .iter()
        .find(|r| r.re > 0.0 && r.im == 0.0)
        .expect("available-cost polynomial must have a positive real root")
        .re;

    let mut weights = CostWeights::new();
    weights.insert(0, 0.0);
    for w in 1..=max_cost {
        let weight = if coeff[w as usize] != 0.0 {
            root.powi(w as i32)
        } else {
            0.0
        };
        weights.insert(w, weight);
    }

    weights
}

struct DfsShared<'a, G> {
    graph: &'a G,
    target: Vertex,
    cost: Weight,
    max_num_paths: usize,
    max_path_length: usize,
    cost_map: &'a CostMap,
    paths: Mutex<Vec<VertexPath>>,
    num_found: AtomicUsize,
}

fn dfs_visit<G: Graph>(shared: &DfsShared<G>, path: VertexPath, cumul_cost: Weight) {
    if shared.num_found.load(Ordering::Relaxed) >= shared.max_num_paths {
        return;
    }
    if path.len() > shared.max_path_length {
        return;
    }

    let u = *path.last().unwrap();
    if u == shared.target && cumul_cost == shared.cost {
        shared.num_found.fetch_add(1, Ordering::Relaxed);
        shared.paths.lock().unwrap().push(path);
        return;
    }

    // Only branch into vertices the back-reachability oracle can still
    // connect to the target at the remaining cost.
    let mut branches = Vec::new();
    for k in 0..=1 {
        let Some(remaining) = shared.cost.checked_sub(cumul_cost + k) else {
            continue;
        };
        for &v in shared.graph.adj_vertices(u, k).unwrap_or_default() {
            if shared
                .cost_map
                .get(&remaining)
                .is_some_and(|s| s.contains(&v))
            {
                branches.push((v, k));
            }
        }
    }

    branches.into_par_iter().for_each(|(v, k)| {
        let mut next = path.clone();
        next.push(v);
        dfs_visit(shared, next, cumul_cost + k);
    });
}

/// Enumerate up to `max_num_paths` paths from `source` to `target` of total
/// weight exactly `cost`, branching in parallel. `cost_map` must be the
/// available costs of `target` on the transpose graph; it prunes every
/// branch that cannot reach the target with the remaining budget.
pub fn limited_dfs_parallel<G: Graph>(
    graph: &G,
    source: Vertex,
    target: Vertex,
    cost: Weight,
    max_num_paths: usize,
    max_path_length: usize,
    cost_map: &CostMap,
) -> Vec<VertexPath> {
    let shared = DfsShared {
        graph,
        target,
        cost,
        max_num_paths,
        max_path_length,
        cost_map,
        paths: Mutex::new(Vec::new()),
        num_found: AtomicUsize::new(0),
    };

    dfs_visit(&shared, vec![source], 0);

    let mut paths = shared.paths.into_inner().unwrap();
    paths.truncate(max_num_paths);
    paths
}

lazy_static! {
    /// Per matchmaker, the source ASes known unable to reach it. Lives for
    /// the whole experiment so repeated samples skip dead pairs immediately.
    static ref MM_BLACKLIST: DashMap<AsNumber, DashSet<AsNumber>> = DashMap::new();
}

/// Draw one random path from `source_asn` to a random matchmaker.
///
/// Matchmakers are tried in shuffled order; for each candidate the
/// back-reachability cost map is computed from its `host_in` vertex on the
/// transpose graph, and the exp-6 weights decide whether the source can
/// reach it at an eligible cost at all. Unreachable pairs are blacklisted.
/// Returns `None` when every matchmaker is blacklisted or the DFS finds no
/// path at the sampled cost.
#[allow(clippy::too_many_arguments)]
pub fn create_path_to_random_matchmaker<G, R>(
    graph: &G,
    transpose_graph: &G,
    graph_diameter: Weight,
    source_asn: &str,
    properties: &DovetailProperties,
    max_num_paths: usize,
    max_path_length: usize,
    rng: &mut R,
) -> Option<VertexPath>
where
    G: Graph,
    R: Rng + ?Sized,
{
    // A source never dovetails through its own AS.
    MM_BLACKLIST
        .entry(source_asn.to_string())
        .or_default()
        .insert(source_asn.to_string());

    let source_vertex = properties.host_out[source_asn];

    let mut mm_ases: Vec<AsNumber> = properties.matchmaker_ases.iter().cloned().collect();
    mm_ases.shuffle(rng);

    let mut chosen = None;
    for mm_asn in mm_ases {
        if MM_BLACKLIST
            .get(&mm_asn)
            .is_some_and(|set| set.contains(source_asn))
        {
            continue;
        }

        let mm_vertex = properties.host_in[&mm_asn];
        let cost_map = compute_available_costs(transpose_graph, mm_vertex, graph_diameter);
        let cost_weights = exp_k_cost_weights(source_vertex, &cost_map, SOURCE_TO_MM_MIN_COST);

        if cost_weights.is_empty() {
            MM_BLACKLIST
                .entry(mm_asn.clone())
                .or_default()
                .insert(source_asn.to_string());
            continue;
        }

        chosen = Some((mm_asn, cost_map, cost_weights));
        break;
    }

    let (mm_asn, cost_map, cost_weights) = chosen?;
    let mm_vertex = properties.host_in[&mm_asn];

    let sampled_cost = sample_by_weights(cost_weights.iter(), 1, rng).pop()?;

    let dfs_paths = limited_dfs_parallel(
        graph,
        source_vertex,
        mm_vertex,
        sampled_cost,
        max_num_paths,
        max_path_length,
        &cost_map,
    );

    single_random_sample(&dfs_paths, rng).cloned()
}
