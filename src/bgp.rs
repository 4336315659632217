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
//! Gao-Rexford path inference on the AS graph.
//!
//! [`compute_paths`] runs a three-phase BFS realizing valley-free routing: a
//! route may climb provider edges, cross at most one peer edge, and then
//! descend customer edges. Paths are stored in incoming view (`path[0]` is
//! the origin, `path.last()` the receiver), so for every installed entry
//! `(asn, path)` the invariant `path.last() == asn` holds.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::Mutex,
};

use ahash::{HashMap, HashMapExt};
use itertools::Itertools;

use crate::{
    asrel::{AdjList, AdjListElem, Relationship},
    AsNumber, AsPath,
};

/// Paths installed toward a single prefix, keyed by the receiving AS.
pub type IndexedPaths = BTreeMap<AsNumber, AsPath>;

/// Per-origin results of the vanilla fan-out: `origin -> IndexedPaths`.
pub type IndexedPathsTo = BTreeMap<AsNumber, IndexedPaths>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OriginKind {
    /// The AS legitimately announcing the prefix. At most one per computation.
    True,
    /// An AS falsely claiming to originate the prefix.
    False,
    /// An AS prepending the true origin, announcing a one-hop path.
    OneHop,
}

#[derive(Clone, Debug)]
pub struct Origin {
    pub asn: AsNumber,
    pub kind: OriginKind,
}

/// Route-selection policy of the simulation. Both predicates are total.
pub trait SimulationPolicy: Sync {
    /// Whether `asn` will consider importing `new_path` for `prefix`.
    fn import(&self, asn: &str, prefix: &str, new_path: &[AsNumber]) -> bool;

    /// True iff `p1` is strictly preferred over `p2` at `asn`.
    fn prefer(&self, asn: &str, prefix: &str, p1: &[AsNumber], p2: &[AsNumber]) -> bool;
}

/// Import everything; shorter paths win, ties broken by lexicographic
/// comparison of the last hop. The tiebreak is not BGP-standard but is kept
/// for reproducibility.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultPolicy;

impl SimulationPolicy for DefaultPolicy {
    fn import(&self, _asn: &str, _prefix: &str, _new_path: &[AsNumber]) -> bool {
        true
    }

    fn prefer(&self, _asn: &str, _prefix: &str, p1: &[AsNumber], p2: &[AsNumber]) -> bool {
        match p1.len().cmp(&p2.len()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => p1.last() < p2.last(),
            std::cmp::Ordering::Greater => false,
        }
    }
}

/// Copy-on-write view of an adjacency list: the shared base stays untouched
/// while synthetic one-hop edges are recorded privately per computation.
struct OverlayAdjList<'a> {
    base: &'a AdjList,
    synthetic: HashMap<AsNumber, Vec<AdjListElem>>,
}

impl<'a> OverlayAdjList<'a> {
    fn new(base: &'a AdjList) -> Self {
        Self {
            base,
            synthetic: HashMap::new(),
        }
    }

    fn add_synthetic(&mut self, owner: AsNumber, elem: AdjListElem) {
        self.synthetic.entry(owner).or_default().push(elem);
    }

    fn neighbors(&self, asn: &str) -> impl Iterator<Item = &AdjListElem> {
        self.base
            .get(asn)
            .into_iter()
            .flatten()
            .chain(self.synthetic.get(asn).into_iter().flatten())
    }
}

fn add_origin_paths(origins: &[Origin], out: &mut IndexedPaths, adj_list: &mut OverlayAdjList) {
    let true_origin = origins
        .iter()
        .find(|o| o.kind == OriginKind::True)
        .map(|o| o.asn.clone());

    for origin in origins {
        match origin.kind {
            OriginKind::True | OriginKind::False => {
                out.insert(origin.asn.clone(), vec![origin.asn.clone()]);
            }
            OriginKind::OneHop => {
                let true_origin = true_origin
                    .clone()
                    .expect("a one-hop origin requires a true origin");
                out.insert(
                    origin.asn.clone(),
                    vec![true_origin.clone(), origin.asn.clone()],
                );
                // Synthetic edge so the BFS can reach the true origin
                // through the one-hop announcer.
                adj_list.add_synthetic(
                    origin.asn.clone(),
                    AdjListElem {
                        asn: true_origin,
                        rel: Relationship::Provider,
                    },
                );
            }
        }
    }
}

/// Consider the path installed at `visited_by` as a candidate at `asn`.
/// Installs `out[visited_by] ++ [asn]` if `asn` has no entry yet or the
/// current entry (in incoming form, trailing `asn` stripped) loses the
/// comparison.
fn update_paths<P: SimulationPolicy + ?Sized>(
    asn: &str,
    visited_by: &str,
    prefix: &str,
    policy: &P,
    out: &mut IndexedPaths,
) {
    let mut new_path = out[visited_by].clone();

    let replace = match out.get(asn) {
        None => true,
        Some(current_path) => {
            let current = &current_path[..current_path.len() - 1];
            !policy.prefer(asn, prefix, current, &new_path)
        }
    };

    if replace {
        new_path.push(asn.to_string());
        out.insert(asn.to_string(), new_path);
    }
}

/// Phase 1: walk the provider cone above each origin.
fn bfs_phase_one<P: SimulationPolicy + ?Sized>(
    adj_list: &OverlayAdjList,
    prefix: &str,
    policy: &P,
    out: &mut IndexedPaths,
    visited: &mut BTreeSet<AsNumber>,
) {
    let mut queue: VecDeque<(AsNumber, AsNumber)> =
        out.keys().map(|asn| (asn.clone(), asn.clone())).collect();

    while let Some((asn, visited_by)) = queue.pop_front() {
        if !policy.import(&asn, prefix, &out[&visited_by]) {
            continue;
        }

        if !visited.contains(&asn) {
            for adj in adj_list.neighbors(&asn) {
                if adj.rel == Relationship::Provider {
                    queue.push_back((adj.asn.clone(), asn.clone()));
                }
            }
        }

        visited.insert(asn.clone());

        // Origin seeds carry their own path already.
        if asn != visited_by {
            update_paths(&asn, &visited_by, prefix, policy, out);
        }
    }
}

/// Phase 2: a single peer hop from every AS reached so far. Peers are never
/// re-traversed.
fn bfs_phase_two<P: SimulationPolicy + ?Sized>(
    adj_list: &OverlayAdjList,
    prefix: &str,
    policy: &P,
    out: &mut IndexedPaths,
    visited: &mut BTreeSet<AsNumber>,
) {
    let mut new_visited = BTreeSet::new();

    for asn in visited.iter() {
        for adj in adj_list.neighbors(asn) {
            if adj.rel == Relationship::Peer && !visited.contains(&adj.asn) {
                update_paths(&adj.asn, asn, prefix, policy, out);
                new_visited.insert(adj.asn.clone());
            }
        }
    }

    visited.extend(new_visited);
}

/// Phase 3: descend into the customer trees. Placements from the earlier
/// phases are authoritative and never overwritten.
fn bfs_phase_three<P: SimulationPolicy + ?Sized>(
    adj_list: &OverlayAdjList,
    prefix: &str,
    policy: &P,
    out: &mut IndexedPaths,
    visited: &BTreeSet<AsNumber>,
) {
    let mut queue = VecDeque::new();
    let mut new_visited = visited.clone();

    for asn in visited.iter() {
        for adj in adj_list.neighbors(asn) {
            if adj.rel == Relationship::Customer {
                queue.push_back((adj.asn.clone(), asn.clone()));
            }
        }
    }

    while let Some((asn, visited_by)) = queue.pop_front() {
        if !policy.import(&asn, prefix, &out[&visited_by]) {
            continue;
        }

        if !new_visited.contains(&asn) {
            for adj in adj_list.neighbors(&asn) {
                if adj.rel == Relationship::Customer {
                    queue.push_back((adj.asn.clone(), asn.clone()));
                }
            }
            new_visited.insert(asn.clone());
        }

        if !visited.contains(&asn) {
            update_paths(&asn, &visited_by, prefix, policy, out);
        }
    }
}

/// Compute the path every AS selects toward `prefix` under `policy`.
///
/// ASes unreachable under the policy simply have no entry; the solver itself
/// never fails.
pub fn compute_paths<P: SimulationPolicy + ?Sized>(
    adj_list: &AdjList,
    prefix: &str,
    origins: &[Origin],
    policy: &P,
) -> IndexedPaths {
    let mut adj_list = OverlayAdjList::new(adj_list);
    let mut out = IndexedPaths::new();
    let mut visited = BTreeSet::new();

    add_origin_paths(origins, &mut out, &mut adj_list);
    bfs_phase_one(&adj_list, prefix, policy, &mut out, &mut visited);
    bfs_phase_two(&adj_list, prefix, policy, &mut out, &mut visited);
    bfs_phase_three(&adj_list, prefix, policy, &mut out, &visited);

    out
}

/// Run the vanilla single-origin computation for every AS in `asns`.
///
/// The work is split into `min(max_num_threads, asns.len())` contiguous
/// chunks, one scoped worker thread each. Every worker collects its results
/// locally and merges them into the shared map under a single mutex
/// acquisition at the end.
pub fn compute_all_vanilla_paths(
    asns: &[AsNumber],
    adj_list: &AdjList,
    max_num_threads: usize,
) -> IndexedPathsTo {
    let n = max_num_threads.min(asns.len());
    if n == 0 {
        return IndexedPathsTo::new();
    }

    let chunks = dovesim_utils::sampling::chunk(asns, n);
    let out = Mutex::new(IndexedPathsTo::new());
    let out_ref = &out;

    crossbeam_utils::thread::scope(|s| {
        for jobs in &chunks {
            s.spawn(move |_| {
                let mut local = Vec::with_capacity(jobs.len());
                for asn in jobs {
                    let origins = [Origin {
                        asn: asn.clone(),
                        kind: OriginKind::True,
                    }];
                    local.push((
                        asn.clone(),
                        compute_paths(adj_list, "NIL", &origins, &DefaultPolicy),
                    ));
                }

                out_ref.lock().unwrap().extend(local);
            });
        }
    })
    .unwrap();

    out.into_inner().unwrap()
}

/// Format an installed path for emission: hops are printed receiver first and
/// origin last, i.e. the incoming-view representation reversed.
pub fn format_path_line(path: &[AsNumber]) -> String {
    path.iter().rev().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asrel::{build_adj_list, parse_asrel};

    fn adj(asrel: &str) -> AdjList {
        build_adj_list(&parse_asrel(asrel.as_bytes()).unwrap())
    }

    fn origin(asn: &str) -> [Origin; 1] {
        [Origin {
            asn: asn.to_string(),
            kind: OriginKind::True,
        }]
    }

    fn as_path(hops: &[&str]) -> AsPath {
        hops.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn three_as_line() {
        // 1 is the provider of 2, 2 the provider of 3.
        let adj_list = adj("1|2|-1\n2|3|-1\n");
        let paths = compute_paths(&adj_list, "NIL", &origin("1"), &DefaultPolicy);

        assert_eq!(paths.len(), 3);
        assert_eq!(paths["1"], as_path(&["1"]));
        assert_eq!(paths["2"], as_path(&["1", "2"]));
        assert_eq!(paths["3"], as_path(&["1", "2", "3"]));
    }

    #[test]
    fn peer_shortcut_loses_to_direct_customer_edge() {
        let adj_list = adj("1|2|-1\n2|3|0\n1|3|-1\n");
        let paths = compute_paths(&adj_list, "NIL", &origin("1"), &DefaultPolicy);

        assert_eq!(paths["3"], as_path(&["1", "3"]));
    }

    #[test]
    fn one_hop_origin_gets_synthetic_edge() {
        // No real edge between 10 and 20; the spliced provider edge makes 20
        // announce [10, 20] without touching the shared adjacency list.
        let adj_list = adj("20|30|-1\n");
        let origins = [
            Origin {
                asn: "10".to_string(),
                kind: OriginKind::True,
            },
            Origin {
                asn: "20".to_string(),
                kind: OriginKind::OneHop,
            },
        ];
        let paths = compute_paths(&adj_list, "NIL", &origins, &DefaultPolicy);

        assert_eq!(paths["10"], as_path(&["10"]));
        assert_eq!(paths["20"], as_path(&["10", "20"]));
        assert!(adj_list.get("20").unwrap().iter().all(|e| e.asn != "10"));
    }

    #[test]
    fn installed_paths_end_at_their_key_and_are_loop_free() {
        let adj_list = adj("1|2|-1\n1|3|-1\n2|4|-1\n3|4|-1\n2|3|0\n4|5|-1\n");
        for origin_asn in ["1", "2", "3", "4", "5"] {
            let paths = compute_paths(&adj_list, "NIL", &origin(origin_asn), &DefaultPolicy);
            for (asn, path) in &paths {
                assert_eq!(path.last().unwrap(), asn);
                assert!(!path.is_empty());
                assert_eq!(path.iter().unique().count(), path.len());
            }
        }
    }

    /// Relationship tags along every emitted path must be a chain of provider
    /// climbs, at most one peer crossing, then customer descents.
    #[test]
    fn emitted_paths_are_valley_free() {
        let asrel = "1|2|-1\n1|3|-1\n2|4|-1\n3|5|-1\n2|3|0\n4|5|0\n3|6|-1\n";
        let lines = parse_asrel(asrel.as_bytes()).unwrap();
        let adj_list = build_adj_list(&lines);

        let rel_of = |from: &str, to: &str| {
            adj_list[from]
                .iter()
                .find(|e| e.asn == to)
                .map(|e| e.rel)
                .unwrap()
        };

        for origin_asn in ["1", "2", "3", "4", "5", "6"] {
            let paths = compute_paths(&adj_list, "NIL", &origin(origin_asn), &DefaultPolicy);
            for path in paths.values().filter(|p| p.len() > 1) {
                // 0 = climbing, 1 = crossed a peer edge, 2 = descending
                let mut state = 0;
                for (from, to) in path.iter().tuple_windows() {
                    match rel_of(from, to) {
                        Relationship::Provider => assert_eq!(state, 0, "climb after descent"),
                        Relationship::Peer => {
                            assert_eq!(state, 0, "second peer edge or peer after descent");
                            state = 1;
                        }
                        Relationship::Customer => state = 2,
                        Relationship::Sibling => unreachable!(),
                    }
                }
            }
        }
    }

    /// On a small graph with known all-pairs valley-free distances, the
    /// default policy must never install a longer path than the shortest one.
    #[test]
    fn default_policy_installs_shortest_paths() {
        let adj_list = adj("1|2|-1\n2|3|-1\n1|4|-1\n4|3|-1\n");
        let paths = compute_paths(&adj_list, "NIL", &origin("1"), &DefaultPolicy);

        // 3 is reachable as [1,2,3] and [1,4,3]; both have length 3, and the
        // lexicographic last-hop tiebreak selects the advertiser "2".
        assert_eq!(paths["3"], as_path(&["1", "2", "3"]));
        assert_eq!(paths["2"], as_path(&["1", "2"]));
        assert_eq!(paths["4"], as_path(&["1", "4"]));
    }

    #[test]
    fn vanilla_fan_out_matches_serial_runs() {
        let adj_list = adj("1|2|-1\n2|3|-1\n2|4|0\n4|5|-1\n");
        let mut asns: Vec<AsNumber> = adj_list.keys().cloned().collect();
        asns.sort();

        let all = compute_all_vanilla_paths(&asns, &adj_list, 2);

        assert_eq!(all.len(), asns.len());
        for asn in &asns {
            let serial = compute_paths(&adj_list, "NIL", &origin(asn), &DefaultPolicy);
            assert_eq!(all[asn], serial);
        }
    }

    #[test]
    fn format_reverses_incoming_view() {
        assert_eq!(format_path_line(&as_path(&["1", "2", "3"])), "3 2 1");
    }
}
