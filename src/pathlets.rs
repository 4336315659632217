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
//! Pathlet transformation of the AS graph.
//!
//! Every AS is split into a small vertex gadget encoding the transit roles it
//! permits. Crossing between two ASes always costs 1, moving inside a gadget
//! costs 0, and a valley-free path in the AS graph corresponds exactly to a
//! minimum-weight path here. Host vertices are split into an in and an out
//! side so that no path can transit *through* an endhost or matchmaker AS.

use std::collections::BTreeSet;

use ahash::HashMap;
use rand::Rng;

use dovesim_utils::sampling::random_sample;

use crate::{
    asrel::{find_endhost_ases, unique_ases, AsRelLine, LinkType},
    graph::{Graph, Vertex},
    AsNumber, AsPath,
};

/// Per-AS vertex roles of the pathlet graph, together with the AS sets the
/// Dovetail sampler needs.
#[derive(Debug, Default)]
pub struct DovetailProperties {
    pub customer_in: HashMap<AsNumber, Vertex>,
    pub customer_out: HashMap<AsNumber, Vertex>,
    pub host_in: HashMap<AsNumber, Vertex>,
    pub host_out: HashMap<AsNumber, Vertex>,
    pub peer_in: HashMap<AsNumber, Vertex>,
    pub peer_out: HashMap<AsNumber, Vertex>,
    pub provider_in: HashMap<AsNumber, Vertex>,
    pub provider_out: HashMap<AsNumber, Vertex>,

    pub endhost_ases: BTreeSet<AsNumber>,
    pub loose_vf_ases: BTreeSet<AsNumber>,
    pub matchmaker_ases: BTreeSet<AsNumber>,

    pub vertex_owner: HashMap<Vertex, AsNumber>,
}

impl DovetailProperties {
    /// The AS owning `u`. A vertex without an owner is a construction bug.
    pub fn owner(&self, u: Vertex) -> &AsNumber {
        self.vertex_owner
            .get(&u)
            .unwrap_or_else(|| panic!("vertex {u} has no owner"))
    }
}

/// Build the pathlet graph and its properties from parsed relationship
/// records. `num_matchmakers` ASes are drawn uniformly from all ASes;
/// `loose_vf_ases` selects which ASes get the relaxed three-vertex gadget
/// (every other AS is strict valley-free).
pub fn init_graph_and_properties<G, R>(
    as_rel: &[AsRelLine],
    num_matchmakers: usize,
    loose_vf_ases: &BTreeSet<AsNumber>,
    rng: &mut R,
) -> (G, DovetailProperties)
where
    G: Graph + Default,
    R: Rng + ?Sized,
{
    let mut graph = G::default();
    let mut props = DovetailProperties {
        endhost_ases: find_endhost_ases(as_rel),
        loose_vf_ases: loose_vf_ases.clone(),
        ..Default::default()
    };

    let ases = unique_ases(as_rel);
    props.matchmaker_ases = random_sample(ases.iter().cloned(), num_matchmakers, rng)
        .into_iter()
        .collect();

    // Internal pathlets: one gadget per AS.
    let mut ctr: Vertex = 0;

    for asn in &ases {
        let mut add_vertex = |graph: &mut G, props: &mut DovetailProperties| {
            let u = ctr;
            ctr += 1;
            graph.add_vertex(u);
            props.vertex_owner.insert(u, asn.clone());
            u
        };

        let top = add_vertex(&mut graph, &mut props);
        let bottom = add_vertex(&mut graph, &mut props);

        if props.loose_vf_ases.contains(asn) {
            let middle = add_vertex(&mut graph, &mut props);

            props.provider_in.insert(asn.clone(), bottom);
            props.provider_out.insert(asn.clone(), top);
            props.customer_in.insert(asn.clone(), top);
            props.customer_out.insert(asn.clone(), bottom);
            props.peer_in.insert(asn.clone(), middle);
            props.peer_out.insert(asn.clone(), middle);

            graph.add_edge(top, middle, 0);
            graph.add_edge(top, bottom, 0);
            graph.add_edge(middle, bottom, 0);
        } else {
            props.provider_in.insert(asn.clone(), top);
            props.provider_out.insert(asn.clone(), bottom);
            props.customer_in.insert(asn.clone(), bottom);
            props.customer_out.insert(asn.clone(), top);
            props.peer_in.insert(asn.clone(), top);
            props.peer_out.insert(asn.clone(), bottom);

            graph.add_edge(bottom, top, 0);
        }

        // Host vertices exist iff the AS hosts endpoints; splitting them
        // keeps any transit path out of host ASes.
        if props.endhost_ases.contains(asn) || props.matchmaker_ases.contains(asn) {
            let host_in = add_vertex(&mut graph, &mut props);
            let host_out = add_vertex(&mut graph, &mut props);

            props.host_in.insert(asn.clone(), host_in);
            props.host_out.insert(asn.clone(), host_out);

            graph.add_edge(host_out, props.customer_in[asn], 0);
            graph.add_edge(props.customer_out[asn], host_in, 0);
        }
    }

    // External pathlets: every inter-AS hop costs 1.
    for line in as_rel {
        match line.link {
            LinkType::ProviderCustomer => {
                let (provider, customer) = (&line.x, &line.y);
                graph.add_edge(
                    props.provider_out[customer],
                    props.customer_in[provider],
                    1,
                );
                graph.add_edge(
                    props.customer_out[provider],
                    props.provider_in[customer],
                    1,
                );
            }
            LinkType::PeerPeer => {
                graph.add_edge(props.peer_out[&line.x], props.peer_in[&line.y], 1);
                graph.add_edge(props.peer_out[&line.y], props.peer_in[&line.x], 1);
            }
        }
    }

    (graph, props)
}

/// Collapse a pathlet-graph path to the AS level by mapping every vertex to
/// its owner and deduplicating consecutive repeats.
pub fn graph_path_to_as_path(graph_path: &[Vertex], props: &DovetailProperties) -> AsPath {
    let mut as_path = AsPath::new();

    for &u in graph_path {
        let asn = props.owner(u);
        if as_path.last() != Some(asn) {
            as_path.push(asn.clone());
        }
    }

    as_path
}
