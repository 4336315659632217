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
//! Library for simulating inter-domain routing on the CAIDA AS graph.
//!
//! Two solvers sit at the core: a Gao-Rexford three-phase BFS that infers the
//! AS-level path every AS installs toward an announced prefix, and a Dovetail
//! sampler that draws randomized source-to-matchmaker paths through a
//! vertex-split "pathlet" graph. A flat on-disk hash index over emitted path
//! lines rounds out the toolchain.

/// An autonomous-system number, kept as its decimal string representation.
/// Equality and ordering are string equality and ordering throughout.
pub type AsNumber = String;

/// An AS-level path. The solver stores paths in incoming view: the first
/// element is the announcing origin, the last element is the receiver.
pub type AsPath = Vec<AsNumber>;

pub mod asrel;
pub mod bgp;
pub mod experiments;
pub mod graph;
pub mod pathlets;
pub mod pfi;
pub mod poly;
pub mod reach;
pub mod sampler;
pub mod util;

pub mod prelude {
    pub use super::{
        asrel::{build_adj_list, parse_asrel, AdjList, Relationship},
        bgp::{compute_all_vanilla_paths, compute_paths, DefaultPolicy, Origin, OriginKind},
        graph::{BinaryWdg, Graph},
        sampler::create_path_to_random_matchmaker,
        AsNumber, AsPath,
    };
}
