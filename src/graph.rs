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
//! Binary-weighted directed multigraph used for the pathlet transformation.
//!
//! Every edge carries weight 0 or 1; the two weight classes are kept as
//! separate adjacency lists since all algorithms query them separately.

use ahash::HashMap;
use rayon::prelude::*;

pub type Vertex = u32;
pub type Weight = u32;

/// A path through the pathlet graph, as vertex ids.
pub type VertexPath = Vec<Vertex>;

/// Capability set every graph container must provide. The reachability and
/// sampling algorithms are generic over this trait rather than a concrete
/// container.
pub trait Graph: Sync {
    fn vertices(&self) -> &[Vertex];

    fn add_vertex(&mut self, u: Vertex);

    /// Add the directed edge `u -> v` with weight `w`, which must be 0 or 1.
    fn add_edge(&mut self, u: Vertex, v: Vertex, w: Weight);

    /// The neighbors of `u` through edges of weight `w`, or `None` if `u`
    /// has no such edges.
    fn adj_vertices(&self, u: Vertex, w: Weight) -> Option<&[Vertex]>;

    /// Sort all adjacency lists. Must be called before any concurrent reader
    /// observes the graph.
    fn sort_edge_lists(&mut self);

    /// Empty the graph, invalidating all vertex and edge references.
    fn reset(&mut self);
}

/// Adjacency-list container for the binary-weighted digraph.
#[derive(Debug, Default)]
pub struct BinaryWdg {
    vertices: Vec<Vertex>,
    zero_edges: HashMap<Vertex, Vec<Vertex>>,
    one_edges: HashMap<Vertex, Vec<Vertex>>,
}

impl BinaryWdg {
    pub fn new() -> Self {
        Self::default()
    }

    fn edges(&self, w: Weight) -> &HashMap<Vertex, Vec<Vertex>> {
        assert!(w <= 1);
        if w == 0 {
            &self.zero_edges
        } else {
            &self.one_edges
        }
    }

    fn edges_mut(&mut self, w: Weight) -> &mut HashMap<Vertex, Vec<Vertex>> {
        assert!(w <= 1);
        if w == 0 {
            &mut self.zero_edges
        } else {
            &mut self.one_edges
        }
    }
}

impl Graph for BinaryWdg {
    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn add_vertex(&mut self, u: Vertex) {
        self.vertices.push(u);
    }

    fn add_edge(&mut self, u: Vertex, v: Vertex, w: Weight) {
        self.edges_mut(w).entry(u).or_default().push(v);
    }

    fn adj_vertices(&self, u: Vertex, w: Weight) -> Option<&[Vertex]> {
        self.edges(w).get(&u).map(Vec::as_slice)
    }

    fn sort_edge_lists(&mut self) {
        self.zero_edges
            .par_iter_mut()
            .chain(self.one_edges.par_iter_mut())
            .for_each(|(_, list)| list.sort_unstable());
    }

    fn reset(&mut self) {
        self.vertices.clear();
        self.zero_edges.clear();
        self.one_edges.clear();
    }
}

/// Build the transpose graph: same vertices, every edge reversed, weights
/// preserved.
pub fn transpose<G: Graph + Default>(graph: &G) -> G {
    let mut transposed = G::default();

    for &u in graph.vertices() {
        transposed.add_vertex(u);
    }

    for w in 0..=1 {
        for &u in graph.vertices() {
            for &v in graph.adj_vertices(u, w).unwrap_or_default() {
                transposed.add_edge(v, u, w);
            }
        }
    }

    transposed
}

/// Upper bound on the hop length of shortest valley-free paths; the longest
/// Gao-Rexford shortest path observed on the CAIDA 2016-10 snapshot was 22.
/// Overridable from the CLI for other snapshots.
pub const DEFAULT_DIAMETER: Weight = 22;

#[cfg(test)]
mod test {
    use super::*;

    fn sample_graph() -> BinaryWdg {
        let mut g = BinaryWdg::new();
        for u in 0..4 {
            g.add_vertex(u);
        }
        g.add_edge(0, 1, 0);
        g.add_edge(1, 3, 1);
        g.add_edge(1, 2, 1);
        g.add_edge(2, 3, 0);
        g
    }

    #[test]
    fn adjacency_by_weight() {
        let g = sample_graph();
        assert_eq!(g.adj_vertices(0, 0), Some(&[1][..]));
        assert_eq!(g.adj_vertices(0, 1), None);
        assert_eq!(g.adj_vertices(1, 1), Some(&[3, 2][..]));
    }

    #[test]
    fn sort_orders_each_list() {
        let mut g = sample_graph();
        g.sort_edge_lists();
        assert_eq!(g.adj_vertices(1, 1), Some(&[2, 3][..]));
    }

    #[test]
    fn transpose_reverses_edges_and_keeps_weights() {
        let g = sample_graph();
        let t = transpose(&g);

        assert_eq!(t.vertices(), g.vertices());
        assert_eq!(t.adj_vertices(1, 0), Some(&[0][..]));
        assert_eq!(t.adj_vertices(3, 1), Some(&[1][..]));
        assert_eq!(t.adj_vertices(2, 1), Some(&[1][..]));
        assert_eq!(t.adj_vertices(3, 0), Some(&[2][..]));
        assert_eq!(t.adj_vertices(0, 0), None);
    }

    #[test]
    fn reset_empties_the_graph() {
        let mut g = sample_graph();
        g.reset();
        assert!(g.vertices().is_empty());
        assert_eq!(g.adj_vertices(0, 0), None);
    }
}
