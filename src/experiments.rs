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
//! The two Dovetail experiments.
//!
//! `frq` samples source-to-matchmaker paths and reports the dovetail AS of
//! each. `conn` simulates repeated connections of one source and tracks how
//! quickly an adversary sitting at the dovetail position can shrink the set
//! of ASes that could plausibly be the true source.
//!
//! Both experiments rebuild the pathlet graph per sample so the matchmaker
//! set is re-drawn every time.

use std::collections::BTreeSet;
use std::io::Write;

use rand::Rng;
use serde::Serialize;

use dovesim_utils::sampling::{random_sample, single_random_sample};

use crate::{
    asrel::AsRelLine,
    graph::{transpose, Graph, Vertex, Weight},
    pathlets::{graph_path_to_as_path, init_graph_and_properties, DovetailProperties},
    reach::compute_available_costs,
    sampler::create_path_to_random_matchmaker,
    AsNumber,
};

/// Upper bound on the number of equal-cost paths the DFS collects per sample.
pub const MAX_NUM_PATHS: usize = 20_000;

/// The dovetail AS sits three hops before the matchmaker; together with the
/// source, its previous hop, and the matchmaker side this requires at least
/// six ASes on the segment.
pub const MIN_AS_PATH_LEN: usize = 6;

fn dovetail_asn(as_path: &[AsNumber]) -> &AsNumber {
    assert!(as_path.len() >= MIN_AS_PATH_LEN);
    &as_path[as_path.len() - 3]
}

fn build_sample_graphs<G, R>(
    as_rel: &[AsRelLine],
    num_matchmakers: usize,
    loose_vf_ases: &BTreeSet<AsNumber>,
    rng: &mut R,
) -> (G, G, DovetailProperties)
where
    G: Graph + Default,
    R: Rng + ?Sized,
{
    let (mut graph, props) =
        init_graph_and_properties::<G, _>(as_rel, num_matchmakers, loose_vf_ases, rng);
    graph.sort_edge_lists();
    let mut transpose_graph = transpose(&graph);
    transpose_graph.sort_edge_lists();
    (graph, transpose_graph, props)
}

/// Draw one path from a random endhost source to a random matchmaker and
/// return its dovetail AS, or `None` when the source has no eligible
/// matchmaker.
pub fn random_dovetail_path_no_tail<G, R>(
    as_rel: &[AsRelLine],
    num_matchmakers: usize,
    graph_diameter: Weight,
    loose_vf_ases: &BTreeSet<AsNumber>,
    rng: &mut R,
) -> Option<AsNumber>
where
    G: Graph + Default,
    R: Rng + ?Sized,
{
    let (graph, transpose_graph, props) =
        build_sample_graphs::<G, _>(as_rel, num_matchmakers, loose_vf_ases, rng);

    let endhost_ases: Vec<&AsNumber> = props.endhost_ases.iter().collect();
    let source_asn = (*single_random_sample(&endhost_ases, rng)?).clone();

    let chosen_path = create_path_to_random_matchmaker(
        &graph,
        &transpose_graph,
        graph_diameter,
        &source_asn,
        &props,
        MAX_NUM_PATHS,
        graph_diameter as usize * 3,
        rng,
    )?;

    let as_path = graph_path_to_as_path(&chosen_path, &props);
    Some(dovetail_asn(&as_path).clone())
}

/// One row of the repeated-connections analysis.
#[derive(Debug, Serialize)]
pub struct ConnRecord {
    pub adversary: AsNumber,
    pub sample: usize,
    pub connection: usize,
    pub num_possible_sources: usize,
}

/// Simulate up to `max_num_conn` repeated connections of one random endhost
/// source. Whenever the dovetail AS of a sampled path equals the adversary,
/// the adversary's view (back-reachability at the distance of the dovetail's
/// previous hop) is intersected into the set of possible source ASes, which
/// shrinks monotonically. One [`ConnRecord`] is emitted per connection.
///
/// Returns `Ok(false)` when the chosen source lost connectivity mid-trial.
#[allow(clippy::too_many_arguments)]
pub fn multiple_connections_sample_no_tail<G, W, R>(
    as_rel: &[AsRelLine],
    num_matchmakers: usize,
    max_num_conn: usize,
    graph_diameter: Weight,
    adversary_asn: &str,
    sample_num: usize,
    loose_vf_ases: &BTreeSet<AsNumber>,
    writer: &mut csv::Writer<W>,
    rng: &mut R,
) -> Result<bool, csv::Error>
where
    G: Graph + Default,
    W: Write,
    R: Rng + ?Sized,
{
    let (graph, transpose_graph, props) =
        build_sample_graphs::<G, _>(as_rel, num_matchmakers, loose_vf_ases, rng);

    let Some(source_asn) = random_sample(props.endhost_ases.iter().cloned(), 1, rng).pop() else {
        return Ok(false);
    };

    let mut possible_ases: BTreeSet<AsNumber> = props.endhost_ases.clone();

    for connection in 0..=max_num_conn {
        writer.serialize(ConnRecord {
            adversary: adversary_asn.to_string(),
            sample: sample_num,
            connection,
            num_possible_sources: possible_ases.len(),
        })?;
        writer.flush()?;

        let Some(chosen_path) = create_path_to_random_matchmaker(
            &graph,
            &transpose_graph,
            graph_diameter,
            &source_asn,
            &props,
            MAX_NUM_PATHS,
            graph_diameter as usize * 3,
            rng,
        ) else {
            // Source AS without general Internet connectivity.
            return Ok(false);
        };

        let as_path = graph_path_to_as_path(&chosen_path, &props);
        let mm_asn = as_path.last().unwrap().clone();
        let dovetail_asn = dovetail_asn(&as_path);

        if dovetail_asn != adversary_asn {
            continue;
        }

        // The adversary sees the hop it received the path from; every AS
        // whose host vertex is back-reachable at that distance could have
        // been the source.
        let dovetail_vertex_pos = chosen_path
            .iter()
            .position(|&u| props.owner(u) == dovetail_asn)
            .expect("dovetail AS must own a vertex of the chosen path");
        let prev_hop_vertex: Vertex = chosen_path[dovetail_vertex_pos - 1];

        let cost_to_dovetail = as_path
            .iter()
            .position(|asn| asn == dovetail_asn)
            .unwrap() as Weight;
        let cost_to_prev_hop = cost_to_dovetail - 1;

        let true_source_vertex = chosen_path[0];
        let true_source_asn = props.owner(true_source_vertex);

        let cost_map =
            compute_available_costs(&transpose_graph, prev_hop_vertex, cost_to_prev_hop);
        let back_reachable = cost_map
            .get(&cost_to_prev_hop)
            .expect("back-reachability at the previous hop's distance cannot be empty");
        assert!(
            back_reachable.contains(&true_source_vertex),
            "true source must be back-reachable from its own path"
        );

        let mut possible_current: BTreeSet<AsNumber> = back_reachable
            .iter()
            .map(|&u| props.owner(u).clone())
            .collect();

        // The source never picks a matchmaker colocated in its own AS.
        possible_current.remove(&mm_asn);

        possible_ases = possible_ases
            .intersection(&possible_current)
            .cloned()
            .collect();

        assert!(
            possible_ases.contains(true_source_asn),
            "the true source can never be ruled out"
        );
    }

    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asrel::parse_asrel;
    use crate::graph::BinaryWdg;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CHAIN: &str = "301|302|-1\n302|303|-1\n303|304|-1\n304|305|-1\n\
                         305|306|-1\n306|307|-1\n307|308|-1\n";

    #[test]
    fn frq_reports_the_third_from_last_as() {
        let lines = parse_asrel(CHAIN.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        // All ASes are matchmakers; the only endhost source is 308, and the
        // reachable matchmakers sit six or seven hops up the chain.
        let dovetail = random_dovetail_path_no_tail::<BinaryWdg, _>(
            &lines,
            8,
            22,
            &BTreeSet::new(),
            &mut rng,
        )
        .expect("chain always has an eligible matchmaker");

        // Matchmaker 301 makes the dovetail 303, matchmaker 302 makes it 304.
        assert!(["303", "304"].contains(&dovetail.as_str()));
    }

    #[test]
    fn conn_emits_one_row_per_connection() {
        let lines = parse_asrel(CHAIN.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        // The adversary never matches, so the trial runs all connections.
        let completed = multiple_connections_sample_no_tail::<BinaryWdg, _, _>(
            &lines,
            8,
            3,
            22,
            "9999",
            0,
            &BTreeSet::new(),
            &mut writer,
            &mut rng,
        )
        .unwrap();
        assert!(completed);

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 4);
        for (i, row) in rows.iter().enumerate() {
            // 308 is the only endhost, so one possible source throughout.
            assert_eq!(*row, format!("9999,0,{i},1"));
        }
    }

    #[test]
    fn conn_record_serializes_as_plain_csv_row() {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .serialize(ConnRecord {
                adversary: "3549".to_string(),
                sample: 1,
                connection: 2,
                num_possible_sources: 42,
            })
            .unwrap();

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "3549,1,2,42\n");
    }
}
