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
//! Infer the vanilla Gao-Rexford path from every AS to every other AS and
//! print one path per line, receiver first and origin last. Single-hop
//! paths are filtered out.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
    sync::Mutex,
};

use clap::Parser;
use log::LevelFilter;
use rayon::prelude::*;

use dovesim::{
    asrel::{build_adj_list, parse_asrel},
    bgp::{compute_all_vanilla_paths, format_path_line},
    util, AsNumber,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// CAIDA AS-relationship file defining the topology.
    asrel_file: PathBuf,
    /// Number of worker threads for the per-origin fan-out.
    num_threads: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    util::init_logging(LevelFilter::Info);
    let args = Args::parse();

    let as_rel = parse_asrel(BufReader::new(File::open(&args.asrel_file)?))?;
    let adj_list = build_adj_list(&as_rel);

    let mut asns: Vec<AsNumber> = adj_list.keys().cloned().collect();
    asns.sort();
    log::info!(
        "loaded {} relationship lines covering {} ASes",
        as_rel.len(),
        asns.len()
    );

    let indexed_paths_to = compute_all_vanilla_paths(&asns, &adj_list, args.num_threads);
    log::info!("path computation done, emitting paths");

    let stdout = Mutex::new(BufWriter::new(std::io::stdout()));
    indexed_paths_to.par_iter().for_each(|(_, indexed_paths)| {
        let lines: Vec<String> = indexed_paths
            .values()
            .map(|path| format_path_line(path))
            .filter(|line| line.contains(' '))
            .collect();

        let mut out = stdout.lock().unwrap();
        for line in &lines {
            writeln!(out, "{line}").unwrap();
        }
    });

    stdout.lock().unwrap().flush()?;
    Ok(())
}
