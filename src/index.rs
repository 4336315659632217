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
//! Build the static hash index over a file of emitted path lines.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use dovesim::{pfi, util};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Path file to index, one space-separated path per line.
    path_file: PathBuf,
    /// Where to write the index.
    index_file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    util::init_logging(LevelFilter::Info);
    let args = Args::parse();

    log::info!("path file: {}", args.path_file.display());
    log::info!("index file: {}", args.index_file.display());

    pfi::build_index(&args.path_file, &args.index_file)?;
    Ok(())
}
