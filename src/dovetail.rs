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
//! Run the Dovetail sampling experiments until interrupted.

use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use dovesim::{
    asrel::parse_asrel,
    experiments::{multiple_connections_sample_no_tail, random_dovetail_path_no_tail},
    graph::{BinaryWdg, Weight, DEFAULT_DIAMETER},
    util, AsNumber,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Command {
    /// Emit the dovetail AS of each sampled path, one per line.
    Frq,
    /// Emit CSV rows for the repeated-connections security analysis.
    Conn,
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// ASN acting as the adversary in the `conn` analysis.
    #[arg(short, long, default_value = "3549")]
    adversary: AsNumber,
    /// Graph diameter limiting the depth of the sampler's DFS.
    #[arg(short, long, default_value_t = DEFAULT_DIAMETER)]
    diameter: Weight,
    /// Number of worker threads used while generating samples.
    #[arg(short = 'j', long, default_value_t = 1)]
    num_threads: usize,
    /// Number of matchmaker ASes drawn per sample.
    #[arg(short = 'm', long, default_value_t = 5)]
    num_matchmakers: usize,
    /// Maximum number of repeated connections per trial.
    #[arg(short = 'n', long, default_value_t = 100)]
    num_connections: usize,
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
    /// File with one loose-valley-free ASN per line. Without it, every AS is
    /// strict valley-free.
    #[arg(long)]
    loose_vf: Option<PathBuf>,
    /// CAIDA AS-relationship file defining the topology.
    asrel_file: PathBuf,
    /// Experiment to run.
    #[arg(value_enum)]
    command: Command,
}

fn read_loose_vf(path: &PathBuf) -> io::Result<BTreeSet<AsNumber>> {
    BufReader::new(File::open(path)?)
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.is_empty()))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    util::init_logging(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    log::debug!("{args:?}");

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .build_global()?;

    let as_rel = parse_asrel(BufReader::new(File::open(&args.asrel_file)?))?;
    let loose_vf_ases = match &args.loose_vf {
        Some(path) => read_loose_vf(path)?,
        None => BTreeSet::new(),
    };

    let mut rng = rand::thread_rng();

    match args.command {
        Command::Frq => {
            let mut stdout = io::stdout();
            loop {
                let dovetail = random_dovetail_path_no_tail::<BinaryWdg, _>(
                    &as_rel,
                    args.num_matchmakers,
                    args.diameter,
                    &loose_vf_ases,
                    &mut rng,
                );
                writeln!(stdout, "{}", dovetail.unwrap_or_default())?;
                stdout.flush()?;
            }
        }
        Command::Conn => {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(io::stdout());
            for sample_num in 0.. {
                multiple_connections_sample_no_tail::<BinaryWdg, _, _>(
                    &as_rel,
                    args.num_matchmakers,
                    args.num_connections,
                    args.diameter,
                    &args.adversary,
                    sample_num,
                    &loose_vf_ases,
                    &mut writer,
                    &mut rng,
                )?;
            }
        }
    }

    Ok(())
}
