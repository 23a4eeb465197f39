// CoSi-Eval: Validation and Comparison of Gossip-Based Signature Aggregation Simulations
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
use std::path::PathBuf;

use anyhow::{ensure, Context};
use clap::Parser;
use itertools::Itertools;

use cosi_eval::{
    records::ResultStore,
    render::PlotlyRenderer,
    scenarios::{self, Scenario, SCENARIOS},
    util,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Overwrite the input path for data.
    #[arg(short, long, default_value = "./test_data/")]
    data_path: String,
    /// Overwrite the output path for plots.
    #[arg(short, long, default_value = "./figures/")]
    output_path: String,
    /// Scenario to evaluate. Can be given multiple times; all scenarios are evaluated if omitted.
    #[arg(short, long)]
    scenario: Vec<u8>,
    /// Evaluate one scenario after the other.
    #[arg(long)]
    sequential: bool,
}

/// Resolve the scenario numbers given on the command line.
fn select(ids: &[u8]) -> anyhow::Result<Vec<&'static Scenario>> {
    if ids.is_empty() {
        return Ok(SCENARIOS.iter().collect());
    }
    ids.iter()
        .unique()
        .map(|id| {
            scenarios::find(*id).with_context(|| {
                format!(
                    "Unknown scenario {id}, expected one of {}",
                    SCENARIOS.iter().map(|s| s.id).join(", ")
                )
            })
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    util::init_logging();

    let args = Args::parse();

    let data_path = PathBuf::from(&args.data_path);
    ensure!(data_path.exists(), "Could not read data in {data_path:?}!");

    let selected = select(&args.scenario)?;
    let source = ResultStore::new(&data_path);
    let renderer = PlotlyRenderer::new(&args.output_path);
    log::info!(
        "Evaluating {} scenarios from {data_path:?} into {:?}",
        selected.len(),
        args.output_path
    );

    let results = scenarios::run_scenarios(&selected, &source, &renderer, !args.sequential);

    let failed = results
        .iter()
        .filter(|(_, result)| result.is_err())
        .map(|(id, _)| id)
        .collect_vec();
    let num_outputs: usize = results.iter().filter_map(|(_, r)| r.as_ref().ok()).sum();
    log::info!(
        "Produced {num_outputs} outputs from {} scenarios",
        results.len() - failed.len()
    );
    ensure!(
        failed.is_empty(),
        "Scenarios {} failed",
        failed.iter().join(", ")
    );

    Ok(())
}
