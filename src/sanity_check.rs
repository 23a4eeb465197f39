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
    records::{ExperimentRun, RecordSource, ResultStore},
    scenarios::{self, Scenario, SCENARIOS},
    util,
    validation::{self, SanityCheck},
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Overwrite the input path for data.
    #[arg(short, long, default_value = "./test_data/")]
    data_path: String,
    /// Scenario to check. Can be given multiple times; all scenarios are checked if omitted.
    #[arg(short, long)]
    scenario: Vec<u8>,
}

/// Print the distinct values each swept attribute takes.
fn print_sweep(runs: &[ExperimentRun], check: &SanityCheck) {
    for attribute in check.sweep.attributes() {
        let values = runs
            .iter()
            .map(|run| match run.value(attribute) {
                Some(v) => format!("{v}"),
                None => "-".to_string(),
            })
            .unique()
            .sorted_by(|a, b| human_sort::compare(a, b))
            .join(", ");
        println!("    {attribute}: {values}");
    }
}

/// Print the protocol failure rate per number of failing nodes.
fn print_failure_rates(runs: &[ExperimentRun]) {
    for (failing, rate) in validation::failure_rates(runs) {
        println!("    {failing:>4} failing: {:>6.2}% failed", rate * 100.0);
    }
}

/// Check all datasets of a scenario. Returns whether the scenario as a whole is consistent.
fn check_scenario(scenario: &Scenario, source: &ResultStore) -> bool {
    println!("Scenario {}:", scenario.id);
    let check = scenario.sanity_check();

    for dataset in scenario.datasets() {
        let runs = match source.load(dataset) {
            Ok(runs) => runs,
            Err(e) => {
                println!("  {dataset}: {e}");
                continue;
            }
        };
        match check.check(&runs) {
            Ok(()) => println!("  {dataset}: {} runs ok", runs.len()),
            Err(e) => println!("  {dataset}: {} runs, {e}", runs.len()),
        }
        print_sweep(&runs, &check);

        // protocol failures are expected here
        if check.clone().tolerate_failures().check(&runs).is_ok() {
            print_failure_rates(&runs);
        }
    }

    // also covers the cross-checks between compared datasets
    match scenario.evaluate(source) {
        Ok(outputs) => {
            println!("  -> {} outputs", outputs.len());
            true
        }
        Err(e) => {
            log::error!("Scenario {} failed: {e}", scenario.id);
            false
        }
    }
}

fn main() -> anyhow::Result<()> {
    util::init_logging();

    let args = Args::parse();

    let data_path = PathBuf::from(&args.data_path);
    ensure!(data_path.exists(), "Could not read data in {data_path:?}!");
    let source = ResultStore::new(&data_path);
    log::info!(
        "Found datasets: {}",
        source
            .datasets()
            .context("Cannot list the datasets")?
            .join(", ")
    );

    let selected: Vec<&Scenario> = if args.scenario.is_empty() {
        SCENARIOS.iter().collect()
    } else {
        args.scenario
            .iter()
            .unique()
            .map(|id| scenarios::find(*id).with_context(|| format!("Unknown scenario {id}")))
            .collect::<anyhow::Result<_>>()?
    };

    let failed = selected
        .into_iter()
        .filter(|scenario| !check_scenario(scenario, &source))
        .map(|scenario| scenario.id)
        .collect_vec();
    ensure!(
        failed.is_empty(),
        "Scenarios {} are inconsistent",
        failed.iter().join(", ")
    );

    Ok(())
}
