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
//! Library for validating and comparing the results of gossip-based signature aggregation
//! simulations.
//!
//! Simulation results are loaded from CSV files (one row per experiment run), checked for
//! consistency, reduced to per-node metrics, and grouped into plot-ready outputs for each analysis
//! scenario.

pub mod metrics;
pub mod records;
pub mod render;
pub mod scenarios;
pub mod util;
pub mod validation;

pub mod prelude {
    pub use super::{
        metrics::{MetricDefinition, METRICS},
        records::{Attribute, Counter, ExperimentRun, Measurement, RecordSource, ResultStore},
        render::{PlotlyRenderer, Renderer},
        scenarios::{run_scenarios, PlotOutput, Scenario, ScenarioError, SCENARIOS},
        validation::{ParameterSweep, SanityCheck},
    };
}

#[cfg(test)]
mod test;
