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
//! Overlay of differently produced datasets (a reference protocol instance and one or more
//! candidate aggregation strategies) for each node count.

use itertools::Itertools;

use crate::{
    metrics::{extract, MetricDefinition, DURATION, METRICS},
    records::{Attribute, ExperimentRun, RecordSource},
    validation::{validate, ParameterSweep, SanityCheck},
};

use super::{format_title, PlotOutput, PlotStyle, Point, ScenarioError};

/// A validated dataset together with its series label.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub name: &'static str,
    pub label: &'static str,
    pub runs: Vec<ExperimentRun>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonScenario {
    /// `(dataset, series label)`. The first dataset is the reference.
    pub datasets: &'static [(&'static str, &'static str)],
    pub style: PlotStyle,
    /// Prefix of all output names.
    pub prefix: &'static str,
    pub legend_title: Option<&'static str>,
    /// Upper y bound of an additional duration output with a tighter axis.
    pub zoomed_duration: Option<f64>,
}

fn mismatch(attribute: Attribute, detail: String) -> ScenarioError {
    ScenarioError::CrossDatasetMismatch { attribute, detail }
}

/// Check that `candidate` was produced for the same parameters as `reference`, run by run, and
/// that both executed a single round.
pub fn cross_check(
    reference: &LoadedDataset,
    candidate: &LoadedDataset,
) -> Result<(), ScenarioError> {
    for dataset in [reference, candidate] {
        if let Some((row, run)) = dataset.runs.iter().find_position(|run| run.rounds != 1) {
            return Err(mismatch(
                Attribute::Rounds,
                format!("run {row} of {} has {} rounds", dataset.name, run.rounds),
            ));
        }
    }

    if reference.runs.len() != candidate.runs.len() {
        return Err(mismatch(
            Attribute::Hosts,
            format!(
                "{} has {} runs, {} has {}",
                reference.name,
                reference.runs.len(),
                candidate.name,
                candidate.runs.len()
            ),
        ));
    }

    for (row, (r, c)) in reference.runs.iter().zip(candidate.runs.iter()).enumerate() {
        for attribute in [
            Attribute::Hosts,
            Attribute::FailingLeaves,
            Attribute::MinDelay,
            Attribute::MaxDelay,
        ] {
            if r.value(attribute) != c.value(attribute) {
                return Err(mismatch(
                    attribute,
                    format!(
                        "run {row}: {} has {:?}, {} has {:?}",
                        reference.name,
                        r.value(attribute),
                        candidate.name,
                        c.value(attribute)
                    ),
                ));
            }
        }
    }

    Ok(())
}

/// Distinct node counts in order of first appearance.
pub fn node_counts(runs: &[ExperimentRun]) -> Vec<u32> {
    runs.iter().map(|run| run.hosts).unique().collect()
}

/// Points of all datasets for a single metric, restricted to `num_nodes`. The x value is the
/// number of failing nodes, the series is the dataset label.
pub fn comparison_points(
    datasets: &[LoadedDataset],
    num_nodes: u32,
    metric: &MetricDefinition,
) -> Result<Vec<Point>, ScenarioError> {
    let mut points = Vec::new();
    for dataset in datasets {
        let part = dataset
            .runs
            .iter()
            .filter(|run| run.hosts == num_nodes)
            .cloned()
            .collect_vec();
        let ys = extract(&part, metric)?;
        points.extend(part.iter().zip(ys).filter_map(|(run, y)| {
            y.value().map(|y| Point {
                x: run.failingleaves as f64,
                y,
                series: Some(dataset.label.to_string()),
            })
        }));
    }
    Ok(points)
}

impl ComparisonScenario {
    pub fn sanity_check(&self) -> SanityCheck {
        SanityCheck::new(ParameterSweep::new([
            Attribute::Hosts,
            Attribute::FailingLeaves,
        ]))
    }

    pub fn evaluate(
        &self,
        id: u8,
        source: &impl RecordSource,
    ) -> Result<Vec<PlotOutput>, ScenarioError> {
        let check = self.sanity_check();
        let datasets = self
            .datasets
            .iter()
            .map(|&(name, label)| {
                Ok(LoadedDataset {
                    name,
                    label,
                    runs: validate(source.load(name)?, &check)?,
                })
            })
            .collect::<Result<Vec<_>, ScenarioError>>()?;
        self.outputs(id, &datasets)
    }

    /// Cross-check the validated datasets and compute all outputs.
    pub fn outputs(
        &self,
        id: u8,
        datasets: &[LoadedDataset],
    ) -> Result<Vec<PlotOutput>, ScenarioError> {
        let Some((reference, candidates)) = datasets.split_first() else {
            return Ok(Vec::new());
        };
        for candidate in candidates {
            cross_check(reference, candidate)?;
        }

        let mut outputs = Vec::new();
        for num_nodes in node_counts(&reference.runs) {
            for metric in METRICS.iter() {
                outputs.push(self.output(
                    id,
                    format!("{}{}_{num_nodes}", self.prefix, metric.key),
                    metric,
                    num_nodes,
                    None,
                    comparison_points(datasets, num_nodes, metric)?,
                ));
            }
            if let Some(y_max) = self.zoomed_duration {
                outputs.push(self.output(
                    id,
                    format!("{}{}_zoomed_{num_nodes}", self.prefix, DURATION.key),
                    &DURATION,
                    num_nodes,
                    Some(y_max),
                    comparison_points(datasets, num_nodes, &DURATION)?,
                ));
            }
        }
        Ok(outputs)
    }

    fn output(
        &self,
        id: u8,
        name: String,
        metric: &MetricDefinition,
        num_nodes: u32,
        y_max: Option<f64>,
        points: Vec<Point>,
    ) -> PlotOutput {
        PlotOutput {
            scenario: id,
            name,
            title: format_title("Comparison of {metric} (n={n})", metric, num_nodes),
            x_label: "failing nodes".to_string(),
            y_label: metric.axis_label.to_string(),
            legend_title: self.legend_title.map(str::to_string),
            style: self.style,
            x_from_zero: false,
            y_max,
            points,
        }
    }
}
