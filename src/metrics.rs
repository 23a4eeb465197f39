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
//! Normalized performance metrics derived from the raw counters.

use crate::records::{Counter, ExperimentRun, Measurement};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExtractionError {
    /// Per-node normalization with no surviving node.
    #[error("Run {row} has no surviving nodes ({failing} of {hosts} failing)")]
    DivisionDomainError { row: usize, hosts: u32, failing: u32 },
    /// Normalization by the number of rounds with no round executed.
    #[error("The runs executed no rounds")]
    ZeroRounds,
}

/// How a raw counter is turned into a plotted metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDefinition {
    pub key: Counter,
    pub axis_label: &'static str,
    /// Used in plot titles, e.g. "Mean {title} vs. ..."
    pub title: &'static str,
    pub scale_factor: f64,
    /// Divide by the number of surviving nodes.
    pub per_node: bool,
}

pub const DURATION: MetricDefinition = MetricDefinition {
    key: Counter::Duration,
    axis_label: "time until signature (sec)",
    title: "protocol duration",
    scale_factor: 1.0,
    per_node: false,
};

pub const MESSAGES: MetricDefinition = MetricDefinition {
    key: Counter::Messages,
    axis_label: "messages sent per active node",
    title: "message count",
    scale_factor: 1.0,
    per_node: true,
};

pub const BYTES: MetricDefinition = MetricDefinition {
    key: Counter::Bytes,
    axis_label: "data sent per active node (kB)",
    title: "data transferred",
    scale_factor: 0.001,
    per_node: true,
};

pub const METRICS: [MetricDefinition; 3] = [DURATION, MESSAGES, BYTES];

/// Compute `metric` for every run, preserving the order.
///
/// The number of rounds is taken from the first run; the sanity checks ensure that it is constant.
/// Failed runs stay failed.
pub fn extract(
    runs: &[ExperimentRun],
    metric: &MetricDefinition,
) -> Result<Vec<Measurement>, ExtractionError> {
    let Some(rounds) = runs.first().map(|run| run.rounds) else {
        return Ok(Vec::new());
    };
    if rounds == 0 {
        return Err(ExtractionError::ZeroRounds);
    }
    let rounds = rounds as f64;

    runs.iter()
        .enumerate()
        .map(|(row, run)| {
            let factor = if metric.per_node {
                match run.surviving() {
                    Some(n) if n > 0 => metric.scale_factor / n as f64,
                    _ => {
                        return Err(ExtractionError::DivisionDomainError {
                            row,
                            hosts: run.hosts,
                            failing: run.failingleaves,
                        })
                    }
                }
            } else {
                metric.scale_factor
            };
            Ok(run.counter(metric.key).map(|v| v * factor / rounds))
        })
        .collect()
}
