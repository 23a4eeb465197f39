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
//! Module describing the analysis scenarios and turning their datasets into plot-ready outputs.
//!
//! Each scenario is an independent batch computation: load the dataset(s), validate them, extract
//! the three standard metrics and group them by the swept dimension. A scenario that fails
//! produces no outputs at all, but does not affect any other scenario.

pub mod comparison;
pub mod definitions;
pub mod sweep;

pub use comparison::{ComparisonScenario, LoadedDataset};
pub use definitions::SCENARIOS;
pub use sweep::{SeriesLabel, SweepScenario, XAxis};

use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    metrics::{ExtractionError, MetricDefinition},
    records::{Attribute, DataSourceError, RecordSource},
    render::{RenderError, Renderer},
    validation::{SanityCheck, ValidationError},
};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),
    /// Two compared datasets disagree on an attribute they must share.
    #[error("Datasets disagree on `{attribute}`: {detail}")]
    CrossDatasetMismatch { attribute: Attribute, detail: String },
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// How the rendering collaborator should draw the points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotStyle {
    /// Mean per x value, connected, with markers.
    Line,
    Scatter,
    /// Individual samples at categorical x values.
    Strip,
    /// Grouped box plots.
    Box,
}

/// A single plotted sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub series: Option<String>,
}

/// Everything the rendering collaborator needs for a single figure.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOutput {
    /// Number of the scenario, used as the output directory.
    pub scenario: u8,
    /// Output name, `{metric_key}_{qualifier}`.
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: Option<String>,
    pub style: PlotStyle,
    /// Start the x axis at zero.
    pub x_from_zero: bool,
    /// Upper bound of the y axis. The y axis always starts at zero.
    pub y_max: Option<f64>,
    pub points: Vec<Point>,
}

impl PlotOutput {
    /// Points grouped by their series label. Series are sorted naturally by their label.
    pub fn series(&self) -> Vec<(Option<&str>, Vec<&Point>)> {
        self.points
            .iter()
            .into_group_map_by(|p| p.series.as_deref())
            .into_iter()
            .sorted_by(|(a, _), (b, _)| match (a, b) {
                (Some(a), Some(b)) => human_sort::compare(a, b),
                _ => a.cmp(b),
            })
            .collect()
    }
}

/// Fill in the `{metric}` and `{n}` placeholders of a title template.
pub(crate) fn format_title(template: &str, metric: &MetricDefinition, num_nodes: u32) -> String {
    template
        .replace("{metric}", metric.title)
        .replace("{n}", &num_nodes.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioKind {
    /// A single dataset, grouped by its sweep dimension.
    Sweep(SweepScenario),
    /// Several datasets overlaid on a shared x axis.
    Comparison(ComparisonScenario),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub id: u8,
    pub kind: ScenarioKind,
}

impl Scenario {
    /// Identifiers of all datasets this scenario loads.
    pub fn datasets(&self) -> Vec<&'static str> {
        match &self.kind {
            ScenarioKind::Sweep(s) => vec![s.dataset],
            ScenarioKind::Comparison(c) => c.datasets.iter().map(|(name, _)| *name).collect(),
        }
    }

    /// The sanity checks applied to each of the scenario's datasets.
    pub fn sanity_check(&self) -> SanityCheck {
        match &self.kind {
            ScenarioKind::Sweep(s) => s.sanity_check(),
            ScenarioKind::Comparison(c) => c.sanity_check(),
        }
    }

    /// Compute all outputs of this scenario without rendering anything.
    pub fn evaluate(&self, source: &impl RecordSource) -> Result<Vec<PlotOutput>, ScenarioError> {
        match &self.kind {
            ScenarioKind::Sweep(s) => s.evaluate(self.id, source),
            ScenarioKind::Comparison(c) => c.evaluate(self.id, source),
        }
    }

    /// Evaluate the scenario and hand all outputs to the `renderer`. Returns the number of outputs.
    ///
    /// If rendering fails, everything this scenario rendered so far is discarded again.
    pub fn run(
        &self,
        source: &impl RecordSource,
        renderer: &impl Renderer,
    ) -> Result<usize, ScenarioError> {
        log::info!("Running scenario {} on {:?}", self.id, self.datasets());
        let outputs = self.evaluate(source)?;
        for (i, output) in outputs.iter().enumerate() {
            if let Err(e) = renderer.render(output) {
                // the failing output may be partially written
                for rendered in outputs[..=i].iter() {
                    if let Err(e) = renderer.discard(rendered) {
                        log::warn!(
                            "Cannot discard {} of scenario {}: {e}",
                            rendered.name,
                            self.id
                        );
                    }
                }
                return Err(e.into());
            }
        }
        Ok(outputs.len())
    }
}

/// Get the scenario with the given number.
pub fn find(id: u8) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}

/// Run all `scenarios`, optionally in parallel. A failing scenario is logged and does not stop
/// the others.
pub fn run_scenarios<S, R>(
    scenarios: &[&Scenario],
    source: &S,
    renderer: &R,
    parallel: bool,
) -> Vec<(u8, Result<usize, ScenarioError>)>
where
    S: RecordSource + Sync,
    R: Renderer + Sync,
{
    let run = |scenario: &&Scenario| {
        let result = scenario.run(source, renderer);
        match &result {
            Ok(n) => log::info!("Scenario {} produced {n} outputs", scenario.id),
            Err(e) => log::error!("Scenario {} failed: {e}", scenario.id),
        }
        (scenario.id, result)
    };

    if parallel {
        scenarios.par_iter().map(run).collect()
    } else {
        scenarios.iter().map(run).collect()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::{collections::HashMap, io, sync::Mutex};

    use super::*;
    use crate::{
        records::{ExperimentRun, Measurement},
        test::run,
    };

    /// Keeps all rendered outputs in memory. Fails on the output with the name `fail_on`.
    #[derive(Default)]
    pub struct CollectingRenderer {
        pub outputs: Mutex<Vec<PlotOutput>>,
        pub fail_on: Option<&'static str>,
    }

    impl Renderer for CollectingRenderer {
        fn render(&self, output: &PlotOutput) -> Result<(), RenderError> {
            if self.fail_on == Some(output.name.as_str()) {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full").into());
            }
            self.outputs.lock().unwrap().push(output.clone());
            Ok(())
        }

        fn discard(&self, output: &PlotOutput) -> Result<(), RenderError> {
            self.outputs
                .lock()
                .unwrap()
                .retain(|o| (o.scenario, &o.name) != (output.scenario, &output.name));
            Ok(())
        }
    }

    /// Four runs that only differ in the number of failing nodes.
    pub fn failing_sweep() -> Vec<ExperimentRun> {
        (0..4)
            .map(|f| ExperimentRun {
                failingleaves: f,
                duration: Measurement::Recorded(1.0 + f as f64),
                messages: Measurement::Recorded(100.0 * (10 - f) as f64),
                bytes: Measurement::Recorded(10_000.0 * (10 - f) as f64),
                ..run()
            })
            .collect()
    }

    #[test]
    fn series_are_sorted_naturally() {
        let point = |s: &str| Point {
            x: 0.0,
            y: 1.0,
            series: Some(s.to_string()),
        };
        let output = PlotOutput {
            scenario: 2,
            name: "test".to_string(),
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            legend_title: None,
            style: PlotStyle::Scatter,
            x_from_zero: false,
            y_max: None,
            points: vec![point("10"), point("2"), point("0"), point("2")],
        };
        let series = output.series();
        let labels: Vec<_> = series.iter().map(|(l, _)| l.unwrap()).collect();
        assert_eq!(labels, vec!["0", "2", "10"]);
        assert_eq!(series[1].1.len(), 2);
    }

    #[test]
    fn failing_scenario_does_not_stop_others() {
        let mut source = HashMap::new();
        source.insert("simulations_3".to_string(), failing_sweep());
        // scenario 2 requires the delay to vary only together with the failing nodes, but the
        // rounds differ
        let mut broken = failing_sweep();
        broken[2].rounds = 3;
        source.insert("simulations_2".to_string(), broken);

        let renderer = CollectingRenderer::default();
        let scenarios = [find(2).unwrap(), find(3).unwrap(), find(4).unwrap()];
        let results = run_scenarios(&scenarios, &source, &renderer, true);

        let result = |id| &results.iter().find(|(i, _)| *i == id).unwrap().1;
        assert!(matches!(
            result(2),
            Err(ScenarioError::Validation(ValidationError::InvariantViolation(
                Attribute::Rounds
            )))
        ));
        assert_eq!(result(3).as_ref().unwrap(), &3);
        assert!(matches!(
            result(4),
            Err(ScenarioError::DataSource(DataSourceError::MissingDataset(_)))
        ));

        let outputs = renderer.outputs.into_inner().unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|o| o.scenario == 3));
    }

    #[test]
    fn render_failure_leaves_no_outputs() {
        let mut source = HashMap::new();
        source.insert("simulations_3".to_string(), failing_sweep());
        source.insert("simulations_6".to_string(), failing_sweep());

        let renderer = CollectingRenderer {
            fail_on: Some("bandwidth_tx_sum_by_failing"),
            ..Default::default()
        };
        let scenarios = [find(3).unwrap(), find(6).unwrap()];
        let results = run_scenarios(&scenarios, &source, &renderer, false);

        assert!(matches!(results[0], (3, Err(ScenarioError::Render(_)))));
        assert!(matches!(results[1], (6, Ok(3))));
        let outputs = renderer.outputs.into_inner().unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|o| o.scenario == 6));
    }

    #[test]
    fn zero_rounds_fail_the_scenario() {
        let runs = failing_sweep()
            .into_iter()
            .map(|run| ExperimentRun { rounds: 0, ..run })
            .collect();
        let mut source = HashMap::new();
        source.insert("simulations_3".to_string(), runs);

        let renderer = CollectingRenderer::default();
        assert!(matches!(
            find(3).unwrap().run(&source, &renderer),
            Err(ScenarioError::Extraction(ExtractionError::ZeroRounds))
        ));
        assert!(renderer.outputs.into_inner().unwrap().is_empty());
    }

    #[test]
    fn scenario_numbers_are_unique() {
        let ids: Vec<_> = SCENARIOS.iter().map(|s| s.id).sorted().collect();
        assert_eq!(ids, (1..=11).collect::<Vec<_>>());
    }
}
