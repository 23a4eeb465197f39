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
//! Single-dataset scenarios, grouped by the swept attribute and an optional series label.

use crate::{
    metrics::{extract, METRICS},
    records::{Attribute, ExperimentRun, Measurement, RecordSource},
    validation::{validate, ParameterSweep, SanityCheck, ValidationError},
};

use super::{format_title, PlotOutput, PlotStyle, Point, ScenarioError};

/// Maximum deviation of the mean delay for scenarios that sweep over the delay range.
pub const MEAN_DELAY_TOLERANCE: f64 = 1e-6;

/// Source of the x value of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxis {
    /// A recorded attribute. [`Attribute::Delay`] yields the mean delay.
    Attribute(Attribute),
    /// `maxdelay - mindelay`. Requires the mean delay to be constant.
    DelayRange,
}

/// Secondary label used to split the points into series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesLabel {
    None,
    /// Number of failing nodes, e.g. `"3"`.
    FailingLeaves,
    /// Aggregation strategy.
    TreeMode,
    /// Mean message delay, e.g. `"0.15s"`.
    MeanDelay,
}

impl SeriesLabel {
    pub fn label(self, run: &ExperimentRun) -> Option<String> {
        match self {
            Self::None => None,
            Self::FailingLeaves => Some(run.failingleaves.to_string()),
            Self::TreeMode => Some(
                if run.treemode == Some(true) {
                    "tree-based aggregation"
                } else {
                    "no early aggregation"
                }
                .to_string(),
            ),
            Self::MeanDelay => Some(format!("{:.2}s", run.mean_delay())),
        }
    }
}

/// Compute the x value of every run.
pub fn x_values(runs: &[ExperimentRun], axis: XAxis) -> Result<Vec<f64>, ValidationError> {
    match axis {
        XAxis::Attribute(attribute) => runs
            .iter()
            .enumerate()
            .map(|(row, run)| {
                run.value(attribute)
                    .ok_or(ValidationError::MissingAttribute { attribute, row })
            })
            .collect(),
        XAxis::DelayRange => {
            if let Some(first) = runs.first() {
                let mean = first.mean_delay();
                if runs
                    .iter()
                    .any(|run| (run.mean_delay() - mean).abs() >= MEAN_DELAY_TOLERANCE)
                {
                    return Err(ValidationError::InvariantViolation(Attribute::Delay));
                }
            }
            Ok(runs.iter().map(ExperimentRun::delay_range).collect())
        }
    }
}

pub fn series_labels(runs: &[ExperimentRun], series: SeriesLabel) -> Vec<Option<String>> {
    runs.iter().map(|run| series.label(run)).collect()
}

/// Zip x values, metric values and series labels into points. Failed runs are skipped.
pub fn points(xs: &[f64], ys: &[Measurement], labels: &[Option<String>]) -> Vec<Point> {
    xs.iter()
        .zip(ys)
        .zip(labels)
        .filter_map(|((x, y), series)| {
            y.value().map(|y| Point {
                x: *x,
                y,
                series: series.clone(),
            })
        })
        .collect()
}

/// A scenario evaluating a single dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepScenario {
    pub dataset: &'static str,
    /// Attributes that are allowed to vary.
    pub sweep: &'static [Attribute],
    pub x_axis: XAxis,
    pub x_label: &'static str,
    pub series: SeriesLabel,
    pub legend_title: Option<&'static str>,
    pub style: PlotStyle,
    /// Title template with `{metric}` and `{n}` placeholders.
    pub title: &'static str,
    /// Suffix of the output names.
    pub qualifier: &'static str,
}

impl SweepScenario {
    pub fn sanity_check(&self) -> SanityCheck {
        SanityCheck::new(ParameterSweep::new(self.sweep.iter().copied()))
    }

    pub fn evaluate(
        &self,
        id: u8,
        source: &impl RecordSource,
    ) -> Result<Vec<PlotOutput>, ScenarioError> {
        let runs = validate(source.load(self.dataset)?, &self.sanity_check())?;
        self.outputs(id, &runs)
    }

    /// Compute one output per metric from already validated runs.
    pub fn outputs(
        &self,
        id: u8,
        runs: &[ExperimentRun],
    ) -> Result<Vec<PlotOutput>, ScenarioError> {
        let Some(num_nodes) = runs.first().map(|run| run.hosts) else {
            return Err(ValidationError::EmptyDataset.into());
        };
        let xs = x_values(runs, self.x_axis)?;
        let labels = series_labels(runs, self.series);

        METRICS
            .iter()
            .map(|metric| {
                let ys = extract(runs, metric)?;
                Ok(PlotOutput {
                    scenario: id,
                    name: format!("{}_{}", metric.key, self.qualifier),
                    title: format_title(self.title, metric, num_nodes),
                    x_label: self.x_label.to_string(),
                    y_label: metric.axis_label.to_string(),
                    legend_title: self.legend_title.map(str::to_string),
                    style: self.style,
                    x_from_zero: self.style == PlotStyle::Line,
                    y_max: None,
                    points: points(&xs, &ys, &labels),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        metrics::{BYTES, DURATION, MESSAGES},
        scenarios::{find, test::failing_sweep, ScenarioKind},
        test::{check_close, run},
    };

    fn sweep_of(id: u8) -> &'static SweepScenario {
        match &find(id).unwrap().kind {
            ScenarioKind::Sweep(s) => s,
            ScenarioKind::Comparison(_) => panic!("scenario {id} is a comparison"),
        }
    }

    #[test]
    fn failing_nodes_end_to_end() {
        let runs = failing_sweep();
        let scenario = sweep_of(3);
        let runs = validate(runs, &scenario.sanity_check()).unwrap();
        let outputs = scenario.outputs(3, &runs).unwrap();

        assert_eq!(outputs.len(), 3);
        let names: Vec<_> = outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "round_wall_sum_by_failing",
                "bandwidth_msg_tx_sum_by_failing",
                "bandwidth_tx_sum_by_failing"
            ]
        );

        for (output, metric) in outputs.iter().zip([DURATION, MESSAGES, BYTES]) {
            assert_eq!(output.points.len(), 4);
            assert_eq!(output.y_label, metric.axis_label);
            let xs: Vec<_> = output.points.iter().map(|p| p.x).collect();
            assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
            assert!(output.points.iter().all(|p| p.series.is_none()));
        }
        assert_eq!(
            outputs[0].title,
            "Mean protocol duration vs. number of failing nodes (n=10)"
        );

        // 100 * (10 - f) messages over (10 - f) surviving nodes
        for p in outputs[1].points.iter() {
            check_close(100.0, p.y);
        }
        // 10 kB per surviving node
        for p in outputs[2].points.iter() {
            check_close(10.0, p.y);
        }
    }

    #[test]
    fn mean_delay_axis() {
        let runs = vec![
            ExperimentRun {
                mindelay: 2.0,
                maxdelay: 4.0,
                ..run()
            };
            3
        ];
        assert_eq!(
            x_values(&runs, XAxis::Attribute(Attribute::Delay)).unwrap(),
            vec![3.0; 3]
        );
        assert_eq!(x_values(&runs, XAxis::DelayRange).unwrap(), vec![2.0; 3]);
    }

    #[test]
    fn delay_range_requires_constant_mean() {
        let runs = vec![
            ExperimentRun {
                mindelay: 2.0,
                maxdelay: 4.0,
                ..run()
            },
            ExperimentRun {
                mindelay: 1.0,
                maxdelay: 5.0,
                ..run()
            },
            ExperimentRun {
                mindelay: 1.0,
                maxdelay: 5.0 + 1e-8,
                ..run()
            },
        ];
        let xs = x_values(&runs, XAxis::DelayRange).unwrap();
        for (exp, acq) in [2.0, 4.0, 4.0 + 1e-8].into_iter().zip(xs) {
            check_close(exp, acq);
        }

        let shifted = vec![
            runs[0].clone(),
            ExperimentRun {
                mindelay: 2.5,
                maxdelay: 4.5,
                ..run()
            },
        ];
        assert_eq!(
            x_values(&shifted, XAxis::DelayRange),
            Err(ValidationError::InvariantViolation(Attribute::Delay))
        );
    }

    #[test]
    fn missing_axis_attribute() {
        let runs = vec![
            run(),
            ExperimentRun {
                rumorpeers: None,
                ..run()
            },
        ];
        assert_eq!(
            x_values(&runs, XAxis::Attribute(Attribute::RumorPeers)),
            Err(ValidationError::MissingAttribute {
                attribute: Attribute::RumorPeers,
                row: 1
            })
        );
    }

    #[test]
    fn series_label_formats() {
        let r = ExperimentRun {
            failingleaves: 3,
            mindelay: 0.1,
            maxdelay: 0.2,
            treemode: Some(true),
            ..run()
        };
        assert_eq!(SeriesLabel::None.label(&r), None);
        assert_eq!(SeriesLabel::FailingLeaves.label(&r).unwrap(), "3");
        assert_eq!(
            SeriesLabel::TreeMode.label(&r).unwrap(),
            "tree-based aggregation"
        );
        assert_eq!(SeriesLabel::MeanDelay.label(&r).unwrap(), "0.15s");
    }

    #[test]
    fn failed_runs_are_skipped() {
        let ys = [
            Measurement::Recorded(1.0),
            Measurement::Failed,
            Measurement::Recorded(3.0),
        ];
        let labels = [Some("a".to_string()), Some("b".to_string()), None];
        let ps = points(&[0.0, 1.0, 2.0], &ys, &labels);
        assert_eq!(
            ps,
            vec![
                Point {
                    x: 0.0,
                    y: 1.0,
                    series: Some("a".to_string())
                },
                Point {
                    x: 2.0,
                    y: 3.0,
                    series: None
                },
            ]
        );
    }

    #[test]
    fn delay_sweep_with_failure_series() {
        let runs: Vec<_> = [(0, 0.1), (0, 0.2), (2, 0.1), (2, 0.2)]
            .into_iter()
            .map(|(f, d)| ExperimentRun {
                failingleaves: f,
                mindelay: d / 2.0,
                maxdelay: d * 1.5,
                ..run()
            })
            .collect();
        let mut source = HashMap::new();
        source.insert("simulations_2".to_string(), runs);

        let outputs = find(2).unwrap().evaluate(&source).unwrap();
        assert_eq!(outputs[0].name, "round_wall_sum_by_delay");
        assert_eq!(outputs[0].style, PlotStyle::Line);
        assert!(outputs[0].x_from_zero);
        assert_eq!(outputs[0].legend_title.as_deref(), Some("failing nodes"));
        let series: Vec<_> = outputs[0]
            .series()
            .iter()
            .map(|(l, _)| l.unwrap().to_string())
            .collect();
        assert_eq!(series, vec!["0", "2"]);
        for (p, d) in outputs[0].points.iter().zip([0.1, 0.2, 0.1, 0.2]) {
            check_close(d, p.x);
        }
    }

    #[test]
    fn rumor_targets_require_constant_gossip_tick() {
        let runs: Vec<_> = (1..=3)
            .map(|k| ExperimentRun {
                rumorpeers: Some(k),
                gossiptick: Some(0.1 * k as f64),
                ..run()
            })
            .collect();
        let mut source = HashMap::new();
        source.insert("simulations_7".to_string(), runs.clone());
        source.insert("simulations_9".to_string(), runs);

        assert!(matches!(
            find(7).unwrap().evaluate(&source),
            Err(ScenarioError::Validation(ValidationError::InvariantViolation(
                Attribute::GossipTick
            )))
        ));
        let outputs = find(9).unwrap().evaluate(&source).unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(outputs[2].title.contains("rumor interval adjusted proportionally"));
    }
}
