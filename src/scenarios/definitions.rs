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
//! All analysis scenarios.

use crate::records::Attribute::*;

use super::{
    ComparisonScenario, PlotStyle, Scenario, ScenarioKind, SeriesLabel, SweepScenario, XAxis,
};

pub static SCENARIOS: [Scenario; 11] = [
    Scenario {
        id: 1,
        kind: ScenarioKind::Comparison(ComparisonScenario {
            datasets: &[
                ("simulations_bundle_existing", "BLS CoSi instance"),
                ("simulations_mask_aggr", "Mask Aggr"),
            ],
            style: PlotStyle::Strip,
            prefix: "",
            legend_title: None,
            zoomed_duration: Some(1.4),
        }),
    },
    Scenario {
        id: 2,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_2",
            sweep: &[FailingLeaves, Delay],
            x_axis: XAxis::Attribute(Delay),
            x_label: "message delay (sec)",
            series: SeriesLabel::FailingLeaves,
            legend_title: Some("failing nodes"),
            style: PlotStyle::Line,
            title: "Mean {metric} vs. message delay (n={n})",
            qualifier: "by_delay",
        }),
    },
    Scenario {
        id: 3,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_3",
            sweep: &[FailingLeaves],
            x_axis: XAxis::Attribute(FailingLeaves),
            x_label: "failing nodes",
            series: SeriesLabel::None,
            legend_title: None,
            style: PlotStyle::Scatter,
            title: "Mean {metric} vs. number of failing nodes (n={n})",
            qualifier: "by_failing",
        }),
    },
    Scenario {
        id: 4,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_4",
            sweep: &[Hosts],
            x_axis: XAxis::Attribute(Hosts),
            x_label: "nodes",
            series: SeriesLabel::TreeMode,
            legend_title: None,
            style: PlotStyle::Scatter,
            title: "Mean {metric} vs. number of nodes (no failing nodes)",
            qualifier: "by_mode",
        }),
    },
    Scenario {
        id: 5,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_5",
            sweep: &[Hosts, Delay],
            x_axis: XAxis::Attribute(Hosts),
            x_label: "nodes",
            series: SeriesLabel::MeanDelay,
            legend_title: Some("mean message delay"),
            style: PlotStyle::Scatter,
            title: "Mean {metric} vs. number of nodes (no failing nodes)",
            qualifier: "by_num_nodes",
        }),
    },
    Scenario {
        id: 6,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_6",
            sweep: &[GossipTick, FailingLeaves],
            x_axis: XAxis::Attribute(GossipTick),
            x_label: "rumor-sending interval t (sec)",
            series: SeriesLabel::FailingLeaves,
            legend_title: Some("failing nodes"),
            style: PlotStyle::Line,
            title: "Mean {metric} vs. rumor-sending interval (n={n})",
            qualifier: "by_gossip_tick",
        }),
    },
    Scenario {
        id: 7,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_7",
            sweep: &[RumorPeers, FailingLeaves],
            x_axis: XAxis::Attribute(RumorPeers),
            x_label: "rumor targets",
            series: SeriesLabel::FailingLeaves,
            legend_title: Some("failing nodes"),
            style: PlotStyle::Scatter,
            title: "Mean {metric} vs. number of rumor targets (n={n})",
            qualifier: "by_rumor_targets",
        }),
    },
    Scenario {
        id: 8,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_8",
            sweep: &[ShutdownPeers, FailingLeaves],
            x_axis: XAxis::Attribute(ShutdownPeers),
            x_label: "shutdown targets",
            series: SeriesLabel::FailingLeaves,
            legend_title: Some("failing nodes"),
            style: PlotStyle::Scatter,
            title: "Mean {metric} vs. number of shutdown targets (n={n})",
            qualifier: "by_shutdown_targets",
        }),
    },
    Scenario {
        id: 9,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_9",
            // the gossip tick is scaled with the number of rumor targets
            sweep: &[GossipTick, RumorPeers, FailingLeaves],
            x_axis: XAxis::Attribute(RumorPeers),
            x_label: "rumor targets",
            series: SeriesLabel::FailingLeaves,
            legend_title: Some("failing nodes"),
            style: PlotStyle::Scatter,
            title: "Mean {metric} vs. number of rumor targets\n(rumor interval adjusted proportionally; n={n})",
            qualifier: "by_rumor_targets",
        }),
    },
    Scenario {
        id: 10,
        kind: ScenarioKind::Sweep(SweepScenario {
            dataset: "simulations_10",
            sweep: &[Delay, FailingLeaves],
            x_axis: XAxis::DelayRange,
            x_label: "message delay range",
            series: SeriesLabel::FailingLeaves,
            legend_title: Some("failing nodes"),
            style: PlotStyle::Line,
            title: "Mean {metric} vs. message delay range (n={n})",
            qualifier: "by_delay_range",
        }),
    },
    Scenario {
        id: 11,
        kind: ScenarioKind::Comparison(ComparisonScenario {
            datasets: &[
                ("simulations_blscosibundle", "BLS CoSi"),
                ("simulations_mask_simple", "Mask"),
                ("simulations_mask_aggr", "Mask Aggregation"),
            ],
            style: PlotStyle::Box,
            prefix: "aggregation_",
            legend_title: Some("Protocol"),
            zoomed_duration: None,
        }),
    },
];
