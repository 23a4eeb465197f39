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
//! Sanity checks on a set of runs before it is used for any comparison.
//!
//! Every tracked attribute must be constant across all runs of a dataset, except for the ones
//! declared in the [`ParameterSweep`] of the analysis. Runs that did not produce a signature are
//! rejected unless failures are explicitly tolerated.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use crate::records::{Attribute, Counter, ExperimentRun, Measurement};

/// Attributes that must be constant unless they are part of the sweep.
pub const TRACKED_ATTRIBUTES: [Attribute; 8] = [
    Attribute::Rounds,
    Attribute::Hosts,
    Attribute::FailingLeaves,
    Attribute::MaxDelay,
    Attribute::MinDelay,
    Attribute::GossipTick,
    Attribute::RumorPeers,
    Attribute::ShutdownPeers,
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("The dataset contains no runs")]
    EmptyDataset,
    /// An attribute that should be constant takes different values.
    #[error("Attribute `{0}` is not constant across all runs")]
    InvariantViolation(Attribute),
    /// An attribute used for grouping was not recorded.
    #[error("Run {row} did not record attribute `{attribute}`")]
    MissingAttribute { attribute: Attribute, row: usize },
    #[error("Run {row} failed unexpectedly: {reason}")]
    UnexpectedRunFailure { row: usize, reason: FailureReason },
}

/// Why a run is considered failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The counter is missing, i.e., no signature was produced.
    Missing(Counter),
    /// The counter is exactly zero.
    Zero(Counter),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(c) => write!(f, "{c} is missing"),
            Self::Zero(c) => write!(f, "{c} is zero"),
        }
    }
}

/// Attributes that are allowed to vary in a dataset. Declared once per analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSweep(BTreeSet<Attribute>);

impl ParameterSweep {
    pub fn new(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        Self(attributes.into_iter().collect())
    }

    /// Build a sweep from column names. `delay` selects both delay bounds.
    pub fn parse<S: AsRef<str>>(
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, strum::ParseError> {
        names
            .into_iter()
            .map(|name| Attribute::from_str(name.as_ref()))
            .collect::<Result<_, _>>()
            .map(Self)
    }

    pub fn allows(&self, attribute: Attribute) -> bool {
        self.0.contains(&attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.0.iter().copied()
    }

    /// The tracked attributes that must stay constant under this sweep.
    pub fn checked_attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        let delay = self.allows(Attribute::Delay);
        TRACKED_ATTRIBUTES.into_iter().filter(move |a| {
            !self.allows(*a) && !(delay && matches!(a, Attribute::MinDelay | Attribute::MaxDelay))
        })
    }
}

impl FromIterator<Attribute> for ParameterSweep {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Configuration of the sanity checks applied to a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SanityCheck {
    pub sweep: ParameterSweep,
    /// If set, every run must use this aggregation strategy.
    pub treemode: Option<bool>,
    /// Reject runs with missing or zero counters.
    pub check_failures: bool,
}

impl SanityCheck {
    pub fn new(sweep: ParameterSweep) -> Self {
        Self {
            sweep,
            treemode: None,
            check_failures: true,
        }
    }

    pub fn treemode(mut self, treemode: bool) -> Self {
        self.treemode = Some(treemode);
        self
    }

    pub fn tolerate_failures(mut self) -> Self {
        self.check_failures = false;
        self
    }

    pub fn check(&self, runs: &[ExperimentRun]) -> Result<(), ValidationError> {
        let Some(first) = runs.first() else {
            return Err(ValidationError::EmptyDataset);
        };

        for attribute in self.sweep.checked_attributes() {
            let expected = first.value(attribute);
            if runs.iter().any(|run| run.value(attribute) != expected) {
                return Err(ValidationError::InvariantViolation(attribute));
            }
        }

        if let Some(treemode) = self.treemode {
            if runs.iter().any(|run| run.treemode != Some(treemode)) {
                return Err(ValidationError::InvariantViolation(Attribute::TreeMode));
            }
        }

        if self.check_failures {
            for (row, run) in runs.iter().enumerate() {
                if let Some(reason) = failure(run) {
                    return Err(ValidationError::UnexpectedRunFailure { row, reason });
                }
            }
        }

        Ok(())
    }
}

/// Check whether a run failed: either a counter is missing or it is zero.
pub fn failure(run: &ExperimentRun) -> Option<FailureReason> {
    [Counter::Duration, Counter::Messages, Counter::Bytes]
        .into_iter()
        .find_map(|counter| match run.counter(counter) {
            Measurement::Failed => Some(FailureReason::Missing(counter)),
            Measurement::Recorded(v) if v == 0.0 => Some(FailureReason::Zero(counter)),
            Measurement::Recorded(_) => None,
        })
}

/// Validate `runs` and hand them back if all checks pass.
pub fn validate(
    runs: Vec<ExperimentRun>,
    check: &SanityCheck,
) -> Result<Vec<ExperimentRun>, ValidationError> {
    check.check(&runs)?;
    Ok(runs)
}

/// Fraction of runs that did not produce a signature, per number of failing nodes.
pub fn failure_rates(runs: &[ExperimentRun]) -> BTreeMap<u32, f64> {
    let mut counts: BTreeMap<u32, (usize, usize)> = BTreeMap::new();
    for run in runs {
        let (failed, total) = counts.entry(run.failingleaves).or_default();
        *total += 1;
        if run.duration.is_failed() {
            *failed += 1;
        }
    }
    counts
        .into_iter()
        .map(|(f, (failed, total))| (f, failed as f64 / total as f64))
        .collect()
}
