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
//! Module defining the per-run records written by the simulator, and loading them from CSV.
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{de, Deserialize, Deserializer};

use crate::util::PathBufExt;

/// Columns that every result table must provide.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "rounds",
    "hosts",
    "failingleaves",
    "mindelay",
    "maxdelay",
    "round_wall_avg",
    "round_wall_sum",
    "bandwidth_msg_tx_sum",
    "bandwidth_tx_sum",
];

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    /// The dataset identifier does not resolve to a result table.
    #[error("Dataset {0:?} does not exist")]
    MissingDataset(String),
    /// The result table lacks a column.
    #[error("Dataset {dataset:?} has no column {column:?}")]
    MissingColumn {
        dataset: String,
        column: &'static str,
    },
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Glob Error: {0}")]
    Glob(#[from] glob::PatternError),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
/// Parameters recorded for each run. The string forms match the column names.
pub enum Attribute {
    Rounds,
    Hosts,
    FailingLeaves,
    MinDelay,
    MaxDelay,
    GossipTick,
    RumorPeers,
    ShutdownPeers,
    TreeMode,
    /// Composite of `mindelay` and `maxdelay`. Its value is the mean delay.
    Delay,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
/// Raw counters summed over a run.
pub enum Counter {
    #[strum(serialize = "round_wall_sum")]
    Duration,
    #[strum(serialize = "bandwidth_msg_tx_sum")]
    Messages,
    #[strum(serialize = "bandwidth_tx_sum")]
    Bytes,
}

/// Outcome of a raw counter for a single run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Recorded(f64),
    /// The run did not produce a value, i.e., no signature was created.
    Failed,
}

impl Measurement {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Recorded(v) => Some(v),
            Self::Failed => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Recorded(v) => Self::Recorded(f(v)),
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl From<Option<f64>> for Measurement {
    /// Non-finite values count as not recorded.
    fn from(value: Option<f64>) -> Self {
        value
            .filter(|v| v.is_finite())
            .map(Self::Recorded)
            .unwrap_or(Self::Failed)
    }
}

/// One simulated run of the protocol under a single parameter combination.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentRun {
    pub rounds: u32,
    pub hosts: u32,
    pub failingleaves: u32,
    /// Lower bound of the network delay, in seconds
    pub mindelay: f64,
    /// Upper bound of the network delay, in seconds
    pub maxdelay: f64,
    /// Rumor-sending interval, in seconds. Not recorded by reference protocol instances.
    pub gossiptick: Option<f64>,
    pub rumorpeers: Option<u32>,
    pub shutdownpeers: Option<u32>,
    pub treemode: Option<bool>,
    /// Total protocol duration (`round_wall_sum`)
    pub duration: Measurement,
    /// Messages sent (`bandwidth_msg_tx_sum`)
    pub messages: Measurement,
    /// Bytes sent (`bandwidth_tx_sum`)
    pub bytes: Measurement,
}

impl ExperimentRun {
    /// Number of nodes that are not deliberately failing. `None` if more nodes fail than exist.
    pub fn surviving(&self) -> Option<u32> {
        self.hosts.checked_sub(self.failingleaves)
    }

    pub fn mean_delay(&self) -> f64 {
        (self.mindelay + self.maxdelay) / 2.0
    }

    pub fn delay_range(&self) -> f64 {
        self.maxdelay - self.mindelay
    }

    pub fn counter(&self, counter: Counter) -> Measurement {
        match counter {
            Counter::Duration => self.duration,
            Counter::Messages => self.messages,
            Counter::Bytes => self.bytes,
        }
    }

    /// Numeric value of an attribute, `None` if the run did not record it.
    pub fn value(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Rounds => Some(self.rounds as f64),
            Attribute::Hosts => Some(self.hosts as f64),
            Attribute::FailingLeaves => Some(self.failingleaves as f64),
            Attribute::MinDelay => Some(self.mindelay),
            Attribute::MaxDelay => Some(self.maxdelay),
            Attribute::GossipTick => self.gossiptick,
            Attribute::RumorPeers => self.rumorpeers.map(f64::from),
            Attribute::ShutdownPeers => self.shutdownpeers.map(f64::from),
            Attribute::TreeMode => self.treemode.map(|t| if t { 1.0 } else { 0.0 }),
            Attribute::Delay => Some(self.mean_delay()),
        }
    }
}

#[derive(Debug, Deserialize)]
/// Row of a result table as written by the simulator.
struct RawRun {
    #[serde(deserialize_with = "deserialize_positive_count")]
    rounds: u32,
    #[serde(deserialize_with = "deserialize_count")]
    hosts: u32,
    #[serde(deserialize_with = "deserialize_count")]
    failingleaves: u32,
    mindelay: f64,
    maxdelay: f64,
    #[serde(default)]
    gossiptick: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_option_count")]
    rumorpeers: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_option_count")]
    shutdownpeers: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_option_flag")]
    treemode: Option<bool>,
    #[serde(deserialize_with = "deserialize_option_value")]
    round_wall_avg: Option<f64>,
    #[serde(deserialize_with = "deserialize_option_value")]
    round_wall_sum: Option<f64>,
    #[serde(deserialize_with = "deserialize_option_value")]
    bandwidth_msg_tx_sum: Option<f64>,
    #[serde(deserialize_with = "deserialize_option_value")]
    bandwidth_tx_sum: Option<f64>,
}

impl From<RawRun> for ExperimentRun {
    fn from(raw: RawRun) -> Self {
        // a missing average marks the run as failed, even if the sum was written
        let duration = match raw.round_wall_avg {
            Some(_) => raw.round_wall_sum.into(),
            None => Measurement::Failed,
        };
        Self {
            rounds: raw.rounds,
            hosts: raw.hosts,
            failingleaves: raw.failingleaves,
            mindelay: raw.mindelay,
            maxdelay: raw.maxdelay,
            gossiptick: raw.gossiptick,
            rumorpeers: raw.rumorpeers,
            shutdownpeers: raw.shutdownpeers,
            treemode: raw.treemode,
            duration,
            messages: raw.bandwidth_msg_tx_sum.into(),
            bytes: raw.bandwidth_tx_sum.into(),
        }
    }
}

/// Parse a count, accepting integral floats such as `4.0`.
fn parse_count<E: de::Error>(value: f64) -> Result<u32, E> {
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(E::custom(format!("expected a non-negative count, found {value}")));
    }
    Ok(value as u32)
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    parse_count(f64::deserialize(deserializer)?)
}

/// Like [`deserialize_count`], but zero is rejected.
fn deserialize_positive_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match deserialize_count(deserializer)? {
        0 => Err(de::Error::custom("expected a positive count, found 0")),
        n => Ok(n),
    }
}

fn deserialize_option_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(parse_count)
        .transpose()
}

fn deserialize_option_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(s) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match s.as_str() {
        "" => Ok(None),
        "true" | "True" | "TRUE" | "1" => Ok(Some(true)),
        "false" | "False" | "FALSE" | "0" => Ok(Some(false)),
        other => Err(de::Error::custom(format!(
            "expected a boolean, found {other:?}"
        ))),
    }
}

/// Cells that mark a measurement as not recorded, in addition to an empty cell.
const NULL_TOKENS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Parse a measurement. Null tokens and non-finite numbers are not recorded.
fn deserialize_option_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(s) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if s.is_empty() || NULL_TOKENS.contains(&s.as_str()) {
        return Ok(None);
    }
    let value: f64 = s
        .parse()
        .map_err(|_| de::Error::custom(format!("expected a number, found {s:?}")))?;
    Ok(Some(value).filter(|v| v.is_finite()))
}

/// Read all runs from a CSV source. `dataset` is only used for error reporting.
pub fn read_runs<R: io::Read>(
    dataset: &str,
    reader: R,
) -> Result<Vec<ExperimentRun>, DataSourceError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|column| !headers.iter().any(|h| h == *column))
    {
        return Err(DataSourceError::MissingColumn {
            dataset: dataset.to_string(),
            column,
        });
    }

    let runs = csv
        .deserialize::<RawRun>()
        .map(|raw| raw.map(ExperimentRun::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(runs)
}

/// Anything that resolves a dataset identifier to its runs.
pub trait RecordSource {
    fn load(&self, dataset: &str) -> Result<Vec<ExperimentRun>, DataSourceError>;
}

/// Directory of result tables, one `<dataset>.csv` per dataset.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, dataset: &str) -> PathBuf {
        self.root.as_path().then(format!("{dataset}.csv"))
    }

    /// List the identifiers of all datasets in the store, sorted.
    pub fn datasets(&self) -> Result<Vec<String>, DataSourceError> {
        let pattern = self.root.as_path().then("*.csv");
        let mut datasets: Vec<String> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(Result::ok)
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        datasets.sort_by(|a, b| human_sort::compare(a, b));
        Ok(datasets)
    }
}

impl RecordSource for ResultStore {
    fn load(&self, dataset: &str) -> Result<Vec<ExperimentRun>, DataSourceError> {
        let path = self.path(dataset);
        if !path.exists() {
            log::warn!("Could not find dataset {dataset} at {path:?}");
            return Err(DataSourceError::MissingDataset(dataset.to_string()));
        }
        log::info!("Loading: {path:?}");
        // the file is closed as soon as the table is materialized
        let runs = read_runs(dataset, fs::File::open(&path)?)?;
        log::debug!("Loaded {} runs from {dataset}", runs.len());
        Ok(runs)
    }
}

impl RecordSource for HashMap<String, Vec<ExperimentRun>> {
    fn load(&self, dataset: &str) -> Result<Vec<ExperimentRun>, DataSourceError> {
        self.get(dataset)
            .cloned()
            .ok_or_else(|| DataSourceError::MissingDataset(dataset.to_string()))
    }
}
