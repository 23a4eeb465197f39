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
//! Shared fixtures for the unit tests.
//!
//! Use the following command to see the diffs:
//!
//! ```shell
//! cargo test -- --nocapture --test-threads 1 --quiet
//! ```

use crate::records::{ExperimentRun, Measurement};

const PRECISION: f64 = 1e-9;

/// A successful run of 10 nodes without failures. Use struct update syntax to derive variants.
pub fn run() -> ExperimentRun {
    ExperimentRun {
        rounds: 1,
        hosts: 10,
        failingleaves: 0,
        mindelay: 0.1,
        maxdelay: 0.1,
        gossiptick: Some(0.1),
        rumorpeers: Some(2),
        shutdownpeers: Some(2),
        treemode: Some(false),
        duration: Measurement::Recorded(1.5),
        messages: Measurement::Recorded(400.0),
        bytes: Measurement::Recorded(80_000.0),
    }
}

pub fn check_close(exp: f64, acq: f64) {
    let diff = (exp - acq).abs();

    if diff <= PRECISION * exp.abs().max(1.0) {
        eprintln!(
            "diff: {}{:.3e}{} (expected {exp}, got {acq})",
            termion::color::Fg(termion::color::Green),
            diff,
            termion::color::Fg(termion::color::Reset),
        );
    } else {
        eprintln!(
            "diff: {}{:.3e}{} (expected {exp}, got {acq})",
            termion::color::Fg(termion::color::Red),
            diff,
            termion::color::Fg(termion::color::Reset),
        );
        panic!()
    }
}
