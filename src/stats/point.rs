// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::report::Cell;
use crate::stats::ErrorQuantiles;
use crate::stats::GAUSSIAN_RANKS;
use crate::stats::PointStats;
use crate::stats::quantile_header;

/// Statistics over a raw error value per trial, such as a max rank error.
#[derive(Debug, Clone)]
pub struct ErrorStats {
    count: u64,
    sum: f64,
    sum_sq: f64,
    quantiles: ErrorQuantiles,
}

impl ErrorStats {
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    pub fn rms(&self) -> f64 {
        (self.sum_sq / self.count as f64).sqrt()
    }

    pub fn max(&self) -> f64 {
        self.quantiles.max()
    }

    pub fn quantile(&self, rank: f64) -> f64 {
        self.quantiles.quantile(rank)
    }
}

impl PointStats for ErrorStats {
    type Sample = f64;

    fn new(lg_resolution: u8) -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            quantiles: ErrorQuantiles::new(lg_resolution),
        }
    }

    fn record(&mut self, err: f64) {
        self.count += 1;
        self.sum += err;
        self.sum_sq += err * err;
        self.quantiles.update(err);
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn header(&self) -> Vec<String> {
        let mut out = vec!["MeanErr".to_string(), "RmsErr".to_string()];
        quantile_header(&mut out);
        out
    }

    fn cells(&self) -> Vec<Cell> {
        let mut ranks = vec![0.0];
        ranks.extend_from_slice(&GAUSSIAN_RANKS);
        ranks.push(1.0);

        let mut out = vec![Cell::Float(self.mean()), Cell::Float(self.rms())];
        out.extend(self.quantiles.quantiles(&ranks).into_iter().map(Cell::Float));
        out
    }
}

/// One timed phase of a speed trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub name: &'static str,
    pub nanos: u64,
    /// Number of operations the phase performed, e.g. updates or queries.
    pub ops: u64,
}

/// Timings of one speed trial, as a list of named phases.
///
/// ```rust
/// # use datasketches_characterization::stats::SpeedSample;
/// let sample = SpeedSample::new()
///     .with_phase("Update", 2_000, 1_000)
///     .with_phase("Query", 300, 10);
/// assert_eq!(sample.phases().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeedSample {
    phases: Vec<Phase>,
}

impl SpeedSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase(mut self, name: &'static str, nanos: u64, ops: u64) -> Self {
        self.push(name, nanos, ops);
        self
    }

    pub fn push(&mut self, name: &'static str, nanos: u64, ops: u64) {
        self.phases.push(Phase { name, nanos, ops });
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }
}

#[derive(Debug, Clone, Copy)]
struct PhaseTotals {
    name: &'static str,
    nanos: u64,
    ops: u64,
}

/// Mean nanoseconds per operation of each phase, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct SpeedStats {
    count: u64,
    totals: Vec<PhaseTotals>,
}

impl SpeedStats {
    /// Mean nanoseconds per operation of the named phase, NaN if it never ran.
    pub fn nanos_per_op(&self, name: &str) -> f64 {
        self.totals
            .iter()
            .find(|t| t.name == name)
            .map_or(f64::NAN, |t| t.nanos as f64 / t.ops as f64)
    }

    /// Mean nanoseconds per trial of the named phase, NaN if it never ran.
    pub fn nanos_per_trial(&self, name: &str) -> f64 {
        self.totals
            .iter()
            .find(|t| t.name == name)
            .map_or(f64::NAN, |t| t.nanos as f64 / self.count as f64)
    }
}

impl PointStats for SpeedStats {
    type Sample = SpeedSample;

    fn new(_lg_resolution: u8) -> Self {
        Self::default()
    }

    fn record(&mut self, sample: SpeedSample) {
        self.count += 1;
        for phase in sample.phases {
            match self.totals.iter_mut().find(|t| t.name == phase.name) {
                Some(t) => {
                    t.nanos = t.nanos.saturating_add(phase.nanos);
                    t.ops = t.ops.saturating_add(phase.ops);
                }
                None => self.totals.push(PhaseTotals {
                    name: phase.name,
                    nanos: phase.nanos,
                    ops: phase.ops,
                }),
            }
        }
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn header(&self) -> Vec<String> {
        self.totals.iter().map(|t| format!("nS/{}", t.name)).collect()
    }

    fn cells(&self) -> Vec<Cell> {
        self.totals
            .iter()
            .map(|t| Cell::Float(t.nanos as f64 / t.ops as f64))
            .collect()
    }
}

/// Timings and size of one serialize/deserialize trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerDeSample {
    pub ser_nanos: u64,
    pub deser_nanos: u64,
    /// Time of one estimate on the deserialized sketch.
    pub est_nanos: u64,
    pub size_bytes: u64,
}

/// Means of the [`SerDeSample`] fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerDeStats {
    count: u64,
    sum: SerDeSample,
}

impl SerDeStats {
    pub fn mean_ser_nanos(&self) -> f64 {
        self.sum.ser_nanos as f64 / self.count as f64
    }

    pub fn mean_deser_nanos(&self) -> f64 {
        self.sum.deser_nanos as f64 / self.count as f64
    }

    pub fn mean_est_nanos(&self) -> f64 {
        self.sum.est_nanos as f64 / self.count as f64
    }

    pub fn mean_size_bytes(&self) -> f64 {
        self.sum.size_bytes as f64 / self.count as f64
    }
}

impl PointStats for SerDeStats {
    type Sample = SerDeSample;

    fn new(_lg_resolution: u8) -> Self {
        Self::default()
    }

    fn record(&mut self, sample: SerDeSample) {
        self.count += 1;
        self.sum.ser_nanos = self.sum.ser_nanos.saturating_add(sample.ser_nanos);
        self.sum.deser_nanos = self.sum.deser_nanos.saturating_add(sample.deser_nanos);
        self.sum.est_nanos = self.sum.est_nanos.saturating_add(sample.est_nanos);
        self.sum.size_bytes = self.sum.size_bytes.saturating_add(sample.size_bytes);
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn header(&self) -> Vec<String> {
        ["Ser_nS", "DeSer_nS", "Est_nS", "Size_B"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Float(self.mean_ser_nanos()),
            Cell::Float(self.mean_deser_nanos()),
            Cell::Float(self.mean_est_nanos()),
            Cell::Float(self.mean_size_bytes()),
        ]
    }
}
