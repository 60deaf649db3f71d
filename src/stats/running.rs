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

/// One estimate of a known true value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub estimate: f64,
    pub truth: f64,
}

impl Estimate {
    pub fn new(estimate: f64, truth: f64) -> Self {
        Self { estimate, truth }
    }
}

/// Sum and count of raw timings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingStats {
    count: u64,
    sum_nanos: u64,
}

impl TimingStats {
    pub fn record(&mut self, nanos: u64) {
        self.count += 1;
        self.sum_nanos = self.sum_nanos.saturating_add(nanos);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum_nanos(&self) -> u64 {
        self.sum_nanos
    }

    /// Mean timing, NaN if nothing was recorded.
    pub fn mean_nanos(&self) -> f64 {
        self.sum_nanos as f64 / self.count as f64
    }
}

/// Accuracy accumulator of one plot point.
///
/// Sums are accumulated in call order, so the same sequence of estimates
/// always reduces to the same result. A zero truth is not guarded against: it
/// shows up as NaN or infinity in the relative outputs.
///
/// # Usage
///
/// ```rust
/// # use datasketches_characterization::stats::RunningStats;
/// let mut stats = RunningStats::new(8);
/// stats.record_estimate(110.0, 100.0);
/// stats.record_estimate(90.0, 100.0);
/// assert_eq!(stats.mean_estimate(), 100.0);
/// assert!(stats.mean_relative_error().abs() < 1e-12);
/// assert!((stats.rms_relative_error() - 0.1).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: u64,
    sum_est: f64,
    sum_rel_err: f64,
    sum_sq_err: f64,
    sum_truth: f64,
    sum_sq_truth: f64,
    bytes: u64,
    bound_count: u64,
    bound_sums: [f64; 6],
    quantiles: ErrorQuantiles,
    timing: TimingStats,
}

impl RunningStats {
    pub fn new(lg_resolution: u8) -> Self {
        Self {
            count: 0,
            sum_est: 0.0,
            sum_rel_err: 0.0,
            sum_sq_err: 0.0,
            sum_truth: 0.0,
            sum_sq_truth: 0.0,
            bytes: 0,
            bound_count: 0,
            bound_sums: [0.0; 6],
            quantiles: ErrorQuantiles::new(lg_resolution),
            timing: TimingStats::default(),
        }
    }

    /// Records one estimate of `truth`.
    pub fn record_estimate(&mut self, est: f64, truth: f64) {
        self.count += 1;
        self.sum_est += est;
        self.sum_rel_err += est / truth - 1.0;
        let err = est - truth;
        self.sum_sq_err += err * err;
        self.sum_truth += truth;
        self.sum_sq_truth += truth * truth;
        self.quantiles.update(est);
    }

    /// Records a raw timing; timings are only averaged.
    pub fn record_timing(&mut self, nanos: u64) {
        self.timing.record(nanos);
    }

    /// Records the confidence bounds of one estimate, ordered LB3, LB2, LB1, UB1, UB2, UB3.
    pub fn record_bounds(&mut self, bounds: [f64; 6]) {
        self.bound_count += 1;
        for (sum, bound) in self.bound_sums.iter_mut().zip(bounds) {
            *sum += bound;
        }
    }

    /// Mean bounds relative to the mean truth, `None` if no bounds were recorded.
    pub fn relative_bounds(&self) -> Option<[f64; 6]> {
        if self.bound_count == 0 {
            return None;
        }
        let truth = self.mean_truth();
        Some(self.bound_sums.map(|sum| sum / self.bound_count as f64 / truth - 1.0))
    }

    /// Records the serialized size of the sketch; the last value wins.
    pub fn record_bytes(&mut self, bytes: u64) {
        self.bytes = bytes;
    }

    /// Number of recorded estimates.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn mean_estimate(&self) -> f64 {
        self.sum_est / self.count as f64
    }

    /// Mean of the true values recorded.
    pub fn mean_truth(&self) -> f64 {
        self.sum_truth / self.count as f64
    }

    /// Mean of `est / truth - 1`.
    pub fn mean_relative_error(&self) -> f64 {
        self.sum_rel_err / self.count as f64
    }

    /// Root mean square error normalized by the true value.
    pub fn rms_relative_error(&self) -> f64 {
        (self.sum_sq_err / self.sum_sq_truth).sqrt()
    }

    /// Approximate estimate at normalized rank `rank` over all recorded estimates.
    pub fn quantile(&self, rank: f64) -> f64 {
        self.quantiles.quantile(rank)
    }

    /// Relative errors `q / truth - 1` at min, the Gaussian ranks and max.
    pub fn relative_error_quantiles(&self) -> Vec<f64> {
        let truth = self.mean_truth();
        let mut ranks = Vec::with_capacity(GAUSSIAN_RANKS.len() + 2);
        ranks.push(0.0);
        ranks.extend_from_slice(&GAUSSIAN_RANKS);
        ranks.push(1.0);
        self.quantiles
            .quantiles(&ranks)
            .into_iter()
            .map(|q| q / truth - 1.0)
            .collect()
    }

    pub fn mean_timing_nanos(&self) -> f64 {
        self.timing.mean_nanos()
    }

    pub fn timing(&self) -> &TimingStats {
        &self.timing
    }
}

impl PointStats for RunningStats {
    type Sample = Estimate;

    fn new(lg_resolution: u8) -> Self {
        RunningStats::new(lg_resolution)
    }

    fn record(&mut self, sample: Estimate) {
        self.record_estimate(sample.estimate, sample.truth);
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn header(&self) -> Vec<String> {
        let mut out = vec![
            "MeanEst".to_string(),
            "MeanRelErr".to_string(),
            "RMS_RE".to_string(),
        ];
        quantile_header(&mut out);
        out
    }

    fn cells(&self) -> Vec<Cell> {
        let mut out = vec![
            Cell::Float(self.mean_estimate()),
            Cell::Float(self.mean_relative_error()),
            Cell::Float(self.rms_relative_error()),
        ];
        out.extend(self.relative_error_quantiles().into_iter().map(Cell::Float));
        out
    }
}
