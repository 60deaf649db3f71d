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

//! Per plot point statistics.
//!
//! Every trial produces one sample. Samples are folded into the statistics of
//! their plot point right away and never kept, so memory stays bounded however
//! many trials run. The statistic family is chosen by the trial body through
//! [`PointStats`]:
//!
//! - [`ErrorStats`]: a raw error value per trial (`f64`).
//! - [`RunningStats`]: an [`Estimate`] of a known true value per trial.
//! - [`SpeedStats`]: named timing phases per trial ([`SpeedSample`]).
//! - [`SerDeStats`]: serialize, deserialize and estimate timings ([`SerDeSample`]).
//!
//! Error distributions are reported at the ranks of the standard normal
//! distribution at -3..+3 standard deviations, framed by min and max.

mod point;
mod quantiles;
mod running;

pub use self::point::ErrorStats;
pub use self::point::Phase;
pub use self::point::SerDeSample;
pub use self::point::SerDeStats;
pub use self::point::SpeedSample;
pub use self::point::SpeedStats;
pub use self::quantiles::ErrorQuantiles;
pub use self::running::Estimate;
pub use self::running::RunningStats;
pub use self::running::TimingStats;

use crate::report::Cell;

/// Normalized rank at minus 4 standard deviations.
pub const M4SD: f64 = 0.0000316712418331;
/// Normalized rank at minus 3 standard deviations.
pub const M3SD: f64 = 0.0013498980316301;
/// Normalized rank at minus 2 standard deviations.
pub const M2SD: f64 = 0.0227501319481792;
/// Normalized rank at minus 1 standard deviation.
pub const M1SD: f64 = 0.1586552539314570;
/// The median.
pub const MED: f64 = 0.5;
/// Normalized rank at plus 1 standard deviation.
pub const P1SD: f64 = 0.8413447460685430;
/// Normalized rank at plus 2 standard deviations.
pub const P2SD: f64 = 0.9772498680518210;
/// Normalized rank at plus 3 standard deviations.
pub const P3SD: f64 = 0.9986501019683700;
/// Normalized rank at plus 4 standard deviations.
pub const P4SD: f64 = 0.9999683287581670;

/// The ranks every error distribution is reported at.
pub const GAUSSIAN_RANKS: [f64; 7] = [M3SD, M2SD, M1SD, MED, P1SD, P2SD, P3SD];

/// Column labels matching [`GAUSSIAN_RANKS`].
pub const GAUSSIAN_RANK_LABELS: [&str; 7] = [
    "Q(.00135)",
    "Q(.02275)",
    "Q(.15866)",
    "Q(.5)",
    "Q(.84134)",
    "Q(.97725)",
    "Q(.99865)",
];

/// Default lg of the order-statistics resolution.
pub const DEFAULT_LG_RESOLUTION: u8 = 12;

/// Statistics of one plot point, built fresh for every point.
pub trait PointStats {
    /// What a single trial produces.
    type Sample;

    /// Creates empty statistics; `lg_resolution` sizes the order-statistics structure.
    fn new(lg_resolution: u8) -> Self;

    /// Folds the sample of one trial.
    fn record(&mut self, sample: Self::Sample);

    /// Number of samples recorded.
    fn count(&self) -> u64;

    /// Column labels, in the order of [`PointStats::cells`].
    fn header(&self) -> Vec<String>;

    /// Column values for the report row of this point.
    fn cells(&self) -> Vec<Cell>;
}

pub(crate) fn quantile_header(out: &mut Vec<String>) {
    out.push("Min".to_string());
    out.extend(GAUSSIAN_RANK_LABELS.iter().map(|s| s.to_string()));
    out.push("Max".to_string());
}
