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

//! Number of trials per plot point.
//!
//! Small inputs are cheap and their sketches least stable, so they get the
//! most trials; large inputs get the fewest. Between the two breakpoints the
//! trial count is interpolated linearly in `log2(size)` and rounded to the
//! nearest integer.

use crate::error::Error;

/// Trial-count schedule over plot point sizes.
///
/// # Usage
///
/// ```rust
/// # use datasketches_characterization::schedule::TrialSchedule;
/// let schedule = TrialSchedule::new(2, 4, 2, 4).unwrap();
/// assert_eq!(schedule.trials_for(4), 16);
/// assert_eq!(schedule.trials_for(8), 8);
/// assert_eq!(schedule.trials_for(16), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSchedule {
    lg_min_trials: u8,
    lg_max_trials: u8,
    lg_min_bp: u8,
    lg_max_bp: u8,
    // lg trials per lg size; zero or negative
    slope: f64,
}

impl TrialSchedule {
    /// Creates a schedule running `2^lg_max_trials` trials at sizes up to `2^lg_min_bp` and
    /// `2^lg_min_trials` trials at sizes from `2^lg_max_bp`.
    pub fn new(lg_min_trials: u8, lg_max_trials: u8, lg_min_bp: u8, lg_max_bp: u8) -> Result<Self, Error> {
        if lg_min_trials > lg_max_trials {
            return Err(Error::invalid_argument("lg_min_trials must be <= lg_max_trials")
                .with_context("lg_min_trials", lg_min_trials)
                .with_context("lg_max_trials", lg_max_trials));
        }
        if lg_min_bp > lg_max_bp {
            return Err(Error::invalid_argument("lg_min_bp must be <= lg_max_bp")
                .with_context("lg_min_bp", lg_min_bp)
                .with_context("lg_max_bp", lg_max_bp));
        }
        if lg_max_trials > 62 || lg_max_bp > 62 {
            return Err(Error::invalid_argument("schedule exponents must be <= 62"));
        }

        let slope = if lg_min_bp == lg_max_bp {
            0.0
        } else {
            f64::from(lg_max_trials - lg_min_trials) / (f64::from(lg_min_bp) - f64::from(lg_max_bp))
        };
        Ok(Self {
            lg_min_trials,
            lg_max_trials,
            lg_min_bp,
            lg_max_bp,
            slope,
        })
    }

    /// Creates a schedule that always runs `2^lg_trials` trials.
    pub fn constant(lg_trials: u8) -> Result<Self, Error> {
        Self::new(lg_trials, lg_trials, 0, 0)
    }

    pub fn min_trials(&self) -> u64 {
        1u64 << self.lg_min_trials
    }

    pub fn max_trials(&self) -> u64 {
        1u64 << self.lg_max_trials
    }

    /// The interpolation slope in lg trials per lg size.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Returns the number of trials to run at a plot point of the given size.
    pub fn trials_for(&self, size: u64) -> u64 {
        if self.lg_min_trials == self.lg_max_trials || size <= 1u64 << self.lg_min_bp {
            return self.max_trials();
        }
        if size >= 1u64 << self.lg_max_bp {
            return self.min_trials();
        }
        let lg_size = (size as f64).log2();
        let lg_trials = self.slope * (lg_size - f64::from(self.lg_min_bp)) + f64::from(self.lg_max_trials);
        let trials = lg_trials.exp2().round() as u64;
        trials.clamp(self.min_trials(), self.max_trials())
    }
}
