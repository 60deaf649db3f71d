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

//! Input streams for quantiles trials.
//!
//! Ordered patterns are permutations of the values `1..=n`; distribution
//! patterns draw `n` positive values from `rand_distr`.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distr::Uniform;
use rand::seq::SliceRandom;
use rand_distr::Distribution;
use rand_distr::Exp;
use rand_distr::Normal;

use crate::config::ConfigStore;
use crate::error::Error;

/// Key selecting the stream pattern of a profile.
pub const STREAM_PATTERN_KEY: &str = "Stream_Pattern";

/// The order or distribution of the values fed to a sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamPattern {
    Sorted,
    Reversed,
    /// Alternates from both ends towards the middle.
    ZoomIn,
    /// Alternates from the middle towards both ends.
    ZoomOut,
    #[default]
    Random,
    Uniform,
    /// Half-normal with scale `n`.
    Normal,
    /// Exponential with mean `n`.
    Exponential,
}

impl StreamPattern {
    pub const ALL: [StreamPattern; 8] = [
        StreamPattern::Sorted,
        StreamPattern::Reversed,
        StreamPattern::ZoomIn,
        StreamPattern::ZoomOut,
        StreamPattern::Random,
        StreamPattern::Uniform,
        StreamPattern::Normal,
        StreamPattern::Exponential,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            StreamPattern::Sorted => "Sorted",
            StreamPattern::Reversed => "Reversed",
            StreamPattern::ZoomIn => "ZoomIn",
            StreamPattern::ZoomOut => "ZoomOut",
            StreamPattern::Random => "Random",
            StreamPattern::Uniform => "Uniform",
            StreamPattern::Normal => "Normal",
            StreamPattern::Exponential => "Exponential",
        }
    }

    /// Whether the stream is a permutation of `1..=n`.
    pub const fn is_ordered(self) -> bool {
        !matches!(
            self,
            StreamPattern::Uniform | StreamPattern::Normal | StreamPattern::Exponential
        )
    }

    /// Reads the pattern from [`STREAM_PATTERN_KEY`], defaulting to [`StreamPattern::Random`].
    pub fn from_config(config: &ConfigStore) -> Result<Self, Error> {
        match config.get(STREAM_PATTERN_KEY) {
            None | Some("") => Ok(StreamPattern::default()),
            Some(v) => v
                .parse()
                .map_err(|err: Error| err.with_context("key", STREAM_PATTERN_KEY)),
        }
    }
}

impl fmt::Display for StreamPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamPattern {
    type Err = Error;

    /// Case insensitive; underscores are ignored, so `ZOOM_IN` reads as `ZoomIn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        StreamPattern::ALL
            .into_iter()
            .find(|p| p.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                Error::config_invalid("unknown stream pattern").with_context("value", s)
            })
    }
}

/// Builds a stream of `n` values.
///
/// ```rust
/// # use datasketches_characterization::stream::{make_stream, StreamPattern};
/// # use rand::SeedableRng;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let stream = make_stream(4, StreamPattern::ZoomIn, &mut rng).unwrap();
/// assert_eq!(stream, vec![1.0, 4.0, 2.0, 3.0]);
/// ```
pub fn make_stream<R: Rng + ?Sized>(
    n: usize,
    pattern: StreamPattern,
    rng: &mut R,
) -> Result<Vec<f64>, Error> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let top = n as f64;
    let out = match pattern {
        StreamPattern::Sorted => (1..=n).map(|v| v as f64).collect(),
        StreamPattern::Reversed => (1..=n).rev().map(|v| v as f64).collect(),
        StreamPattern::ZoomIn => zoom_in(n),
        StreamPattern::ZoomOut => {
            let mut values = zoom_in(n);
            values.reverse();
            values
        }
        StreamPattern::Random => {
            let mut values: Vec<f64> = (1..=n).map(|v| v as f64).collect();
            values.shuffle(rng);
            values
        }
        StreamPattern::Uniform => {
            let dist = Uniform::new(1.0, top + 1.0)
                .map_err(|err| distribution_error(pattern, err))?;
            dist.sample_iter(rng).take(n).collect()
        }
        StreamPattern::Normal => {
            let dist = Normal::new(0.0, top).map_err(|err| distribution_error(pattern, err))?;
            (0..n).map(|_| dist.sample(rng).abs()).collect()
        }
        StreamPattern::Exponential => {
            let dist = Exp::new(1.0 / top).map_err(|err| distribution_error(pattern, err))?;
            dist.sample_iter(rng).take(n).collect()
        }
    };
    Ok(out)
}

fn zoom_in(n: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(n);
    let (mut lo, mut hi) = (1usize, n);
    while lo <= hi {
        out.push(lo as f64);
        if lo != hi {
            out.push(hi as f64);
        }
        lo += 1;
        hi -= 1;
    }
    out
}

fn distribution_error(pattern: StreamPattern, err: impl fmt::Display) -> Error {
    Error::invalid_argument(format!("cannot build {pattern} distribution: {err}"))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("ZOOM_OUT".parse::<StreamPattern>().unwrap(), StreamPattern::ZoomOut);
        assert_eq!("sorted".parse::<StreamPattern>().unwrap(), StreamPattern::Sorted);
        assert!("sideways".parse::<StreamPattern>().is_err());
    }

    #[test]
    fn test_zoom_out_odd() {
        let mut rng = StdRng::seed_from_u64(0);
        let stream = make_stream(5, StreamPattern::ZoomOut, &mut rng).unwrap();
        assert_eq!(stream, vec![3.0, 4.0, 2.0, 5.0, 1.0]);
    }
}
