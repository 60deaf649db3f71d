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

//! T-digest characterizations over the `tdigest` crate.

use std::hint::black_box;

use ::tdigest::TDigest;

use crate::config::ConfigStore;
use crate::error::Error;
use crate::profiles::normalized_rank;
use crate::profiles::num_sketches;
use crate::profiles::query_fractions;
use crate::profiles::sorted_copy;
use crate::runner::TrialBody;
use crate::runner::TrialContext;
use crate::stats::ErrorStats;
use crate::stats::GAUSSIAN_RANKS;
use crate::stats::SpeedSample;
use crate::stats::SpeedStats;
use crate::stream::StreamPattern;
use crate::stream::make_stream;

/// Key of the t-digest compression size.
pub const TDIGEST_SIZE_KEY: &str = "TDigest_size";

fn read_size(config: &ConfigStore) -> Result<usize, Error> {
    let size: usize = config.must_get_parsed(TDIGEST_SIZE_KEY)?;
    if size == 0 {
        return Err(Error::config_invalid("t-digest size must be > 0")
            .with_context("key", TDIGEST_SIZE_KEY));
    }
    Ok(size)
}

pub(crate) fn stream_len(size: u64) -> Result<usize, Error> {
    usize::try_from(size).map_err(|_| {
        Error::invalid_argument("plot point does not fit in memory").with_context("size", size)
    })
}

/// Max normalized rank error of t-digest quantiles over a set of query fractions.
#[derive(Debug, Clone, Default)]
pub struct TDigestRankAccuracy {
    digest_size: usize,
    pattern: StreamPattern,
    fractions: Vec<f64>,
    len: usize,
}

impl TrialBody for TDigestRankAccuracy {
    type Stats = ErrorStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.digest_size = read_size(config)?;
        self.pattern = StreamPattern::from_config(config)?;
        self.fractions = query_fractions(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.len = stream_len(size)?;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<f64, Error> {
        let stream = make_stream(self.len, self.pattern, ctx.rng)?;
        let sorted = sorted_copy(&stream);
        let digest = TDigest::new_with_size(self.digest_size).merge_unsorted(stream);

        let max_err = self
            .fractions
            .iter()
            .map(|&f| (normalized_rank(&sorted, digest.estimate_quantile(f)) - f).abs())
            .fold(0.0, f64::max);
        Ok(max_err)
    }
}

/// Nanoseconds per value of building a t-digest and per quantile query.
#[derive(Debug, Clone, Default)]
pub struct TDigestUpdateSpeed {
    digest_size: usize,
    pattern: StreamPattern,
    len: usize,
}

impl TrialBody for TDigestUpdateSpeed {
    type Stats = SpeedStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.digest_size = read_size(config)?;
        self.pattern = StreamPattern::from_config(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.len = stream_len(size)?;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<SpeedSample, Error> {
        let stream = make_stream(self.len, self.pattern, ctx.rng)?;

        let start = ctx.clock.now_nanos();
        let digest = TDigest::new_with_size(self.digest_size).merge_unsorted(stream);
        let update_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        let mut sum = 0.0;
        for rank in GAUSSIAN_RANKS {
            sum += digest.estimate_quantile(rank);
        }
        black_box(sum);
        let query_nanos = ctx.clock.elapsed_since(start);

        Ok(SpeedSample::new()
            .with_phase("Update", update_nanos, self.len as u64)
            .with_phase("Query", query_nanos, GAUSSIAN_RANKS.len() as u64))
    }
}

/// Cost of building `Merge_numSketches` t-digests over the same stream and merging them.
#[derive(Debug, Clone, Default)]
pub struct TDigestMergeSpeed {
    digest_size: usize,
    pattern: StreamPattern,
    sketches: usize,
    len: usize,
}

impl TrialBody for TDigestMergeSpeed {
    type Stats = SpeedStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.digest_size = read_size(config)?;
        self.pattern = StreamPattern::from_config(config)?;
        self.sketches = num_sketches(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.len = stream_len(size)?;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<SpeedSample, Error> {
        let stream = make_stream(self.len, self.pattern, ctx.rng)?;
        let inputs: Vec<Vec<f64>> = (0..self.sketches).map(|_| stream.clone()).collect();
        let n = self.sketches as u64;

        let start = ctx.clock.now_nanos();
        let empty: Vec<TDigest> = (0..self.sketches)
            .map(|_| TDigest::new_with_size(self.digest_size))
            .collect();
        let build_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        let parts: Vec<TDigest> = empty
            .into_iter()
            .zip(inputs)
            .map(|(digest, values)| digest.merge_unsorted(values))
            .collect();
        let update_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        let merged = TDigest::merge_digests(parts);
        let merge_nanos = ctx.clock.elapsed_since(start);
        black_box(merged.count());

        Ok(SpeedSample::new()
            .with_phase("Build", build_nanos, n)
            .with_phase("Update", update_nanos, n * self.len as u64)
            .with_phase("Merge", merge_nanos, n))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_rank_error_is_small_on_sorted_stream() {
        let config = ConfigStore::parse("TDigest_size=100\nStream_Pattern=Sorted").unwrap();
        let mut body = TDigestRankAccuracy::default();
        body.configure(&config).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let clock = ManualClock::new(1);
        let mut ctx = TrialContext {
            config: &config,
            rng: &mut rng,
            clock: &clock,
        };
        body.prepare_trial(1000, &mut ctx).unwrap();
        let err = body.do_trial(&mut ctx).unwrap();
        assert!((0.0..0.05).contains(&err), "err = {err}");
    }

    #[test]
    fn test_merge_needs_sketch_count() {
        let config = ConfigStore::parse("TDigest_size=100\nMerge_numSketches=0").unwrap();
        let err = TDigestMergeSpeed::default().configure(&config).unwrap_err();
        assert_eq!(err.context_value("key"), Some("Merge_numSketches"));
    }

    #[test]
    fn test_missing_size() {
        let mut body = TDigestUpdateSpeed::default();
        let err = body.configure(&ConfigStore::new()).unwrap_err();
        assert_eq!(err.context_value("key"), Some(TDIGEST_SIZE_KEY));
    }
}
