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

//! DDSketch characterizations over the `sketches-ddsketch` crate.

use std::hint::black_box;
use std::str::FromStr;
use std::sync::Mutex;
use std::thread;

use sketches_ddsketch::Config as DDSketchConfig;
use sketches_ddsketch::DDSketch;

use crate::config::ConfigStore;
use crate::error::Error;
use crate::profiles::num_sketches;
use crate::profiles::query_fractions;
use crate::profiles::sorted_copy;
use crate::profiles::tdigest::stream_len;
use crate::profiles::value_at_rank;
use crate::runner::TrialBody;
use crate::runner::TrialContext;
use crate::stats::ErrorStats;
use crate::stats::GAUSSIAN_RANKS;
use crate::stats::SpeedSample;
use crate::stats::SpeedStats;
use crate::stream::StreamPattern;
use crate::stream::make_stream;

pub const ALPHA_KEY: &str = "DDSketch_alpha";
pub const MAX_BINS_KEY: &str = "DDSketch_maxBins";
pub const MIN_VALUE_KEY: &str = "DDSketch_minValue";
pub const NUM_THREADS_KEY: &str = "NumThreads";
pub const CONCURRENT_MODE_KEY: &str = "Concurrent_mode";

const DEFAULT_MAX_BINS: u32 = 2048;
const DEFAULT_MIN_VALUE: f64 = 1e-9;

fn read_config(config: &ConfigStore) -> Result<DDSketchConfig, Error> {
    let alpha: f64 = config.must_get_parsed(ALPHA_KEY)?;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(Error::config_invalid("relative accuracy must be in (0, 1)")
            .with_context("key", ALPHA_KEY)
            .with_context("value", alpha));
    }
    let max_bins = config.get_parsed_or(MAX_BINS_KEY, DEFAULT_MAX_BINS)?;
    let min_value = config.get_parsed_or(MIN_VALUE_KEY, DEFAULT_MIN_VALUE)?;
    Ok(DDSketchConfig::new(alpha, max_bins, min_value))
}

fn build_sketch(config: DDSketchConfig, values: &[f64]) -> DDSketch {
    let mut sketch = DDSketch::new(config);
    for &v in values {
        sketch.add(v);
    }
    sketch
}

fn sketch_error(message: &'static str, err: impl std::fmt::Display) -> Error {
    Error::trial_failed(message).set_source(anyhow::anyhow!("{err}"))
}

/// Max relative error of DDSketch quantiles against the exact values.
#[derive(Debug, Clone, Default)]
pub struct DDSketchRelativeAccuracy {
    config: Option<DDSketchConfig>,
    pattern: StreamPattern,
    fractions: Vec<f64>,
    len: usize,
}

impl TrialBody for DDSketchRelativeAccuracy {
    type Stats = ErrorStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.config = Some(read_config(config)?);
        self.pattern = StreamPattern::from_config(config)?;
        self.fractions = query_fractions(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.len = stream_len(size)?;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<f64, Error> {
        let config = self.config.unwrap_or_else(DDSketchConfig::defaults);
        let stream = make_stream(self.len, self.pattern, ctx.rng)?;
        let sketch = build_sketch(config, &stream);
        let sorted = sorted_copy(&stream);

        let mut max_err: f64 = 0.0;
        for &f in &self.fractions {
            let est = sketch
                .quantile(f)
                .map_err(|err| sketch_error("quantile query failed", err))?
                .ok_or_else(|| Error::trial_failed("quantile of an empty sketch"))?;
            let truth = value_at_rank(&sorted, f);
            max_err = max_err.max(((est - truth) / truth).abs());
        }
        Ok(max_err)
    }
}

/// Nanoseconds per DDSketch insert and per quantile query.
#[derive(Debug, Clone, Default)]
pub struct DDSketchUpdateSpeed {
    config: Option<DDSketchConfig>,
    pattern: StreamPattern,
    len: usize,
}

impl TrialBody for DDSketchUpdateSpeed {
    type Stats = SpeedStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.config = Some(read_config(config)?);
        self.pattern = StreamPattern::from_config(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.len = stream_len(size)?;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<SpeedSample, Error> {
        let config = self.config.unwrap_or_else(DDSketchConfig::defaults);
        let stream = make_stream(self.len, self.pattern, ctx.rng)?;

        let start = ctx.clock.now_nanos();
        let sketch = build_sketch(config, &stream);
        let update_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        let mut sum = 0.0;
        for rank in GAUSSIAN_RANKS {
            sum += sketch.quantile(rank).ok().flatten().unwrap_or_default();
        }
        black_box(sum);
        let query_nanos = ctx.clock.elapsed_since(start);

        Ok(SpeedSample::new()
            .with_phase("Update", update_nanos, self.len as u64)
            .with_phase("Query", query_nanos, GAUSSIAN_RANKS.len() as u64))
    }
}

/// Cost of building `Merge_numSketches` DDSketches over the same stream and merging them.
#[derive(Debug, Clone, Default)]
pub struct DDSketchMergeSpeed {
    config: Option<DDSketchConfig>,
    pattern: StreamPattern,
    sketches: usize,
    len: usize,
}

impl TrialBody for DDSketchMergeSpeed {
    type Stats = SpeedStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.config = Some(read_config(config)?);
        self.pattern = StreamPattern::from_config(config)?;
        self.sketches = num_sketches(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.len = stream_len(size)?;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<SpeedSample, Error> {
        let config = self.config.unwrap_or_else(DDSketchConfig::defaults);
        let stream = make_stream(self.len, self.pattern, ctx.rng)?;
        let n = self.sketches as u64;

        let start = ctx.clock.now_nanos();
        let mut parts: Vec<DDSketch> = (0..self.sketches).map(|_| DDSketch::new(config)).collect();
        let build_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        for sketch in &mut parts {
            for &v in &stream {
                sketch.add(v);
            }
        }
        let update_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        let mut merged = DDSketch::new(config);
        for sketch in &parts {
            merged
                .merge(sketch)
                .map_err(|err| sketch_error("merge failed", err))?;
        }
        let merge_nanos = ctx.clock.elapsed_since(start);
        black_box(merged.count());

        Ok(SpeedSample::new()
            .with_phase("Build", build_nanos, n)
            .with_phase("Update", update_nanos, n * self.len as u64)
            .with_phase("Merge", merge_nanos, n))
    }
}

/// How concurrent writers share sketches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrentMode {
    /// One sketch per thread, merged after the threads join.
    #[default]
    Partitioned,
    /// One sketch behind a mutex.
    Locked,
}

impl FromStr for ConcurrentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "partitioned" => Ok(ConcurrentMode::Partitioned),
            "locked" => Ok(ConcurrentMode::Locked),
            _ => Err(Error::config_invalid("unknown concurrent mode")
                .with_context("key", CONCURRENT_MODE_KEY)
                .with_context("value", s)),
        }
    }
}

/// Throughput of DDSketch inserts from several threads.
///
/// Each trial splits the stream evenly over `NumThreads` scoped threads and
/// reports the wall time of all inserts, plus the merge time when partitioned.
#[derive(Debug, Clone, Default)]
pub struct DDSketchConcurrentSpeed {
    config: Option<DDSketchConfig>,
    pattern: StreamPattern,
    threads: usize,
    mode: ConcurrentMode,
    len: usize,
}

impl DDSketchConcurrentSpeed {
    fn partitioned(&self, config: DDSketchConfig, chunks: &[&[f64]]) -> Result<Vec<DDSketch>, Error> {
        thread::scope(|s| {
            let handles: Vec<_> = chunks
                .iter()
                .map(|chunk| s.spawn(move || build_sketch(config, chunk)))
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .map_err(|_| Error::trial_failed("sketch writer thread panicked"))
                })
                .collect()
        })
    }

    fn locked(&self, sketch: &Mutex<DDSketch>, chunks: &[&[f64]]) -> Result<(), Error> {
        thread::scope(|s| {
            let handles: Vec<_> = chunks
                .iter()
                .map(|chunk| {
                    s.spawn(move || -> Result<(), Error> {
                        for &v in chunk.iter() {
                            sketch
                                .lock()
                                .map_err(|_| Error::trial_failed("shared sketch lock poisoned"))?
                                .add(v);
                        }
                        Ok(())
                    })
                })
                .collect();
            for h in handles {
                h.join()
                    .map_err(|_| Error::trial_failed("sketch writer thread panicked"))??;
            }
            Ok(())
        })
    }
}

impl TrialBody for DDSketchConcurrentSpeed {
    type Stats = SpeedStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.config = Some(read_config(config)?);
        self.pattern = StreamPattern::from_config(config)?;
        self.threads = config.must_get_parsed(NUM_THREADS_KEY)?;
        if self.threads == 0 {
            return Err(Error::config_invalid("number of threads must be > 0")
                .with_context("key", NUM_THREADS_KEY));
        }
        self.mode = match config.get(CONCURRENT_MODE_KEY) {
            None | Some("") => ConcurrentMode::default(),
            Some(v) => v.parse()?,
        };
        tracing::debug!(threads = self.threads, mode = ?self.mode, "concurrent speed configured");
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.len = stream_len(size)?;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<SpeedSample, Error> {
        let config = self.config.unwrap_or_else(DDSketchConfig::defaults);
        let stream = make_stream(self.len, self.pattern, ctx.rng)?;
        let chunk_len = self.len.div_ceil(self.threads).max(1);
        let chunks: Vec<&[f64]> = stream.chunks(chunk_len).collect();

        let mut sample = SpeedSample::new();
        match self.mode {
            ConcurrentMode::Partitioned => {
                let start = ctx.clock.now_nanos();
                let sketches = self.partitioned(config, &chunks)?;
                sample.push("Update", ctx.clock.elapsed_since(start), self.len as u64);

                let start = ctx.clock.now_nanos();
                let mut merged = DDSketch::new(config);
                for sketch in &sketches {
                    merged
                        .merge(sketch)
                        .map_err(|err| sketch_error("merge failed", err))?;
                }
                sample.push("Merge", ctx.clock.elapsed_since(start), sketches.len() as u64);
                black_box(merged.count());
            }
            ConcurrentMode::Locked => {
                let shared = Mutex::new(DDSketch::new(config));
                let start = ctx.clock.now_nanos();
                self.locked(&shared, &chunks)?;
                sample.push("Update", ctx.clock.elapsed_since(start), self.len as u64);
            }
        }
        Ok(sample)
    }
}
