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

//! Accuracy over a growing stream of unique values.
//!
//! One trial feeds a single sketch with fresh values up to the largest plot
//! point and records its estimate each time the stream passes a plot point.
//! Statistics live for the whole run, so tables can be emitted at trial
//! checkpoints: `2^Trials_lgMinT` trials first, then every point of the
//! `Trials_TPPO` series up to `2^Trials_lgMaxT`.

use rand::Rng;
use rand::rngs::StdRng;

use crate::clock::Clock;
use crate::config::ConfigStore;
use crate::error::Error;
use crate::points;
use crate::report::Cell;
use crate::report::ReportSink;
use crate::report::format_elapsed;
use crate::runner::LG_MAX_T_KEY;
use crate::runner::LG_MAX_U_KEY;
use crate::runner::LG_MIN_T_KEY;
use crate::runner::LG_MIN_U_KEY;
use crate::runner::LG_QK_KEY;
use crate::runner::UPPO_KEY;
use crate::stats::GAUSSIAN_RANK_LABELS;
use crate::stats::RunningStats;

pub const TPPO_KEY: &str = "Trials_TPPO";
/// Emit a table at every trial checkpoint, not just the last one.
pub const INTER_DATA_KEY: &str = "Trials_interData";
/// Ask the sketch for its serialized size at every plot point.
pub const BYTES_KEY: &str = "Trials_bytes";

/// A sketch under a unique-count accuracy run.
pub trait StreamTrialBody {
    /// Reads the body's own keys once, before the first trial.
    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        let _ = config;
        Ok(())
    }

    /// Starts a fresh trial with an empty sketch.
    fn reset(&mut self) -> Result<(), Error>;

    /// Feeds one value, never seen before in this run.
    fn update(&mut self, value: u64);

    /// The sketch's current estimate of the number of uniques fed.
    fn estimate(&self) -> f64;

    /// Lower and upper bounds of the estimate at `num_std_dev` standard deviations (1 to 3).
    ///
    /// Bodies that return `Some` get six extra table columns with the mean bounds relative to
    /// the true value.
    fn bounds(&self, num_std_dev: u8) -> Option<(f64, f64)> {
        let _ = num_std_dev;
        None
    }

    /// Serialized size of the sketch in its current state.
    fn serialized_bytes(&self) -> Result<u64, Error> {
        Ok(0)
    }
}

const BOUND_LABELS: [&str; 6] = ["avgLB3", "avgLB2", "avgLB1", "avgUB1", "avgUB2", "avgUB3"];

fn collect_bounds<B: StreamTrialBody>(body: &B) -> Option<[f64; 6]> {
    let (lb3, ub3) = body.bounds(3)?;
    let (lb2, ub2) = body.bounds(2)?;
    let (lb1, ub1) = body.bounds(1)?;
    Some([lb3, lb2, lb1, ub1, ub2, ub3])
}

#[derive(Debug, Clone, PartialEq)]
struct StreamParams {
    lg_max_u: u8,
    lg_min_t: u8,
    lg_max_t: u8,
    tppo: u32,
    inter_data: bool,
    report_bytes: bool,
}

/// Drives a [`StreamTrialBody`] through checkpointed accuracy trials.
pub struct StreamAccuracyRunner<'a, B: StreamTrialBody> {
    body: B,
    config: &'a ConfigStore,
    clock: &'a dyn Clock,
    params: StreamParams,
    points: Vec<u64>,
    stats: Vec<RunningStats>,
    next_value: u64,
    updates: u64,
    trials: u64,
}

impl<'a, B: StreamTrialBody> StreamAccuracyRunner<'a, B> {
    pub fn from_config(
        mut body: B,
        config: &'a ConfigStore,
        rng: &mut StdRng,
        clock: &'a dyn Clock,
    ) -> Result<Self, Error> {
        let lg_min_u: u8 = config.must_get_parsed(LG_MIN_U_KEY)?;
        let lg_max_u: u8 = config.must_get_parsed(LG_MAX_U_KEY)?;
        let uppo: u32 = config.must_get_parsed(UPPO_KEY)?;
        let lg_min_t: u8 = config.must_get_parsed(LG_MIN_T_KEY)?;
        let lg_max_t: u8 = config.must_get_parsed(LG_MAX_T_KEY)?;
        let tppo: u32 = config.must_get_parsed(TPPO_KEY)?;
        let lg_qk: u8 = config.must_get_parsed(LG_QK_KEY)?;
        let inter_data = config.get_parsed_or(INTER_DATA_KEY, false)?;
        let report_bytes = config.get_parsed_or(BYTES_KEY, false)?;
        // validates the trial series up front
        points::count_points(lg_min_t, lg_max_t, tppo)?;
        let points = points::points(lg_min_u, lg_max_u, uppo)?;
        body.configure(config)?;

        let stats = points.iter().map(|_| RunningStats::new(lg_qk)).collect();
        Ok(Self {
            body,
            config,
            clock,
            params: StreamParams {
                lg_max_u,
                lg_min_t,
                lg_max_t,
                tppo,
                inter_data,
                report_bytes,
            },
            points,
            stats,
            next_value: rng.random(),
            updates: 0,
            trials: 0,
        })
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn plot_points(&self) -> &[u64] {
        &self.points
    }

    /// Statistics per plot point, accumulated over every trial run so far.
    pub fn stats(&self) -> &[RunningStats] {
        &self.stats
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Runs every checkpoint and returns the number of tables written.
    pub fn run(&mut self, sink: &mut dyn ReportSink) -> Result<usize, Error> {
        let start = self.clock.now_nanos();
        let checkpoints = points::points(
            self.params.lg_min_t,
            self.params.lg_max_t,
            self.params.tppo,
        )?;
        let max_trials = 1u64 << self.params.lg_max_t;
        let mut tables = 0;
        for checkpoint in checkpoints {
            while self.trials < checkpoint {
                self.do_trial().map_err(|err| {
                    Error::trial_failed("stream trial failed")
                        .with_context("stage", "do_trial")
                        .with_context("trial", self.trials + 1)
                        .set_source(err)
                })?;
            }
            if checkpoint == max_trials || self.params.inter_data {
                self.write_table(sink)?;
                tables += 1;
            }
            self.write_progress(start, max_trials, sink)?;
            tracing::info!(trials = self.trials, updates = self.updates, "checkpoint reached");
        }
        sink.flush()?;
        Ok(tables)
    }

    fn do_trial(&mut self) -> Result<(), Error> {
        self.body.reset()?;
        let mut fed = 0u64;
        for (point, stats) in self.points.iter().zip(self.stats.iter_mut()) {
            while fed < *point {
                self.body.update(self.next_value);
                self.next_value = self.next_value.wrapping_add(1);
                fed += 1;
            }
            stats.record_estimate(self.body.estimate(), *point as f64);
            if let Some(bounds) = collect_bounds(&self.body) {
                stats.record_bounds(bounds);
            }
            if self.params.report_bytes {
                stats.record_bytes(self.body.serialized_bytes()?);
            }
        }
        self.updates += fed;
        self.trials += 1;
        Ok(())
    }

    fn write_table(&self, sink: &mut dyn ReportSink) -> Result<(), Error> {
        let mut labels: Vec<String> = ["TrueU", "MeanEst", "MeanRelErr", "RMS_RE", "Trials", "Min"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        labels.extend(GAUSSIAN_RANK_LABELS.iter().map(|s| s.to_string()));
        labels.extend(["Max", "Bytes", "ReMerit"].iter().map(|s| s.to_string()));
        let with_bounds = self.stats.iter().any(|s| s.relative_bounds().is_some());
        if with_bounds {
            labels.extend(BOUND_LABELS.iter().map(|s| s.to_string()));
        }
        sink.header(&labels)?;

        for (point, stats) in self.points.iter().zip(self.stats.iter()) {
            let rms = stats.rms_relative_error();
            let mut cells = vec![
                Cell::Int(*point),
                Cell::Float(stats.mean_estimate()),
                Cell::Float(stats.mean_relative_error()),
                Cell::Float(rms),
                Cell::Int(stats.count()),
            ];
            cells.extend(stats.relative_error_quantiles().into_iter().map(Cell::Float));
            let bytes = stats.bytes();
            cells.push(Cell::Int(bytes));
            cells.push(Cell::Float(rms * (bytes as f64).sqrt()));
            if with_bounds {
                let bounds = stats.relative_bounds().unwrap_or([f64::NAN; 6]);
                cells.extend(bounds.into_iter().map(Cell::Float));
            }
            sink.row(&cells)?;
        }
        Ok(())
    }

    fn write_progress(
        &self,
        start: u64,
        max_trials: u64,
        sink: &mut dyn ReportSink,
    ) -> Result<(), Error> {
        let elapsed = self.clock.elapsed_since(start);
        let per_trial = elapsed as f64 / self.trials as f64;
        let max_u = (1u64 << self.params.lg_max_u) as f64;
        let remaining = (per_trial * (max_trials - self.trials) as f64) as u64;

        sink.comment(&self.config.extract_kv_pairs(", "))?;
        sink.comment(&format!("Cum Trials             : {}", self.trials))?;
        sink.comment(&format!("Cum Updates            : {}", self.updates))?;
        sink.comment(&format!("Cum Trials Time        : {}", format_elapsed(elapsed)))?;
        sink.comment(&format!(
            "Time Per Trial, mSec   : {}",
            Cell::Float(per_trial / 1e6)
        ))?;
        sink.comment(&format!(
            "Avg Update Time, nSec  : {}",
            Cell::Float(per_trial / max_u)
        ))?;
        sink.comment(&format!(
            "Est Time to Complete   : {}",
            format_elapsed(remaining)
        ))?;
        Ok(())
    }
}
