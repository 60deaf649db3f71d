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

//! The generic trial runner.
//!
//! A [`TrialRunner`] walks the plot points of a run in ascending order. For
//! every point it asks the [`TrialBody`] to prepare, looks up the trial count
//! in the [`TrialSchedule`], runs that many trials and folds every sample into
//! fresh statistics, then writes one report row. The statistic family comes
//! from the body's [`TrialBody::Stats`], so accuracy, speed and SerDe
//! profiles share this one runner.
//!
//! # Keys
//!
//! | key                | required | meaning                                    |
//! |--------------------|----------|--------------------------------------------|
//! | `Trials_lgMinU`    | yes      | lg of the smallest plot point              |
//! | `Trials_lgMaxU`    | yes      | lg of the largest plot point               |
//! | `Trials_UPPO`      | yes      | plot points per octave                     |
//! | `Trials_lgMinT`    | yes      | lg of the trial count at large points      |
//! | `Trials_lgMaxT`    | yes      | lg of the trial count at small points      |
//! | `Trials_lgQK`      | yes      | lg of the order-statistics resolution      |
//! | `Trials_lgMinBpU`  | no       | lg of the first breakpoint, `Trials_lgMinU` |
//! | `Trials_lgMaxBpU`  | no       | lg of the last breakpoint, `Trials_lgMaxU`  |
//!
//! `Trials_interData` and `Trials_bytes` only apply to the
//! [`StreamAccuracyRunner`].

mod stream_accuracy;

pub use self::stream_accuracy::BYTES_KEY;
pub use self::stream_accuracy::INTER_DATA_KEY;
pub use self::stream_accuracy::StreamAccuracyRunner;
pub use self::stream_accuracy::TPPO_KEY;
pub use self::stream_accuracy::StreamTrialBody;

use rand::rngs::StdRng;

use crate::clock::Clock;
use crate::config::ConfigStore;
use crate::error::Error;
use crate::points;
use crate::report::Cell;
use crate::report::ReportSink;
use crate::schedule::TrialSchedule;
use crate::stats::PointStats;

pub const LG_MIN_U_KEY: &str = "Trials_lgMinU";
pub const LG_MAX_U_KEY: &str = "Trials_lgMaxU";
pub const UPPO_KEY: &str = "Trials_UPPO";
pub const LG_MIN_T_KEY: &str = "Trials_lgMinT";
pub const LG_MAX_T_KEY: &str = "Trials_lgMaxT";
pub const LG_QK_KEY: &str = "Trials_lgQK";
pub const LG_MIN_BP_KEY: &str = "Trials_lgMinBpU";
pub const LG_MAX_BP_KEY: &str = "Trials_lgMaxBpU";

/// What a trial hook can reach while it runs.
pub struct TrialContext<'a> {
    pub config: &'a ConfigStore,
    pub rng: &'a mut StdRng,
    pub clock: &'a dyn Clock,
}

/// The sketch-specific part of a run.
pub trait TrialBody {
    /// Statistics of one plot point; its sample type is what a trial returns.
    type Stats: PointStats;

    /// Reads the body's own keys once, before the first plot point.
    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        let _ = config;
        Ok(())
    }

    /// Called once per plot point before its trials.
    fn prepare_trial(&mut self, size: u64, ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        let _ = (size, ctx);
        Ok(())
    }

    /// Runs one trial at the prepared plot point.
    fn do_trial(
        &mut self,
        ctx: &mut TrialContext<'_>,
    ) -> Result<<Self::Stats as PointStats>::Sample, Error>;
}

/// The runner keys of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub lg_min_u: u8,
    pub lg_max_u: u8,
    pub uppo: u32,
    pub lg_qk: u8,
    pub schedule: TrialSchedule,
}

impl RunnerConfig {
    pub fn from_config(config: &ConfigStore) -> Result<Self, Error> {
        let lg_min_u: u8 = config.must_get_parsed(LG_MIN_U_KEY)?;
        let lg_max_u: u8 = config.must_get_parsed(LG_MAX_U_KEY)?;
        let uppo: u32 = config.must_get_parsed(UPPO_KEY)?;
        let lg_min_t: u8 = config.must_get_parsed(LG_MIN_T_KEY)?;
        let lg_max_t: u8 = config.must_get_parsed(LG_MAX_T_KEY)?;
        let lg_qk: u8 = config.must_get_parsed(LG_QK_KEY)?;
        let lg_min_bp: u8 = config.get_parsed_or(LG_MIN_BP_KEY, lg_min_u)?;
        let lg_max_bp: u8 = config.get_parsed_or(LG_MAX_BP_KEY, lg_max_u)?;
        let schedule = TrialSchedule::new(lg_min_t, lg_max_t, lg_min_bp, lg_max_bp)?;
        Ok(Self {
            lg_min_u,
            lg_max_u,
            uppo,
            lg_qk,
            schedule,
        })
    }

    /// The plot points of the run.
    pub fn points(&self) -> Result<Vec<u64>, Error> {
        points::points(self.lg_min_u, self.lg_max_u, self.uppo)
    }
}

/// The statistics of one finished plot point.
#[derive(Debug, Clone)]
pub struct PointResult<S> {
    pub size: u64,
    pub trials: u64,
    pub stats: S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Configuring,
    Iterating { next: usize },
    Done,
}

/// Drives a [`TrialBody`] over the plot points of a run.
///
/// # Usage
///
/// ```rust
/// # use datasketches_characterization::clock::ManualClock;
/// # use datasketches_characterization::config::ConfigStore;
/// # use datasketches_characterization::error::Error;
/// # use datasketches_characterization::report::MemorySink;
/// # use datasketches_characterization::runner::{TrialBody, TrialContext, TrialRunner};
/// # use datasketches_characterization::stats::{Estimate, RunningStats};
/// # use rand::SeedableRng;
/// struct Exact(u64);
///
/// impl TrialBody for Exact {
///     type Stats = RunningStats;
///
///     fn prepare_trial(&mut self, size: u64, _: &mut TrialContext<'_>) -> Result<(), Error> {
///         self.0 = size;
///         Ok(())
///     }
///
///     fn do_trial(&mut self, _: &mut TrialContext<'_>) -> Result<Estimate, Error> {
///         Ok(Estimate::new(self.0 as f64, self.0 as f64))
///     }
/// }
///
/// let config = ConfigStore::parse(
///     "Trials_lgMinU=2\nTrials_lgMaxU=4\nTrials_UPPO=1\n\
///      Trials_lgMinT=2\nTrials_lgMaxT=4\nTrials_lgQK=8\n",
/// )
/// .unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let clock = ManualClock::new(1);
/// let mut runner = TrialRunner::from_config(Exact(0), &config, &mut rng, &clock).unwrap();
/// let mut sink = MemorySink::new();
/// assert_eq!(runner.run(&mut sink).unwrap(), 3);
/// assert_eq!(sink.table_lines()[1].split('\t').take(2).collect::<Vec<_>>(), ["4", "16"]);
/// ```
pub struct TrialRunner<'a, B: TrialBody> {
    body: B,
    config: &'a ConfigStore,
    rng: &'a mut StdRng,
    clock: &'a dyn Clock,
    params: Option<RunnerConfig>,
    points: Vec<u64>,
    state: State,
    header_written: bool,
}

impl<'a, B: TrialBody> TrialRunner<'a, B> {
    /// Creates a runner in the configuring state; nothing is read until the first step.
    pub fn new(
        body: B,
        config: &'a ConfigStore,
        rng: &'a mut StdRng,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            body,
            config,
            rng,
            clock,
            params: None,
            points: Vec::new(),
            state: State::Configuring,
            header_written: false,
        }
    }

    /// Creates a runner and configures it right away, failing on bad configuration.
    pub fn from_config(
        body: B,
        config: &'a ConfigStore,
        rng: &'a mut StdRng,
        clock: &'a dyn Clock,
    ) -> Result<Self, Error> {
        let mut runner = Self::new(body, config, rng, clock);
        runner.configure()?;
        Ok(runner)
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    /// The runner keys, once configured.
    pub fn params(&self) -> Option<&RunnerConfig> {
        self.params.as_ref()
    }

    /// The plot points, once configured.
    pub fn plot_points(&self) -> &[u64] {
        &self.points
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    fn configure(&mut self) -> Result<(), Error> {
        if self.state != State::Configuring {
            return Ok(());
        }
        let params = match RunnerConfig::from_config(self.config) {
            Ok(params) => params,
            Err(err) => {
                self.state = State::Done;
                return Err(err);
            }
        };
        let points = match params.points() {
            Ok(points) => points,
            Err(err) => {
                self.state = State::Done;
                return Err(err);
            }
        };
        if let Err(err) = self.body.configure(self.config) {
            self.state = State::Done;
            return Err(err);
        }
        tracing::info!(
            points = points.len(),
            min = points.first().copied().unwrap_or_default(),
            max = points.last().copied().unwrap_or_default(),
            "trial runner configured"
        );
        self.params = Some(params);
        self.points = points;
        self.state = State::Iterating { next: 0 };
        Ok(())
    }

    /// Runs the trials of the next plot point and writes its row.
    ///
    /// Returns `None` once every point is done. After an error the runner is done as well.
    pub fn step(
        &mut self,
        sink: &mut dyn ReportSink,
    ) -> Result<Option<PointResult<B::Stats>>, Error> {
        self.configure()?;
        let State::Iterating { next } = self.state else {
            return Ok(None);
        };
        let (Some(params), Some(&size)) = (self.params.as_ref(), self.points.get(next)) else {
            self.state = State::Done;
            return Ok(None);
        };
        let trials = params.schedule.trials_for(size);
        let lg_qk = params.lg_qk;

        match self.run_point(size, trials, lg_qk, sink) {
            Ok(result) => {
                self.state = if next + 1 < self.points.len() {
                    State::Iterating { next: next + 1 }
                } else {
                    State::Done
                };
                Ok(Some(result))
            }
            Err(err) => {
                self.state = State::Done;
                Err(err)
            }
        }
    }

    /// Steps until done and returns the number of rows written.
    pub fn run(&mut self, sink: &mut dyn ReportSink) -> Result<usize, Error> {
        let mut rows = 0;
        while self.step(sink)?.is_some() {
            rows += 1;
        }
        sink.flush()?;
        Ok(rows)
    }

    fn run_point(
        &mut self,
        size: u64,
        trials: u64,
        lg_qk: u8,
        sink: &mut dyn ReportSink,
    ) -> Result<PointResult<B::Stats>, Error> {
        let start = self.clock.now_nanos();
        let mut ctx = TrialContext {
            config: self.config,
            rng: &mut *self.rng,
            clock: self.clock,
        };
        self.body
            .prepare_trial(size, &mut ctx)
            .map_err(|err| trial_error("prepare_trial", size, err))?;

        let mut stats = B::Stats::new(lg_qk);
        for _ in 0..trials {
            let sample = self
                .body
                .do_trial(&mut ctx)
                .map_err(|err| trial_error("do_trial", size, err))?;
            stats.record(sample);
        }

        if !self.header_written {
            let mut labels = vec!["Size".to_string(), "Trials".to_string()];
            labels.extend(stats.header());
            sink.header(&labels)?;
            self.header_written = true;
        }
        let mut cells = vec![Cell::Int(size), Cell::Int(trials)];
        cells.extend(stats.cells());
        sink.row(&cells)?;

        tracing::debug!(
            size,
            trials,
            elapsed_nanos = self.clock.elapsed_since(start),
            "plot point done"
        );
        Ok(PointResult {
            size,
            trials,
            stats,
        })
    }
}

fn trial_error(stage: &'static str, size: u64, err: Error) -> Error {
    Error::trial_failed(format!("{stage} failed"))
        .with_context("stage", stage)
        .with_context("size", size)
        .set_source(err)
}
