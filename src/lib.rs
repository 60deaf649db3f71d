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

//! Accuracy and speed characterization of stochastic streaming sketches.
//!
//! A characterization job drives an existing sketch implementation through
//! many randomized trials at logarithmically spaced input sizes and reports,
//! per size, the distribution of its errors or the cost of its operations.
//!
//! The moving parts, leaf first:
//!
//! - [`points`]: the plot points of a run, a power-of-two series with a
//!   configurable number of points per octave.
//! - [`schedule`]: how many trials run at each plot point.
//! - [`stats`]: per point statistics folded trial by trial.
//! - [`runner`]: the state machine that ties them together around a
//!   pluggable [`runner::TrialBody`].
//! - [`config`], [`job`] and [`profiles`]: the job file, the job lifecycle and
//!   the built-in sketch adapters.
//!
//! # Usage
//!
//! ```rust
//! # use datasketches_characterization::clock::ManualClock;
//! # use datasketches_characterization::config::ConfigStore;
//! # use datasketches_characterization::job::Job;
//! # use datasketches_characterization::profiles::builtin_registry;
//! # use datasketches_characterization::report::MemorySink;
//! let config = ConfigStore::parse(
//!     "JobProfile=ExactUniqueAccuracy\nSeed=1\n\
//!      Trials_lgMinU=0\nTrials_lgMaxU=4\nTrials_UPPO=2\n\
//!      Trials_lgMinT=1\nTrials_lgMaxT=3\nTrials_TPPO=1\nTrials_lgQK=6\n",
//! )
//! .unwrap();
//! let job = Job::new(config).unwrap();
//! let mut sink = MemorySink::new();
//! job.run(&builtin_registry(), &mut sink, &ManualClock::new(1_000)).unwrap();
//! assert_eq!(sink.lines()[0], "# START JOB ExactUniqueAccuracy");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clock;
pub mod config;
pub mod error;
pub mod job;
pub mod points;
pub mod profiles;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod stats;
pub mod stream;
