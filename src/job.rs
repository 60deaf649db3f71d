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

//! A characterization job: one configuration, one profile, one report.
//!
//! A job reads its configuration, resolves `JobProfile` through a
//! [`Registry`], seeds the random source and runs the profile between a
//! `# START JOB` and a `# END JOB` banner. The final configuration, including
//! the seed that was used, is written to the report so a run can be repeated.

use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::Clock;
use crate::config::ConfigStore;
use crate::error::Error;
use crate::profiles::ProfileContext;
use crate::profiles::Registry;
use crate::report::ReportSink;
use crate::report::format_elapsed;

pub const JOB_PROFILE_KEY: &str = "JobProfile";
pub const SEED_KEY: &str = "Seed";
pub const OUTPUT_DIR_KEY: &str = "OutputDir";
pub const OUTPUT_FILE_NAME_KEY: &str = "OutputFileName";

/// A loaded job, ready to run.
#[derive(Debug, Clone)]
pub struct Job {
    config: ConfigStore,
    profile_name: String,
    seed: u64,
}

impl Job {
    /// Validates the job keys of `config`.
    ///
    /// When `Seed` is absent a random seed is drawn and recorded in the configuration.
    pub fn new(mut config: ConfigStore) -> Result<Self, Error> {
        let profile_name = config.must_get(JOB_PROFILE_KEY)?.to_string();
        let seed = match config.get(SEED_KEY) {
            None | Some("") => {
                let seed: u64 = rand::random();
                config.put(SEED_KEY, seed.to_string());
                tracing::info!(seed, "no seed configured, drew a random one");
                seed
            }
            Some(_) => config.must_get_parsed(SEED_KEY)?,
        };
        Ok(Self {
            config,
            profile_name,
            seed,
        })
    }

    /// Loads a job file and merges `overrides` over it.
    pub fn load(path: impl AsRef<Path>, overrides: &ConfigStore) -> Result<Self, Error> {
        let mut config = ConfigStore::load_file(path)?;
        config.merge(overrides);
        Self::new(config)
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `OutputDir`, or the working directory.
    pub fn output_dir(&self) -> PathBuf {
        match self.config.get(OUTPUT_DIR_KEY) {
            None | Some("") => PathBuf::from("."),
            Some(dir) => PathBuf::from(dir),
        }
    }

    /// Names the report file of a job started at `unix_secs` and records it as `OutputFileName`.
    pub fn output_path(&mut self, unix_secs: u64) -> PathBuf {
        let name = format!("{}_{unix_secs}.tsv", self.profile_name);
        self.config.put(OUTPUT_FILE_NAME_KEY, name.as_str());
        self.output_dir().join(name)
    }

    /// Runs the profile and writes the whole report to `sink`.
    pub fn run(
        &self,
        registry: &Registry,
        sink: &mut dyn ReportSink,
        clock: &dyn Clock,
    ) -> Result<(), Error> {
        let name = self.profile_name.as_str();
        let mut profile = registry.create(name)?;
        tracing::info!(profile = name, seed = self.seed, "job started");

        sink.comment(&format!("START JOB {name}"))?;
        sink.flush()?;
        let start = clock.now_nanos();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut ctx = ProfileContext {
            config: &self.config,
            rng: &mut rng,
            clock,
            sink: &mut *sink,
        };
        profile
            .run(&mut ctx)
            .map_err(|err| err.with_context("profile", name))?;

        let elapsed = clock.elapsed_since(start);
        sink.comment("PROPERTIES:")?;
        for pair in self.config.extract_kv_pairs("\n").lines() {
            sink.comment(pair)?;
        }
        sink.comment(&format!("Total Job Time        : {}", format_elapsed(elapsed)))?;
        sink.comment(&format!("END JOB {name}"))?;
        sink.flush()?;
        tracing::info!(profile = name, elapsed = %format_elapsed(elapsed), "job finished");
        Ok(())
    }
}

/// Seconds since the Unix epoch, zero if the system clock is before it.
pub fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
