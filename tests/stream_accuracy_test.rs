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

use datasketches_characterization::clock::ManualClock;
use datasketches_characterization::config::ConfigStore;
use datasketches_characterization::error::Error;
use datasketches_characterization::error::ErrorKind;
use datasketches_characterization::profiles::ExactUniqueAccuracy;
use datasketches_characterization::report::MemorySink;
use datasketches_characterization::runner::StreamAccuracyRunner;
use datasketches_characterization::runner::StreamTrialBody;
use googletest::assert_that;
use googletest::prelude::eq;
use googletest::prelude::near;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn config(extra: &str) -> ConfigStore {
    let mut config = ConfigStore::parse(
        "Trials_lgMinU=0\nTrials_lgMaxU=6\nTrials_UPPO=1\n\
         Trials_lgMinT=1\nTrials_lgMaxT=3\nTrials_TPPO=1\nTrials_lgQK=6\n",
    )
    .unwrap();
    config.load_from(extra).unwrap();
    config
}

#[test]
fn test_exact_counting_has_zero_error() {
    let config = config("Trials_bytes=true");
    let mut rng = StdRng::seed_from_u64(9);
    let clock = ManualClock::new(1_000);
    let mut runner =
        StreamAccuracyRunner::from_config(ExactUniqueAccuracy::default(), &config, &mut rng, &clock)
            .unwrap();
    let mut sink = MemorySink::new();
    // only the final checkpoint prints a table
    assert_that!(runner.run(&mut sink).unwrap(), eq(1usize));
    assert_that!(runner.trials(), eq(8u64));
    assert_that!(runner.updates(), eq(8 * 64u64));

    for (point, stats) in runner.plot_points().iter().zip(runner.stats()) {
        assert_that!(stats.count(), eq(8u64));
        assert_that!(stats.mean_estimate(), eq(*point as f64));
        assert_that!(stats.rms_relative_error(), eq(0.0));
        assert_that!(stats.bytes(), eq(*point * 8));
    }

    let table = sink.table_lines();
    assert_that!(table.len(), eq(1 + 7usize));
    assert!(table[0].starts_with("TrueU\tMeanEst\tMeanRelErr\tRMS_RE\tTrials\tMin\t"));
    assert!(table[0].ends_with("\tMax\tBytes\tReMerit"));
    assert!(table[7].starts_with("64\t64.000000\t0\t0\t8\t"));
    assert!(table[7].ends_with("\t512\t0"));
}

#[test]
fn test_progress_at_every_checkpoint() {
    let config = config("Trials_interData=true");
    let mut rng = StdRng::seed_from_u64(9);
    let clock = ManualClock::new(1_000);
    let mut runner =
        StreamAccuracyRunner::from_config(ExactUniqueAccuracy::default(), &config, &mut rng, &clock)
            .unwrap();
    let mut sink = MemorySink::new();
    // checkpoints at 2, 4 and 8 trials
    assert_that!(runner.run(&mut sink).unwrap(), eq(3usize));

    let cum_trials: Vec<&str> = sink
        .lines()
        .iter()
        .filter_map(|l| l.strip_prefix("# Cum Trials             : "))
        .collect();
    assert_eq!(cum_trials, vec!["2", "4", "8"]);
    assert!(sink.lines().iter().any(|l| l.starts_with("# Est Time to Complete   : ")));
    // without sizes the Bytes column is zero
    assert!(sink.table_lines()[1].ends_with("\t0\t0"));
}

/// Always overestimates by ten percent.
#[derive(Default)]
struct Biased {
    count: u64,
}

impl StreamTrialBody for Biased {
    fn reset(&mut self) -> Result<(), Error> {
        self.count = 0;
        Ok(())
    }

    fn update(&mut self, _value: u64) {
        self.count += 1;
    }

    fn estimate(&self) -> f64 {
        self.count as f64 * 1.1
    }
}

#[test]
fn test_biased_estimates() {
    let config = config("");
    let mut rng = StdRng::seed_from_u64(9);
    let clock = ManualClock::new(1);
    let mut runner =
        StreamAccuracyRunner::from_config(Biased::default(), &config, &mut rng, &clock).unwrap();
    runner.run(&mut MemorySink::new()).unwrap();
    for stats in runner.stats() {
        assert_that!(stats.mean_relative_error(), near(0.1, 1e-12));
        assert_that!(stats.rms_relative_error(), near(0.1, 1e-12));
    }
}

#[test]
fn test_requires_trial_ppo() {
    let mut config = config("");
    config.put("Trials_TPPO", "");
    let mut rng = StdRng::seed_from_u64(9);
    let clock = ManualClock::new(1);
    let err =
        StreamAccuracyRunner::from_config(Biased::default(), &config, &mut rng, &clock)
            .err()
            .unwrap();
    assert_that!(err.kind(), eq(ErrorKind::MissingKey));
}

/// Exact estimates with bounds one percent apart per standard deviation.
#[derive(Default)]
struct Bounded {
    count: u64,
}

impl StreamTrialBody for Bounded {
    fn reset(&mut self) -> Result<(), Error> {
        self.count = 0;
        Ok(())
    }

    fn update(&mut self, _value: u64) {
        self.count += 1;
    }

    fn estimate(&self) -> f64 {
        self.count as f64
    }

    fn bounds(&self, num_std_dev: u8) -> Option<(f64, f64)> {
        let width = self.count as f64 * 0.01 * f64::from(num_std_dev);
        Some((self.count as f64 - width, self.count as f64 + width))
    }
}

#[test]
fn test_bound_columns() {
    let config = config("");
    let mut rng = StdRng::seed_from_u64(9);
    let clock = ManualClock::new(1);
    let mut runner =
        StreamAccuracyRunner::from_config(Bounded::default(), &config, &mut rng, &clock).unwrap();
    let mut sink = MemorySink::new();
    runner.run(&mut sink).unwrap();

    let expected = [-0.03, -0.02, -0.01, 0.01, 0.02, 0.03];
    for stats in runner.stats() {
        let bounds = stats.relative_bounds().unwrap();
        for (got, want) in bounds.iter().zip(expected) {
            assert_that!(*got, near(want, 1e-12));
        }
    }

    let table = sink.table_lines();
    assert!(table[0].ends_with("\tReMerit\tavgLB3\tavgLB2\tavgLB1\tavgUB1\tavgUB2\tavgUB3"));
    let last: Vec<&str> = table[7].split('\t').collect();
    assert_that!(last[last.len() - 6], eq("-0.030000"));
    assert_that!(last[last.len() - 1], eq("0.030000"));
}

#[test]
fn test_no_bound_columns_without_bounds() {
    let config = config("");
    let mut rng = StdRng::seed_from_u64(9);
    let clock = ManualClock::new(1);
    let mut runner =
        StreamAccuracyRunner::from_config(Biased::default(), &config, &mut rng, &clock).unwrap();
    let mut sink = MemorySink::new();
    runner.run(&mut sink).unwrap();
    assert!(runner.stats().iter().all(|s| s.relative_bounds().is_none()));
    assert!(sink.table_lines()[0].ends_with("\tReMerit"));
}
