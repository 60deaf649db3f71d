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
use datasketches_characterization::error::ErrorKind;
use datasketches_characterization::job::Job;
use datasketches_characterization::profiles::builtin_registry;
use datasketches_characterization::report::MemorySink;
use googletest::assert_that;
use googletest::prelude::eq;
use googletest::prelude::le;

const SMALL_RUN: &str = "
Seed=7
Trials_lgMinU=3
Trials_lgMaxU=6
Trials_UPPO=1
Trials_lgMinT=0
Trials_lgMaxT=2
Trials_TPPO=1
Trials_lgQK=6
";

fn run_profile(profile: &str, keys: &str) -> MemorySink {
    let mut config = ConfigStore::parse(SMALL_RUN).unwrap();
    config.load_from(keys).unwrap();
    config.put("JobProfile", profile);
    let job = Job::new(config).unwrap();
    let mut sink = MemorySink::new();
    job.run(&builtin_registry(), &mut sink, &ManualClock::new(10))
        .unwrap();
    sink
}

fn column(sink: &MemorySink, name: &str) -> Vec<f64> {
    let table = sink.table_lines();
    let idx = table[0].split('\t').position(|h| h == name).unwrap();
    table[1..]
        .iter()
        .map(|row| row.split('\t').nth(idx).unwrap().parse().unwrap())
        .collect()
}

#[test]
fn test_builtin_names() {
    let registry = builtin_registry();
    let names: Vec<&str> = registry.names().collect();
    for name in [
        "DDSketchConcurrentSpeed",
        "DDSketchMergeSpeed",
        "DDSketchRelativeAccuracy",
        "DDSketchUpdateSpeed",
        "ExactUniqueAccuracy",
        "TDigestMergeSpeed",
        "TDigestRankAccuracy",
        "TDigestUpdateSpeed",
    ] {
        assert!(names.contains(&name), "{name} not registered");
    }
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn test_ensure_checks_names_only() {
    let registry = builtin_registry();
    assert!(registry.ensure("ExactUniqueAccuracy").is_ok());
    let err = registry.ensure("NoSuchProfile").unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::ConfigInvalid));
    assert_that!(err.context_value("profile"), eq(Some("NoSuchProfile")));
}

#[test]
fn test_tdigest_rank_accuracy() {
    let sink = run_profile("TDigestRankAccuracy", "TDigest_size=200\nStream_Pattern=ZoomIn");
    // sizes 8..64 fit in the digest, so errors stay within about one rank step of 1/8
    for err in column(&sink, "MeanErr") {
        assert_that!(err, le(0.2));
    }
}

#[test]
fn test_tdigest_update_speed() {
    let sink = run_profile("TDigestUpdateSpeed", "TDigest_size=100");
    let header = sink.table_lines()[0];
    assert_that!(header, eq("Size\tTrials\tnS/Update\tnS/Query"));
    // the manual clock advances 10ns per reading, so each phase takes 10ns
    assert_eq!(column(&sink, "nS/Update"), vec![10.0 / 8.0, 10.0 / 16.0, 10.0 / 32.0, 10.0 / 64.0]);
}

#[test]
fn test_ddsketch_relative_accuracy() {
    let sink = run_profile(
        "DDSketchRelativeAccuracy",
        "DDSketch_alpha=0.01\nStream_Pattern=Exponential",
    );
    for err in column(&sink, "Max") {
        assert_that!(err, le(0.021));
    }
}

#[test]
fn test_ddsketch_speed_profiles() {
    let sink = run_profile("DDSketchUpdateSpeed", "DDSketch_alpha=0.02");
    assert_that!(sink.table_lines().len(), eq(5usize));

    let sink = run_profile(
        "DDSketchConcurrentSpeed",
        "DDSketch_alpha=0.02\nNumThreads=2\nConcurrent_mode=Partitioned",
    );
    assert_that!(
        sink.table_lines()[0],
        eq("Size\tTrials\tnS/Update\tnS/Merge")
    );
    assert_eq!(column(&sink, "nS/Merge"), vec![5.0; 4]);
}

#[test]
fn test_exact_unique_accuracy() {
    let sink = run_profile("ExactUniqueAccuracy", "Trials_bytes=true");
    assert_eq!(column(&sink, "TrueU"), vec![8.0, 16.0, 32.0, 64.0]);
    assert_eq!(column(&sink, "RMS_RE"), vec![0.0; 4]);
    assert_eq!(column(&sink, "Bytes"), vec![64.0, 128.0, 256.0, 512.0]);
}

#[test]
fn test_merge_speed_profiles() {
    for (profile, keys) in [
        ("DDSketchMergeSpeed", "DDSketch_alpha=0.01\nMerge_numSketches=4"),
        ("TDigestMergeSpeed", "TDigest_size=100\nMerge_numSketches=4"),
    ] {
        let sink = run_profile(profile, keys);
        let table = sink.table_lines();
        assert_that!(table[0], eq("Size\tTrials\tnS/Build\tnS/Update\tnS/Merge"));
        // every phase spans one clock step of 10ns, spread over 4 sketches
        for ns in column(&sink, "nS/Merge") {
            assert_that!(ns, eq(2.5));
        }
        assert_eq!(column(&sink, "nS/Update"), vec![10.0 / 32.0, 10.0 / 64.0, 10.0 / 128.0, 10.0 / 256.0]);
    }
}

#[cfg(feature = "datasketches")]
#[test]
fn test_hll_profiles() {
    // up to 64 uniques an lg_k=10 sketch still holds a coupon list
    let sink = run_profile("HllAccuracy", "LgK=10");
    for err in column(&sink, "MeanRelErr") {
        assert_that!(err.abs(), le(0.05));
    }

    let sink = run_profile("HllSerDe", "LgK=10\nHllType=hll4");
    for bytes in column(&sink, "Size_B") {
        assert!(bytes > 0.0);
    }

    let sink = run_profile("HllUpdateSpeed", "LgK=10");
    assert_that!(sink.table_lines()[0], eq("Size\tTrials\tnS/Update\tnS/Estimate"));
}

#[cfg(feature = "datasketches")]
#[test]
fn test_theta_bound_columns() {
    let sink = run_profile("ThetaAccuracy", "LgK=10");
    assert!(sink.table_lines()[0].ends_with("\tavgUB2\tavgUB3"));
    let lb3 = column(&sink, "avgLB3");
    let ub3 = column(&sink, "avgUB3");
    for (lb, ub) in lb3.iter().zip(&ub3) {
        assert_that!(*lb, le(1e-9));
        assert_that!(*lb, le(*ub));
        assert!(*ub >= -1e-9);
    }
    for err in column(&sink, "MeanRelErr") {
        assert_that!(err.abs(), le(0.05));
    }
}
