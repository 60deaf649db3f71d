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

use std::fs;
use std::path::PathBuf;

use datasketches_characterization::clock::ManualClock;
use datasketches_characterization::config::ConfigStore;
use datasketches_characterization::error::ErrorKind;
use datasketches_characterization::job::Job;
use datasketches_characterization::profiles::builtin_registry;
use datasketches_characterization::report::MemorySink;
use datasketches_characterization::report::ReportSink;
use datasketches_characterization::report::TeeSink;
use googletest::assert_that;
use googletest::prelude::eq;

const TDIGEST_JOB: &str = "
JobProfile=TDigestRankAccuracy
Seed=12345
TDigest_size=100
Stream_Pattern=Random
Accuracy_numFractions=5
Trials_lgMinU=4
Trials_lgMaxU=8
Trials_UPPO=2
Trials_lgMinT=1
Trials_lgMaxT=3
Trials_lgQK=6
";

fn run(text: &str) -> MemorySink {
    let job = Job::new(ConfigStore::parse(text).unwrap()).unwrap();
    let mut sink = MemorySink::new();
    job.run(&builtin_registry(), &mut sink, &ManualClock::new(1_000))
        .unwrap();
    sink
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("characterize-{}-{name}", std::process::id()))
}

#[test]
fn test_job_banners_and_properties() {
    let sink = run(TDIGEST_JOB);
    let lines = sink.lines();
    assert_that!(lines[0].as_str(), eq("# START JOB TDigestRankAccuracy"));
    assert_that!(lines[lines.len() - 1].as_str(), eq("# END JOB TDigestRankAccuracy"));
    assert!(lines[lines.len() - 2].starts_with("# Total Job Time        : 00:00:00."));

    let props_at = lines.iter().position(|l| l == "# PROPERTIES:").unwrap();
    let props: Vec<&str> = lines[props_at + 1..lines.len() - 2]
        .iter()
        .map(|l| l.trim_start_matches("# "))
        .collect();
    assert_that!(props[0], eq("Accuracy_numFractions=5"));
    assert!(props.contains(&"Seed=12345"));
    let mut sorted = props.clone();
    sorted.sort_by_key(|p| p.to_lowercase());
    assert_eq!(props, sorted);

    // header plus one row per plot point: 16, 23, 32, 45, 64, 91, 128, 181, 256
    let table = sink.table_lines();
    assert_that!(table.len(), eq(10usize));
    assert!(table[0].starts_with("Size\tTrials\tMeanErr\tRmsErr\tMin\t"));
    assert!(table[1].starts_with("16\t8\t"));
    assert!(table[9].starts_with("256\t2\t"));
}

#[test]
fn test_same_seed_same_report() {
    assert_eq!(run(TDIGEST_JOB).table_lines(), run(TDIGEST_JOB).table_lines());
}

#[test]
fn test_seed_is_drawn_and_recorded() {
    let text = TDIGEST_JOB.replace("Seed=12345", "");
    let job = Job::new(ConfigStore::parse(&text).unwrap()).unwrap();
    let seed = job.seed().to_string();
    assert_that!(job.config().get("Seed"), eq(Some(seed.as_str())));
}

#[test]
fn test_job_key_errors() {
    let err = Job::new(ConfigStore::parse("Seed=1").unwrap()).unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::MissingKey));
    assert_that!(err.context_value("key"), eq(Some("JobProfile")));

    let err = Job::new(ConfigStore::parse("JobProfile=X\nSeed=minus one").unwrap()).unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::ConfigInvalid));

    let job = Job::new(ConfigStore::parse("JobProfile=NoSuchProfile\nSeed=1").unwrap()).unwrap();
    let mut sink = MemorySink::new();
    let err = job
        .run(&builtin_registry(), &mut sink, &ManualClock::new(1))
        .unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::ConfigInvalid));
    assert_that!(err.context_value("profile"), eq(Some("NoSuchProfile")));
    // nothing is written for a profile that cannot be resolved
    assert!(sink.lines().is_empty());
}

#[test]
fn test_profile_errors_carry_profile_name() {
    let text = TDIGEST_JOB.replace("TDigest_size=100", "");
    let job = Job::new(ConfigStore::parse(&text).unwrap()).unwrap();
    let err = job
        .run(&builtin_registry(), &mut MemorySink::new(), &ManualClock::new(1))
        .unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::MissingKey));
    assert_that!(err.context_value("key"), eq(Some("TDigest_size")));
    assert_that!(err.context_value("profile"), eq(Some("TDigestRankAccuracy")));
}

#[test]
fn test_load_with_overrides_and_output_file() {
    let job_path = temp_path("job.conf");
    fs::write(&job_path, TDIGEST_JOB).unwrap();
    let out_dir = temp_path("out");
    fs::create_dir_all(&out_dir).unwrap();

    let mut overrides = ConfigStore::new();
    overrides
        .load_kv_pairs(&format!("Trials_lgMaxU=5, OutputDir={}", out_dir.display()))
        .unwrap();
    let mut job = Job::load(&job_path, &overrides).unwrap();
    assert_that!(job.config().get("Trials_lgMaxU"), eq(Some("5")));

    let out = job.output_path(1_700_000_000);
    assert_eq!(out, out_dir.join("TDigestRankAccuracy_1700000000.tsv"));
    assert_that!(
        job.config().get("OutputFileName"),
        eq(Some("TDigestRankAccuracy_1700000000.tsv"))
    );

    {
        let mut sink = TeeSink::file_only(&out).unwrap();
        job.run(&builtin_registry(), &mut sink, &ManualClock::new(1))
            .unwrap();
        sink.flush().unwrap();
    }
    let report = fs::read_to_string(&out).unwrap();
    assert!(report.starts_with("# START JOB TDigestRankAccuracy\n"));
    assert!(report.contains("# OutputFileName=TDigestRankAccuracy_1700000000.tsv\n"));
    assert!(report.ends_with("# END JOB TDigestRankAccuracy\n"));

    fs::remove_file(&job_path).unwrap();
    fs::remove_dir_all(&out_dir).unwrap();
}
