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

use datasketches_characterization::config::ConfigStore;
use datasketches_characterization::error::ErrorKind;
use datasketches_characterization::stream::StreamPattern;
use datasketches_characterization::stream::make_stream;
use googletest::assert_that;
use googletest::prelude::eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_ordered_patterns_are_permutations() {
    let mut rng = StdRng::seed_from_u64(5);
    let expected: Vec<f64> = (1..=101u32).map(f64::from).collect();
    for pattern in StreamPattern::ALL.into_iter().filter(|p| p.is_ordered()) {
        let mut stream = make_stream(101, pattern, &mut rng).unwrap();
        stream.sort_by(f64::total_cmp);
        assert_eq!(stream, expected, "{pattern}");
    }
}

#[test]
fn test_ordered_shapes() {
    let mut rng = StdRng::seed_from_u64(5);
    assert_eq!(make_stream(4, StreamPattern::Sorted, &mut rng).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(make_stream(4, StreamPattern::Reversed, &mut rng).unwrap(), vec![4.0, 3.0, 2.0, 1.0]);
    assert_eq!(make_stream(6, StreamPattern::ZoomIn, &mut rng).unwrap(), vec![1.0, 6.0, 2.0, 5.0, 3.0, 4.0]);
    assert_eq!(make_stream(6, StreamPattern::ZoomOut, &mut rng).unwrap(), vec![4.0, 3.0, 5.0, 2.0, 6.0, 1.0]);
    assert!(make_stream(0, StreamPattern::Random, &mut rng).unwrap().is_empty());
}

#[test]
fn test_distributions_are_positive() {
    let mut rng = StdRng::seed_from_u64(5);
    for pattern in [StreamPattern::Uniform, StreamPattern::Normal, StreamPattern::Exponential] {
        let stream = make_stream(1000, pattern, &mut rng).unwrap();
        assert_that!(stream.len(), eq(1000usize));
        assert!(stream.iter().all(|v| *v >= 0.0 && v.is_finite()), "{pattern}");
    }
}

#[test]
fn test_same_seed_same_stream() {
    let a = make_stream(50, StreamPattern::Random, &mut StdRng::seed_from_u64(11)).unwrap();
    let b = make_stream(50, StreamPattern::Random, &mut StdRng::seed_from_u64(11)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_pattern_from_config() {
    let config = ConfigStore::new();
    assert_that!(StreamPattern::from_config(&config).unwrap(), eq(StreamPattern::Random));
    let config = ConfigStore::parse("Stream_Pattern=zoom_in").unwrap();
    assert_that!(StreamPattern::from_config(&config).unwrap(), eq(StreamPattern::ZoomIn));
    let config = ConfigStore::parse("Stream_Pattern=spiral").unwrap();
    let err = StreamPattern::from_config(&config).unwrap_err();
    assert_that!(err.kind(), eq(ErrorKind::ConfigInvalid));
    assert_that!(err.context_value("key"), eq(Some("Stream_Pattern")));
}
