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

use datasketches_characterization::report::Cell;
use datasketches_characterization::report::ReportSink;
use datasketches_characterization::report::TeeSink;
use datasketches_characterization::report::format_elapsed;
use datasketches_characterization::report::format_float;
use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn test_number_formatting() {
    assert_that!(Cell::Int(1 << 40).to_string().as_str(), eq("1099511627776"));
    assert_that!(format_float(0.001).as_str(), eq("0.001000"));
    assert_that!(format_float(0.000999).as_str(), eq("9.990000e-4"));
    assert_that!(format_float(9_999_999.5).as_str(), eq("9999999.500000"));
    assert_that!(format_float(1e7).as_str(), eq("1.000000e7"));
    assert_that!(format_float(-2.5e-9).as_str(), eq("-2.500000e-9"));
    assert_that!(Cell::Text("Random".to_string()).to_string().as_str(), eq("Random"));
}

#[test]
fn test_elapsed_formatting() {
    assert_that!(format_elapsed(0).as_str(), eq("00:00:00.000"));
    assert_that!(format_elapsed(999_999).as_str(), eq("00:00:00.000"));
    assert_that!(format_elapsed(61_500_000_000).as_str(), eq("00:01:01.500"));
    assert_that!(format_elapsed(100 * 3_600_000_000_000).as_str(), eq("100:00:00.000"));
}

#[test]
fn test_file_is_appended() {
    let path = std::env::temp_dir().join(format!("characterize-{}-append.tsv", std::process::id()));
    let _ = fs::remove_file(&path);
    for run in 0..2u64 {
        let mut sink = TeeSink::file_only(&path).unwrap();
        assert_eq!(sink.path(), Some(path.as_path()));
        sink.comment("START").unwrap();
        sink.row(&[Cell::Int(run), Cell::Float(0.5)]).unwrap();
        sink.flush().unwrap();
    }
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "# START\n0\t0.500000\n# START\n1\t0.500000\n");
    fs::remove_file(&path).unwrap();
}
