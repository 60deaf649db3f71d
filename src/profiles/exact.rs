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

use std::collections::HashSet;

use crate::error::Error;
use crate::runner::StreamTrialBody;

/// Exact distinct counting, the zero-error baseline of unique-count accuracy runs.
#[derive(Debug, Clone, Default)]
pub struct ExactUniqueAccuracy {
    seen: HashSet<u64>,
}

impl StreamTrialBody for ExactUniqueAccuracy {
    fn reset(&mut self) -> Result<(), Error> {
        self.seen.clear();
        Ok(())
    }

    fn update(&mut self, value: u64) {
        self.seen.insert(value);
    }

    fn estimate(&self) -> f64 {
        self.seen.len() as f64
    }

    fn serialized_bytes(&self) -> Result<u64, Error> {
        Ok((self.seen.len() * size_of::<u64>()) as u64)
    }
}
