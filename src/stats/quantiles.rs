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

use std::mem;

use tdigest::TDigest;

/// Bounded-memory order statistics over trial results.
///
/// Values are buffered and merged into a t-digest whenever the buffer fills;
/// min and max are tracked exactly. NaN values are not ranked.
#[derive(Debug, Clone)]
pub struct ErrorQuantiles {
    digest: TDigest,
    buffer: Vec<f64>,
    capacity: usize,
    count: u64,
    min: f64,
    max: f64,
}

impl ErrorQuantiles {
    /// Creates an empty structure holding up to `2^lg_resolution` centroids.
    pub fn new(lg_resolution: u8) -> Self {
        let capacity = 1usize << lg_resolution.clamp(4, 20);
        Self {
            digest: TDigest::new_with_size(capacity),
            buffer: Vec::with_capacity(capacity),
            capacity,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.buffer.push(value);
        if self.buffer.len() >= self.capacity {
            let values = mem::take(&mut self.buffer);
            self.digest = self.digest.merge_unsorted(values);
            self.buffer.reserve(self.capacity);
        }
    }

    /// Number of ranked values.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Smallest value seen, NaN if empty.
    pub fn min(&self) -> f64 {
        if self.is_empty() { f64::NAN } else { self.min }
    }

    /// Largest value seen, NaN if empty.
    pub fn max(&self) -> f64 {
        if self.is_empty() { f64::NAN } else { self.max }
    }

    /// Returns the approximate value at normalized rank `rank`, NaN if empty.
    pub fn quantile(&self, rank: f64) -> f64 {
        self.quantiles(&[rank])[0]
    }

    /// Returns the approximate values at each of `ranks`, NaN for all if empty.
    pub fn quantiles(&self, ranks: &[f64]) -> Vec<f64> {
        if self.is_empty() {
            return vec![f64::NAN; ranks.len()];
        }
        let merged;
        let digest = if self.buffer.is_empty() {
            &self.digest
        } else {
            merged = self.digest.merge_unsorted(self.buffer.clone());
            &merged
        };
        ranks
            .iter()
            .map(|&rank| {
                if rank <= 0.0 {
                    self.min
                } else if rank >= 1.0 {
                    self.max
                } else {
                    digest.estimate_quantile(rank).clamp(self.min, self.max)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_nan() {
        let q = ErrorQuantiles::new(8);
        assert!(q.quantile(0.5).is_nan());
        assert!(q.min().is_nan());
        assert!(q.max().is_nan());
    }

    #[test]
    fn test_constant_values() {
        let mut q = ErrorQuantiles::new(4);
        // more values than the buffer holds, so the digest is merged at least once
        for _ in 0..100 {
            q.update(0.25);
        }
        assert_eq!(q.count(), 100);
        for v in q.quantiles(&[0.0, 0.1, 0.5, 0.9, 1.0]) {
            assert_eq!(v, 0.25);
        }
    }

    #[test]
    fn test_nan_is_not_ranked() {
        let mut q = ErrorQuantiles::new(8);
        q.update(f64::NAN);
        q.update(1.0);
        assert_eq!(q.count(), 1);
        assert_eq!(q.quantile(0.5), 1.0);
    }
}
