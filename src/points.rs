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

//! Plot point generation.
//!
//! Plot points are the x-axis values (stream lengths, numbers of uniques) of a
//! characterization table. They follow a power-of-two series with a
//! configurable number of points per octave (PPO): the generating index `gi`
//! maps to `round(2^(gi / ppo))`, and indices that round onto an already
//! emitted value are skipped, so small sizes never repeat.
//!
//! # Usage
//!
//! ```rust
//! # use datasketches_characterization::points;
//! assert_eq!(points::points(2, 4, 1).unwrap(), vec![4, 8, 16]);
//! assert_eq!(points::points(3, 4, 2).unwrap(), vec![8, 11, 16]);
//! assert_eq!(points::pwr2_series_next(4, 16), 19);
//! ```

use crate::error::Error;

/// The largest supported exponent; larger points would overflow the series arithmetic.
pub const MAX_LG_POINT: u8 = 62;

/// Returns the next point after `cur` on the power-of-two series with `ppo` points per octave.
///
/// The result is always strictly greater than `cur`.
pub fn pwr2_series_next(ppo: u32, cur: u64) -> u64 {
    let base = cur.max(1);
    let ppo = f64::from(ppo.max(1));
    // floor never passes the index of `cur`, so no series point above it is skipped
    let mut gi = ((base as f64).log2() * ppo).floor() as i64;
    loop {
        gi += 1;
        let next = (gi as f64 / ppo).exp2().round() as u64;
        if next > cur {
            return next;
        }
    }
}

/// Returns the plot points from `2^lg_start` through `2^lg_end`, `ppo` points per octave.
pub fn points(lg_start: u8, lg_end: u8, ppo: u32) -> Result<Vec<u64>, Error> {
    check_args(lg_start, lg_end, ppo)?;
    if ppo == 1 {
        return Ok((lg_start..=lg_end).map(|lg| 1u64 << lg).collect());
    }

    let end = 1u64 << lg_end;
    let mut out = Vec::new();
    let mut p = 1u64 << lg_start;
    while p <= end {
        out.push(p);
        p = pwr2_series_next(ppo, p);
    }
    Ok(out)
}

/// Counts the points [`points`] would return without materializing them.
pub fn count_points(lg_start: u8, lg_end: u8, ppo: u32) -> Result<usize, Error> {
    check_args(lg_start, lg_end, ppo)?;
    let end = 1u64 << lg_end;
    let mut p = 1u64 << lg_start;
    let mut count = 0;
    while p <= end {
        p = pwr2_series_next(ppo, p);
        count += 1;
    }
    Ok(count)
}

/// Returns `n` evenly spaced values from `x1` to `x2`, inclusive.
///
/// With `use_log` the spacing is even in log space and both endpoints must be positive.
pub fn evenly_spaced(x1: f64, x2: f64, n: usize, use_log: bool) -> Result<Vec<f64>, Error> {
    if n == 0 {
        return Err(Error::invalid_argument("number of points must be > 0"));
    }
    if use_log && (x1 <= 0.0 || x2 <= 0.0) {
        return Err(Error::invalid_argument("x1 and x2 must be > 0 for log spacing")
            .with_context("x1", x1)
            .with_context("x2", x2));
    }
    let mut out = Vec::with_capacity(n);
    out.push(x1);
    if n == 1 {
        return Ok(out);
    }

    let steps = (n - 1) as f64;
    if use_log {
        let log_min = x1.ln();
        let delta = (x2 / x1).ln() / steps;
        out.extend((1..n - 1).map(|i| (delta * i as f64 + log_min).exp()));
    } else {
        let delta = (x2 - x1) / steps;
        out.extend((1..n - 1).map(|i| delta * i as f64 + x1));
    }
    // exact endpoint, no accumulated rounding
    out.push(x2);
    Ok(out)
}

fn check_args(lg_start: u8, lg_end: u8, ppo: u32) -> Result<(), Error> {
    if ppo < 1 {
        return Err(Error::invalid_argument("points per octave must be >= 1"));
    }
    if lg_end < lg_start {
        return Err(Error::invalid_argument("lg_end must be >= lg_start")
            .with_context("lg_start", lg_start)
            .with_context("lg_end", lg_end));
    }
    if lg_end > MAX_LG_POINT {
        return Err(Error::invalid_argument(format!(
            "lg_end must be <= {MAX_LG_POINT}"
        ))
        .with_context("lg_end", lg_end));
    }
    Ok(())
}
