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

//! HyperLogLog and theta characterizations over the `datasketches` crate.

use std::hint::black_box;

use datasketches::common::NumStdDev;
use datasketches::hll::HllSketch;
use datasketches::hll::HllType;
use datasketches::theta::ThetaSketch;

use crate::config::ConfigStore;
use crate::error::Error;
use crate::runner::StreamTrialBody;
use crate::runner::TrialBody;
use crate::runner::TrialContext;
use crate::stats::SerDeSample;
use crate::stats::SerDeStats;
use crate::stats::SpeedSample;
use crate::stats::SpeedStats;

pub const LG_K_KEY: &str = "LgK";
pub const HLL_TYPE_KEY: &str = "HllType";

const MIN_LG_K: u8 = 4;
const MAX_LG_K: u8 = 21;
const MIN_THETA_LG_K: u8 = 5;
const MAX_THETA_LG_K: u8 = 26;

fn read_lg_k(config: &ConfigStore, min: u8, max: u8) -> Result<u8, Error> {
    let lg_k: u8 = config.must_get_parsed(LG_K_KEY)?;
    if !(min..=max).contains(&lg_k) {
        return Err(Error::config_invalid(format!("lg_k must be in [{min}, {max}]"))
            .with_context("key", LG_K_KEY)
            .with_context("value", lg_k));
    }
    Ok(lg_k)
}

#[derive(Debug, Clone, Copy)]
struct HllParams {
    lg_k: u8,
    hll_type: HllType,
}

impl Default for HllParams {
    fn default() -> Self {
        Self {
            lg_k: 12,
            hll_type: HllType::Hll8,
        }
    }
}

impl HllParams {
    fn from_config(config: &ConfigStore) -> Result<Self, Error> {
        let lg_k = read_lg_k(config, MIN_LG_K, MAX_LG_K)?;
        let hll_type = match config.get(HLL_TYPE_KEY).map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("hll8") => HllType::Hll8,
            Some("hll6") => HllType::Hll6,
            Some("hll4") => HllType::Hll4,
            Some(other) => {
                return Err(Error::config_invalid("unknown HLL type")
                    .with_context("key", HLL_TYPE_KEY)
                    .with_context("value", other));
            }
        };
        Ok(Self { lg_k, hll_type })
    }

    fn sketch(&self) -> HllSketch {
        HllSketch::new(self.lg_k, self.hll_type)
    }
}

/// HLL estimates of a growing stream of uniques.
#[derive(Default)]
pub struct HllAccuracy {
    params: HllParams,
    sketch: Option<HllSketch>,
}

impl StreamTrialBody for HllAccuracy {
    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.params = HllParams::from_config(config)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.sketch = Some(self.params.sketch());
        Ok(())
    }

    fn update(&mut self, value: u64) {
        if let Some(sketch) = &mut self.sketch {
            sketch.update(value);
        }
    }

    fn estimate(&self) -> f64 {
        self.sketch.as_ref().map_or(0.0, HllSketch::estimate)
    }

    fn serialized_bytes(&self) -> Result<u64, Error> {
        Ok(self.sketch.as_ref().map_or(0, |s| s.serialize().len() as u64))
    }
}

fn num_std_dev(k: u8) -> Option<NumStdDev> {
    match k {
        1 => Some(NumStdDev::One),
        2 => Some(NumStdDev::Two),
        3 => Some(NumStdDev::Three),
        _ => None,
    }
}

/// Theta sketch estimates and confidence bounds over a growing stream of uniques.
#[derive(Default)]
pub struct ThetaAccuracy {
    lg_k: u8,
    sketch: Option<ThetaSketch>,
}

impl StreamTrialBody for ThetaAccuracy {
    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.lg_k = read_lg_k(config, MIN_THETA_LG_K, MAX_THETA_LG_K)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.sketch = Some(ThetaSketch::builder().lg_k(self.lg_k).build());
        Ok(())
    }

    fn update(&mut self, value: u64) {
        if let Some(sketch) = &mut self.sketch {
            sketch.update(value);
        }
    }

    fn estimate(&self) -> f64 {
        self.sketch.as_ref().map_or(0.0, ThetaSketch::estimate)
    }

    fn bounds(&self, k: u8) -> Option<(f64, f64)> {
        let sketch = self.sketch.as_ref()?;
        let k = num_std_dev(k)?;
        Some((sketch.lower_bound(k), sketch.upper_bound(k)))
    }

    fn serialized_bytes(&self) -> Result<u64, Error> {
        Ok(self.sketch.as_ref().map_or(0, |s| s.serialize().len() as u64))
    }
}

/// Nanoseconds per HLL update and per estimate.
#[derive(Debug, Default)]
pub struct HllUpdateSpeed {
    params: HllParams,
    size: u64,
    next_value: u64,
}

impl TrialBody for HllUpdateSpeed {
    type Stats = SpeedStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.params = HllParams::from_config(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        self.size = size;
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<SpeedSample, Error> {
        let mut sketch = self.params.sketch();
        let start = ctx.clock.now_nanos();
        for _ in 0..self.size {
            sketch.update(self.next_value);
            self.next_value = self.next_value.wrapping_add(1);
        }
        let update_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        black_box(sketch.estimate());
        let estimate_nanos = ctx.clock.elapsed_since(start);

        Ok(SpeedSample::new()
            .with_phase("Update", update_nanos, self.size)
            .with_phase("Estimate", estimate_nanos, 1))
    }
}

/// Serialize, deserialize and estimate timings of HLL sketches.
#[derive(Default)]
pub struct HllSerDe {
    params: HllParams,
    sketch: Option<HllSketch>,
}

impl TrialBody for HllSerDe {
    type Stats = SerDeStats;

    fn configure(&mut self, config: &ConfigStore) -> Result<(), Error> {
        self.params = HllParams::from_config(config)?;
        Ok(())
    }

    fn prepare_trial(&mut self, size: u64, _ctx: &mut TrialContext<'_>) -> Result<(), Error> {
        let mut sketch = self.params.sketch();
        for v in 0..size {
            sketch.update(v);
        }
        self.sketch = Some(sketch);
        Ok(())
    }

    fn do_trial(&mut self, ctx: &mut TrialContext<'_>) -> Result<SerDeSample, Error> {
        let Some(sketch) = &self.sketch else {
            return Err(Error::trial_failed("no sketch prepared"));
        };

        let start = ctx.clock.now_nanos();
        let bytes = sketch.serialize();
        let ser_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        let copy = HllSketch::deserialize(&bytes).map_err(|err| {
            Error::trial_failed("failed to deserialize HLL sketch").set_source(err)
        })?;
        let deser_nanos = ctx.clock.elapsed_since(start);

        let start = ctx.clock.now_nanos();
        black_box(copy.estimate());
        let est_nanos = ctx.clock.elapsed_since(start);

        Ok(SerDeSample {
            ser_nanos,
            deser_nanos,
            est_nanos,
            size_bytes: bytes.len() as u64,
        })
    }
}
