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

//! Built-in profiles and the registry they are resolved through.
//!
//! A profile is the entry point a job names with `JobProfile`. Most profiles
//! are a [`TrialBody`] or [`StreamTrialBody`] adapter over a sketch crate,
//! wrapped by [`trial_profile`] or [`stream_profile`].

mod ddsketch;
mod exact;
#[cfg(feature = "datasketches")]
mod hll;
mod tdigest;

pub use self::ddsketch::ConcurrentMode;
pub use self::ddsketch::DDSketchConcurrentSpeed;
pub use self::ddsketch::DDSketchMergeSpeed;
pub use self::ddsketch::DDSketchRelativeAccuracy;
pub use self::ddsketch::DDSketchUpdateSpeed;
pub use self::exact::ExactUniqueAccuracy;
#[cfg(feature = "datasketches")]
pub use self::hll::HllAccuracy;
#[cfg(feature = "datasketches")]
pub use self::hll::HllSerDe;
#[cfg(feature = "datasketches")]
pub use self::hll::HllUpdateSpeed;
#[cfg(feature = "datasketches")]
pub use self::hll::ThetaAccuracy;
pub use self::tdigest::TDigestMergeSpeed;
pub use self::tdigest::TDigestRankAccuracy;
pub use self::tdigest::TDigestUpdateSpeed;

use std::collections::BTreeMap;
use std::marker::PhantomData;

use rand::rngs::StdRng;

use crate::clock::Clock;
use crate::config::ConfigStore;
use crate::error::Error;
use crate::points;
use crate::report::ReportSink;
use crate::runner::StreamAccuracyRunner;
use crate::runner::StreamTrialBody;
use crate::runner::TrialBody;
use crate::runner::TrialRunner;

/// Key of the number of query fractions of the accuracy profiles.
pub const NUM_FRACTIONS_KEY: &str = "Accuracy_numFractions";

/// Key of the number of partial sketches the merge profiles build and merge.
pub const NUM_SKETCHES_KEY: &str = "Merge_numSketches";

const DEFAULT_NUM_FRACTIONS: usize = 20;

/// Everything a running profile can reach.
pub struct ProfileContext<'a> {
    pub config: &'a ConfigStore,
    pub rng: &'a mut StdRng,
    pub clock: &'a dyn Clock,
    pub sink: &'a mut dyn ReportSink,
}

/// A named characterization a job can run.
pub trait Profile {
    fn run(&mut self, ctx: &mut ProfileContext<'_>) -> Result<(), Error>;
}

/// Creates a fresh profile instance.
pub type ProfileFactory = fn() -> Box<dyn Profile>;

/// Profile names mapped to their factories.
///
/// # Usage
///
/// ```rust
/// # use datasketches_characterization::profiles::builtin_registry;
/// let registry = builtin_registry();
/// assert!(registry.contains("TDigestRankAccuracy"));
/// assert!(registry.create("NoSuchProfile").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    factories: BTreeMap<&'static str, ProfileFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory, replacing any earlier one of the same name.
    pub fn register(&mut self, name: &'static str, factory: ProfileFactory) -> &mut Self {
        self.factories.insert(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Fails like [`Registry::create`] when `name` is not registered, without creating anything.
    pub fn ensure(&self, name: &str) -> Result<(), Error> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(unknown_profile(name))
        }
    }

    /// Creates the profile registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Profile>, Error> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(unknown_profile(name)),
        }
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

fn unknown_profile(name: &str) -> Error {
    Error::config_invalid("unknown profile").with_context("profile", name)
}

/// The registry of every profile this crate ships.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register("TDigestRankAccuracy", trial_profile::<TDigestRankAccuracy>)
        .register("TDigestUpdateSpeed", trial_profile::<TDigestUpdateSpeed>)
        .register("TDigestMergeSpeed", trial_profile::<TDigestMergeSpeed>)
        .register("DDSketchRelativeAccuracy", trial_profile::<DDSketchRelativeAccuracy>)
        .register("DDSketchUpdateSpeed", trial_profile::<DDSketchUpdateSpeed>)
        .register("DDSketchConcurrentSpeed", trial_profile::<DDSketchConcurrentSpeed>)
        .register("DDSketchMergeSpeed", trial_profile::<DDSketchMergeSpeed>)
        .register("ExactUniqueAccuracy", stream_profile::<ExactUniqueAccuracy>);
    #[cfg(feature = "datasketches")]
    {
        registry
            .register("HllAccuracy", stream_profile::<HllAccuracy>)
            .register("HllUpdateSpeed", trial_profile::<HllUpdateSpeed>)
            .register("HllSerDe", trial_profile::<HllSerDe>)
            .register("ThetaAccuracy", stream_profile::<ThetaAccuracy>);
    }
    registry
}

/// Runs a default-constructed [`TrialBody`] through a [`TrialRunner`].
pub struct TrialProfile<B>(PhantomData<B>);

impl<B: TrialBody + Default> Profile for TrialProfile<B> {
    fn run(&mut self, ctx: &mut ProfileContext<'_>) -> Result<(), Error> {
        let mut runner = TrialRunner::from_config(B::default(), ctx.config, ctx.rng, ctx.clock)?;
        let rows = runner.run(&mut *ctx.sink)?;
        tracing::debug!(rows, "trial profile finished");
        Ok(())
    }
}

/// Runs a default-constructed [`StreamTrialBody`] through a [`StreamAccuracyRunner`].
pub struct StreamProfile<B>(PhantomData<B>);

impl<B: StreamTrialBody + Default> Profile for StreamProfile<B> {
    fn run(&mut self, ctx: &mut ProfileContext<'_>) -> Result<(), Error> {
        let mut runner =
            StreamAccuracyRunner::from_config(B::default(), ctx.config, ctx.rng, ctx.clock)?;
        let tables = runner.run(&mut *ctx.sink)?;
        tracing::debug!(tables, "stream profile finished");
        Ok(())
    }
}

/// A [`ProfileFactory`] for a [`TrialBody`].
pub fn trial_profile<B: TrialBody + Default + 'static>() -> Box<dyn Profile> {
    Box::new(TrialProfile::<B>(PhantomData))
}

/// A [`ProfileFactory`] for a [`StreamTrialBody`].
pub fn stream_profile<B: StreamTrialBody + Default + 'static>() -> Box<dyn Profile> {
    Box::new(StreamProfile::<B>(PhantomData))
}

/// Query fractions strictly inside `(0, 1)`, evenly spaced.
fn query_fractions(config: &ConfigStore) -> Result<Vec<f64>, Error> {
    let n: usize = config.get_parsed_or(NUM_FRACTIONS_KEY, DEFAULT_NUM_FRACTIONS)?;
    let step = 1.0 / (n as f64 + 1.0);
    points::evenly_spaced(step, 1.0 - step, n, false)
        .map_err(|err| err.with_context("key", NUM_FRACTIONS_KEY))
}

fn num_sketches(config: &ConfigStore) -> Result<usize, Error> {
    let n: usize = config.must_get_parsed(NUM_SKETCHES_KEY)?;
    if n == 0 {
        return Err(Error::config_invalid("number of sketches must be > 0")
            .with_context("key", NUM_SKETCHES_KEY));
    }
    Ok(n)
}

/// Fraction of `sorted` values that are `<= value`.
fn normalized_rank(sorted: &[f64], value: f64) -> f64 {
    sorted.partition_point(|&v| v <= value) as f64 / sorted.len() as f64
}

/// The value at normalized rank `rank` of `sorted`, using the lower nearest rank.
fn value_at_rank(sorted: &[f64], rank: f64) -> f64 {
    let last = sorted.len().saturating_sub(1);
    let idx = ((rank * last as f64).floor() as usize).min(last);
    sorted.get(idx).copied().unwrap_or(f64::NAN)
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(normalized_rank(&sorted, 2.0), 0.5);
        assert_eq!(normalized_rank(&sorted, 0.5), 0.0);
        assert_eq!(value_at_rank(&sorted, 0.0), 1.0);
        assert_eq!(value_at_rank(&sorted, 1.0), 4.0);
        assert!(value_at_rank(&[], 0.5).is_nan());
    }

    #[test]
    fn test_query_fractions() {
        let config = ConfigStore::parse("Accuracy_numFractions=3").unwrap();
        let fractions = query_fractions(&config).unwrap();
        assert_eq!(fractions, vec![0.25, 0.5, 0.75]);
    }
}
