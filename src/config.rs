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

//! Flat string-keyed job configuration.
//!
//! A job file is a sequence of `key=value` lines. Everything after an
//! unescaped `#` is a comment, `\#` stands for a literal `#`, and lines that
//! are shorter than three characters once the comment is stripped are
//! ignored. Values are kept as strings; parsing them is up to the caller.
//!
//! # Usage
//!
//! ```rust
//! # use datasketches_characterization::config::ConfigStore;
//! let config = ConfigStore::parse("Trials_lgMinU=2 # smallest stream\nLgK = 12\n").unwrap();
//! assert_eq!(config.must_get("Trials_lgMinU").unwrap(), "2");
//! assert_eq!(config.must_get_parsed::<u8>("LgK").unwrap(), 12);
//! assert!(config.get("Seed").is_none());
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

/// Lines shorter than this, after comment stripping, carry no pair.
const MIN_LINE_LEN: usize = 3;

/// A map of configuration keys to raw string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigStore {
    map: HashMap<String, String>,
}

impl ConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a job text into a new store.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut store = Self::new();
        store.load_from(text)?;
        Ok(store)
    }

    /// Reads and parses a job file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::io("failed to read job file", err).with_context("path", path.display())
        })?;
        Self::parse(&text).map_err(|err| err.with_context("path", path.display()))
    }

    /// Loads `key=value` lines into this store. Later occurrences of a key replace earlier ones.
    pub fn load_from(&mut self, text: &str) -> Result<(), Error> {
        for (idx, raw) in text.lines().enumerate() {
            let line = strip_comment(raw.trim());
            let line = line.trim();
            if line.len() < MIN_LINE_LEN {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::config_invalid("missing valid key-value separator")
                    .with_context("line_no", idx + 1)
                    .with_context("line", line));
            };
            self.put(key.trim(), value.trim());
        }
        Ok(())
    }

    /// Loads pairs separated by `,`, tab or newline, as given on a command line.
    pub fn load_kv_pairs(&mut self, pairs: &str) -> Result<(), Error> {
        for pair in pairs.split([',', '\t', '\n']) {
            if pair.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(Error::config_invalid("missing valid key-value separator")
                    .with_context("pair", pair));
            };
            self.put(key.trim(), value.trim());
        }
        Ok(())
    }

    /// Inserts a pair, returning the previous value of the key.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.map.insert(key.into(), value.into())
    }

    /// Returns the value of a key, which may be empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Returns the value of a required key.
    ///
    /// Fails with [`ErrorKind::MissingKey`](crate::error::ErrorKind::MissingKey) when the key is
    /// absent or its value is empty.
    pub fn must_get(&self, key: &str) -> Result<&str, Error> {
        match self.get(key) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(Error::missing_key(key)),
        }
    }

    /// Parses the value of a required key.
    pub fn must_get_parsed<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        parse_value(key, self.must_get(key)?)
    }

    /// Parses the value of an optional key, falling back to `default` when it is absent or empty.
    pub fn get_parsed_or<T>(&self, key: &str, default: T) -> Result<T, Error>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(v) if !v.is_empty() => parse_value(key, v),
            _ => Ok(default),
        }
    }

    /// Copies every pair of `other` into this store; `other` wins on collision.
    pub fn merge(&mut self, other: &ConfigStore) -> &mut Self {
        for (k, v) in other.map.iter() {
            self.map.insert(k.clone(), v.clone());
        }
        self
    }

    /// Renders all pairs as `key=value{separator}`, sorted case-insensitively by the pair text.
    pub fn extract_kv_pairs(&self, separator: &str) -> String {
        let mut pairs = self
            .map
            .iter()
            .map(|(k, v)| format!("{k}={v}{separator}"))
            .collect::<Vec<_>>();
        pairs.sort_by_cached_key(|s| s.to_lowercase());
        pairs.concat()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|err| {
        Error::config_invalid(format!("cannot parse value of {key}"))
            .with_context("key", key)
            .with_context("value", value)
            .set_source(err)
    })
}

/// Drops everything after the first unescaped `#` and unescapes `\#`.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}
