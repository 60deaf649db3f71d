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

//! Tab-separated report output.
//!
//! Reports are append-only: rows are written once and never rewritten, so a
//! long job can be watched or interrupted without losing what it already
//! wrote. Lines that are not table data start with `#`.

use std::fmt;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::error::Error;

/// Prefix of non-data lines.
pub const COMMENT_PREFIX: &str = "# ";

/// One value of a report row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{}", format_float(*v)),
            Cell::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Formats a float with six decimals in fixed notation for moderate magnitudes and in
/// scientific notation otherwise.
///
/// ```rust
/// # use datasketches_characterization::report::format_float;
/// assert_eq!(format_float(0.0), "0");
/// assert_eq!(format_float(0.5), "0.500000");
/// assert_eq!(format_float(1.5e-5), "1.500000e-5");
/// assert_eq!(format_float(f64::NAN), "NaN");
/// ```
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }
    let abs = v.abs();
    if (1e-3..1e7).contains(&abs) {
        format!("{v:.6}")
    } else {
        format!("{v:.6e}")
    }
}

/// Formats a duration as `HH:MM:SS.mmm`; hours are not wrapped.
///
/// ```rust
/// # use datasketches_characterization::report::format_elapsed;
/// assert_eq!(format_elapsed(3_723_004_000_000), "01:02:03.004");
/// ```
pub fn format_elapsed(nanos: u64) -> String {
    let millis = nanos / 1_000_000;
    let (hours, rem) = (millis / 3_600_000, millis % 3_600_000);
    let (minutes, rem) = (rem / 60_000, rem % 60_000);
    let (seconds, millis) = (rem / 1_000, rem % 1_000);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Destination of report lines.
pub trait ReportSink {
    /// Appends one line; the line terminator is added by the sink.
    fn write_line(&mut self, line: &str) -> Result<(), Error>;

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Appends a non-data line.
    fn comment(&mut self, text: &str) -> Result<(), Error> {
        self.write_line(&format!("{COMMENT_PREFIX}{text}"))
    }

    /// Appends a table header.
    fn header(&mut self, labels: &[String]) -> Result<(), Error> {
        self.write_line(&labels.join("\t"))
    }

    /// Appends a table row.
    fn row(&mut self, cells: &[Cell]) -> Result<(), Error> {
        let line = cells
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\t");
        self.write_line(&line)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        (**self).write_line(line)
    }

    fn flush(&mut self) -> Result<(), Error> {
        (**self).flush()
    }

    fn comment(&mut self, text: &str) -> Result<(), Error> {
        (**self).comment(text)
    }

    fn header(&mut self, labels: &[String]) -> Result<(), Error> {
        (**self).header(labels)
    }

    fn row(&mut self, cells: &[Cell]) -> Result<(), Error> {
        (**self).row(cells)
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines that are not comments.
    pub fn table_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.starts_with('#'))
            .collect()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl ReportSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Writes every line to stdout and, when opened with a path, appends it to a file.
#[derive(Debug)]
pub struct TeeSink {
    stdout: Option<io::Stdout>,
    file: Option<(PathBuf, BufWriter<File>)>,
}

impl TeeSink {
    /// Writes to stdout only.
    pub fn stdout() -> Self {
        Self {
            stdout: Some(io::stdout()),
            file: None,
        }
    }

    /// Writes to stdout and appends to `path`, creating the file if needed.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut sink = Self::stdout();
        sink.open_file(path)?;
        Ok(sink)
    }

    /// Appends to `path` only.
    pub fn file_only(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut sink = Self {
            stdout: None,
            file: None,
        };
        sink.open_file(path)?;
        Ok(sink)
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(p, _)| p.as_path())
    }

    fn open_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                Error::io("failed to open report file", err).with_context("path", path.display())
            })?;
        self.file = Some((path.to_path_buf(), BufWriter::new(file)));
        Ok(())
    }
}

impl ReportSink for TeeSink {
    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        if let Some(stdout) = &self.stdout {
            writeln!(stdout.lock(), "{line}")
                .map_err(|err| Error::io("failed to write report to stdout", err))?;
        }
        if let Some((path, file)) = &mut self.file {
            writeln!(file, "{line}").map_err(|err| {
                Error::io("failed to write report file", err).with_context("path", path.display())
            })?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        if let Some(stdout) = &self.stdout {
            stdout
                .lock()
                .flush()
                .map_err(|err| Error::io("failed to flush stdout", err))?;
        }
        if let Some((path, file)) = &mut self.file {
            file.flush().map_err(|err| {
                Error::io("failed to flush report file", err).with_context("path", path.display())
            })?;
        }
        Ok(())
    }
}

impl Drop for TeeSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
