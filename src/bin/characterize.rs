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

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use datasketches_characterization::clock::MonotonicClock;
use datasketches_characterization::config::ConfigStore;
use datasketches_characterization::job::Job;
use datasketches_characterization::job::unix_seconds_now;
use datasketches_characterization::profiles::builtin_registry;
use datasketches_characterization::report::TeeSink;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "characterize")]
#[command(version, about = "Accuracy and speed characterization of streaming sketches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one job per configuration file, in order
    Run {
        /// Job configuration files
        #[arg(required = true)]
        configs: Vec<PathBuf>,

        /// Override a configuration value (can be specified multiple times)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Write the report to stdout only
        #[arg(long)]
        no_file: bool,
    },

    /// List the registered profiles
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = builtin_registry();
    match cli.command {
        Commands::List => {
            for name in registry.names() {
                println!("{name}");
            }
        }
        Commands::Run {
            configs,
            set,
            no_file,
        } => {
            let mut overrides = ConfigStore::new();
            for pair in &set {
                overrides
                    .load_kv_pairs(pair)
                    .with_context(|| format!("invalid override {pair:?}"))?;
            }

            for path in &configs {
                let mut job = Job::load(path, &overrides)
                    .with_context(|| format!("failed to load job {}", path.display()))?;
                registry
                    .ensure(job.profile_name())
                    .with_context(|| format!("job {} names no known profile", path.display()))?;
                let mut sink = if no_file {
                    TeeSink::stdout()
                } else {
                    let out = job.output_path(unix_seconds_now());
                    tracing::info!(path = %out.display(), "writing report");
                    TeeSink::with_file(&out)?
                };
                job.run(&registry, &mut sink, &MonotonicClock::new())
                    .with_context(|| format!("job {} failed", path.display()))?;
            }
        }
    }

    Ok(())
}
