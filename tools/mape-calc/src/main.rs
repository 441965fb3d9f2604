// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Command line front end of the MAP-E mapper and the address set algebra.
//!
//! Every subcommand prints its result as pretty JSON on stdout.

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use ipnet::IpNet;
use mape::{
    dto::{MappingSchemas, RuleTableDto},
    lookup,
    rules::RuleTable,
};
use serde::Serialize;
use utoipa::OpenApi;

use crate::cli::{Commands, Opts};

mod cli;

#[derive(Debug, Serialize)]
struct SummaryOutput {
    prefixes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ExclusiveOutput {
    exclusive: bool,
}

/// Address counts as decimal strings, they may exceed 2^128.
#[derive(Debug, Serialize)]
struct SizeOutput {
    /// Sum of the prefix sizes, overlaps counted repeatedly.
    total: String,
    /// Number of distinct addresses.
    distinct: String,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let _log_guards = mape_observability::setup_tracing(
        opts.logging.log_dir.as_deref(),
        opts.logging.stderr_format(),
    )
    .context("error setting up logging")?;

    let output = run(opts.command)?;
    println!("{output}");
    Ok(())
}

/// Executes a subcommand and returns its JSON output.
fn run(command: Commands) -> anyhow::Result<String> {
    tracing::debug!(?command, "Running command");
    match command {
        Commands::Provider(args) => to_json(&lookup::provider(args.into())?),
        Commands::MapRules { rules } => {
            let table = load_rules(&rules.rules)?;
            to_json(&RuleTableDto::from(&table))
        }
        Commands::Bmr { rules, addr6 } => {
            to_json(&lookup::bmr(&load_rules(&rules.rules)?, &addr6)?)
        }
        Commands::Ipv6 {
            rules,
            addr4,
            port,
        } => to_json(&lookup::ipv6_for(&load_rules(&rules.rules)?, &addr4, &port)?),
        Commands::Ipv4 { rules, addr6 } => {
            to_json(&lookup::ipv4_for(&load_rules(&rules.rules)?, &addr6)?)
        }
        Commands::Summarize { prefixes } => {
            to_json(&SummaryOutput {
                prefixes: address_set::summarize_strs(&prefixes)?,
            })
        }
        Commands::Exclusive { prefixes } => {
            to_json(&ExclusiveOutput {
                exclusive: address_set::exclusive_strs(&prefixes)?,
            })
        }
        Commands::Size { prefixes } => {
            let prefixes = prefixes
                .iter()
                .map(|prefix| address_set::parse_prefix(prefix))
                .collect::<Result<Vec<IpNet>, _>>()?;
            to_json(&SizeOutput {
                total: address_set::size_all(&prefixes).to_string(),
                distinct: address_set::coverage_size(&prefixes).to_string(),
            })
        }
        Commands::Schema => Ok(MappingSchemas::openapi().to_pretty_json()?),
    }
}

fn load_rules(path: &Path) -> anyhow::Result<RuleTable> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("error reading rule file {}", path.display()))?;
    let table = RuleTable::from_json(&json)
        .with_context(|| format!("error loading rule file {}", path.display()))?;
    tracing::info!(path = %path.display(), rules = table.len(), "Loaded rule file");
    Ok(table)
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("error serializing output")
}
