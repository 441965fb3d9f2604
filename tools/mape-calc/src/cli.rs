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
//! mape-calc CLI options.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mape::ProviderParams;
use mape_observability::LogFormat;

/// MAP-E address and port calculator.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Opts {
    /// Top-level subcommand
    #[command(subcommand)]
    pub command: Commands,

    /// Logging options
    #[command(flatten)]
    pub logging: LoggingOptions,
}

/// Logging options.
#[derive(Debug, Args)]
pub struct LoggingOptions {
    /// Log to stderr.
    #[arg(long, global = true)]
    pub stderr: bool,

    /// Format of the stderr log.
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// Directory for the log file.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

impl LoggingOptions {
    /// The stderr log format, if logging to stderr is enabled.
    pub fn stderr_format(&self) -> Option<LogFormat> {
        self.stderr.then_some(self.log_format.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// The rule file to look addresses up in.
#[derive(Debug, Args)]
pub struct RuleFileArgs {
    /// JSON file with the Basic Mapping Rules.
    #[arg(long)]
    pub rules: PathBuf,
}

/// Provider parameters of one rule.
#[derive(Debug, Args)]
pub struct ProviderArgs {
    /// The rule IPv6 prefix (e.g. 2001:db8::/30).
    #[arg(long)]
    pub rule_net6: String,
    /// The rule IPv4 prefix (e.g. 10.0.0.0/12).
    #[arg(long)]
    pub rule_net4: String,
    /// Length of the Embedded Address bits.
    #[arg(long)]
    pub ea_bit_len: u8,
    /// PSID offset.
    #[arg(long, default_value_t = 6)]
    pub psid_offset: u8,
    /// The Border Relay IPv6 address.
    #[arg(long)]
    pub br_addr6: Option<String>,
    /// Use the RFC 7597 interface identifier.
    #[arg(long)]
    pub rfc: bool,
}

impl From<ProviderArgs> for ProviderParams {
    fn from(args: ProviderArgs) -> Self {
        ProviderParams {
            rule_net6: args.rule_net6,
            rule_net4: args.rule_net4,
            ea_bit_len: args.ea_bit_len,
            psid_offset: args.psid_offset,
            br_addr6: args.br_addr6,
            is_rfc: args.rfc,
        }
    }
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Derive the layout of a rule from provider parameters.
    Provider(ProviderArgs),
    /// Print the rule table.
    MapRules {
        #[command(flatten)]
        rules: RuleFileArgs,
    },
    /// Find the rule of a user prefix and print the mapping of the prefix.
    Bmr {
        #[command(flatten)]
        rules: RuleFileArgs,
        /// User IPv6 prefix or address, /56 or longer.
        #[arg(long)]
        addr6: String,
    },
    /// Map an IPv4 address and port to the user prefix and CE address.
    Ipv6 {
        #[command(flatten)]
        rules: RuleFileArgs,
        /// Shared IPv4 address.
        #[arg(long)]
        addr4: String,
        /// TCP/UDP port.
        #[arg(long)]
        port: String,
    },
    /// Map a user IPv6 address or prefix to its IPv4 address, PSID and ports.
    Ipv4 {
        #[command(flatten)]
        rules: RuleFileArgs,
        /// User IPv6 prefix or address, /56 or longer.
        #[arg(long)]
        addr6: String,
    },
    /// Summarize prefixes into the smallest equivalent list.
    Summarize {
        /// Prefixes of one address family.
        #[arg(required = true)]
        prefixes: Vec<String>,
    },
    /// Check that no prefix contains another.
    Exclusive {
        /// Prefixes of one address family.
        #[arg(required = true)]
        prefixes: Vec<String>,
    },
    /// Count the addresses of prefixes.
    Size {
        /// Prefixes, possibly overlapping.
        #[arg(required = true)]
        prefixes: Vec<String>,
    },
    /// Print the OpenAPI schemas of the JSON output.
    Schema,
}
