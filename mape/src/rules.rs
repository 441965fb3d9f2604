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
//! Basic Mapping Rule table.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use anyhow::Context;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{MapError, Mapper, ProviderParams, dto::RuleTableDto};

/// A Basic Mapping Rule as stored in a rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BasicMapRule {
    /// The rule IPv6 prefix.
    #[schema(value_type = String, example = "2001:db8::")]
    pub ipv6_prefix: Ipv6Addr,
    pub ipv6_prefix_length: u8,
    /// The rule IPv4 prefix.
    #[schema(value_type = String, example = "10.0.0.0")]
    pub ipv4_prefix: Ipv4Addr,
    pub ipv4_prefix_length: u8,
    pub ea_bit_length: u8,
    pub psid_offset_rule: u8,
    /// The Border Relay address.
    #[serde(default)]
    pub br_ipv6_address: Option<String>,
    /// Whether the rule uses the RFC 7597 interface identifier.
    #[serde(default)]
    pub is_rfc: bool,
}

impl BasicMapRule {
    /// The provider parameters of the rule.
    pub fn provider_params(&self) -> ProviderParams {
        ProviderParams {
            rule_net6: format!("{}/{}", self.ipv6_prefix, self.ipv6_prefix_length),
            rule_net4: format!("{}/{}", self.ipv4_prefix, self.ipv4_prefix_length),
            ea_bit_len: self.ea_bit_length,
            psid_offset: self.psid_offset_rule,
            br_addr6: self.br_ipv6_address.clone(),
            is_rfc: self.is_rfc,
        }
    }

    /// Builds the mapper of the rule.
    pub fn mapper(&self) -> Result<Mapper, MapError> {
        Mapper::new(self.provider_params())
    }
}

/// Rule table errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleTableError {
    /// A rule prefix length exceeds the address length.
    #[error("rule {index} has an invalid prefix length: {message}")]
    InvalidRule {
        /// The position of the rule in the table.
        index: usize,
        /// What is wrong with the rule.
        message: String,
    },
    /// None or more than one rule contains the address.
    #[error("{addr} must match exactly one rule, but matched {matched}")]
    NoUniqueMatch {
        /// The address or prefix that was looked up.
        addr: IpNet,
        /// The number of rules that contain the address.
        matched: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleEntry {
    rule: BasicMapRule,
    net6: Ipv6Net,
    net4: Ipv4Net,
}

/// An in-memory table of Basic Mapping Rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    entries: Vec<RuleEntry>,
}

impl RuleTable {
    /// Creates a rule table. Rule prefixes are normalized to their network.
    pub fn new(rules: Vec<BasicMapRule>) -> Result<Self, RuleTableError> {
        let entries = rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                let invalid = |err: ipnet::PrefixLenError| {
                    RuleTableError::InvalidRule {
                        index,
                        message: err.to_string(),
                    }
                };
                let net6 = Ipv6Net::new(rule.ipv6_prefix, rule.ipv6_prefix_length)
                    .map_err(invalid)?
                    .trunc();
                let net4 = Ipv4Net::new(rule.ipv4_prefix, rule.ipv4_prefix_length)
                    .map_err(invalid)?
                    .trunc();
                Ok(RuleEntry { rule, net6, net4 })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    /// Parses a rule table from its JSON representation.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let dto: RuleTableDto = serde_json::from_str(json).context("invalid rule file")?;
        dto.try_into()
    }

    /// Returns the rules in table order.
    pub fn rules(&self) -> impl Iterator<Item = &BasicMapRule> {
        self.entries.iter().map(|entry| &entry.rule)
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the single rule whose IPv6 prefix contains the given prefix.
    pub fn find_by_ipv6(&self, prefix: &Ipv6Net) -> Result<&BasicMapRule, RuleTableError> {
        self.find_unique(IpNet::V6(*prefix), |entry| entry.net6.contains(prefix))
    }

    /// Returns the single rule whose IPv4 prefix contains the given address.
    pub fn find_by_ipv4(&self, addr: Ipv4Addr) -> Result<&BasicMapRule, RuleTableError> {
        self.find_unique(IpNet::from(IpAddr::V4(addr)), |entry| {
            entry.net4.contains(&addr)
        })
    }

    fn find_unique<F>(&self, addr: IpNet, matches: F) -> Result<&BasicMapRule, RuleTableError>
    where
        F: Fn(&RuleEntry) -> bool,
    {
        let matched: Vec<&RuleEntry> = self.entries.iter().filter(|e| matches(e)).collect();
        match matched[..] {
            [entry] => Ok(&entry.rule),
            _ => {
                tracing::warn!(%addr, matched = matched.len(), "No unique rule match");
                Err(RuleTableError::NoUniqueMatch {
                    addr,
                    matched: matched.len(),
                })
            }
        }
    }
}

impl TryFrom<RuleTableDto> for RuleTable {
    type Error = anyhow::Error;

    fn try_from(value: RuleTableDto) -> Result<Self, Self::Error> {
        RuleTable::new(value.basic_map_rules).context("invalid rule table")
    }
}

impl From<&RuleTable> for RuleTableDto {
    fn from(table: &RuleTable) -> Self {
        RuleTableDto {
            basic_map_rules: table.rules().cloned().collect(),
        }
    }
}
