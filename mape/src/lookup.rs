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
//! Queries combining the rule table, request validation and the mapper.
//!
//! Each function takes raw user input, selects the matching rule and returns a DTO.

use thiserror::Error;

use crate::{
    MapError, Mapper, ProviderParams,
    dto::{BmrLookup, Ipv4Lookup, Ipv6Mapping, ProviderLayout},
    request::{self, RequestError},
    rules::{RuleTable, RuleTableError},
};

/// Lookup errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The user input is malformed.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// No unique rule applies to the address.
    #[error(transparent)]
    Rule(#[from] RuleTableError),
    /// The rule is invalid or cannot map the address.
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Returns the layout derived from provider parameters.
pub fn provider(params: ProviderParams) -> Result<ProviderLayout, LookupError> {
    let mapper = Mapper::new(params)?;
    Ok(ProviderLayout {
        output: *mapper.layout(),
        input: mapper.params().clone(),
    })
}

/// Returns the rule matching a user prefix together with the mapping of the prefix.
pub fn bmr(table: &RuleTable, addr6: &str) -> Result<BmrLookup, LookupError> {
    let pref6 = request::parse_user_prefix(addr6)?;
    let rule = table.find_by_ipv6(&pref6)?;
    let mapping_info = rule.mapper()?.mapping_info(pref6)?;
    Ok(BmrLookup {
        basic_map_rule: rule.clone(),
        mapping_info,
    })
}

/// Returns the user prefix and CE address that own the IPv4 address and port.
pub fn ipv6_for(table: &RuleTable, addr4: &str, port: &str) -> Result<Ipv6Mapping, LookupError> {
    let addr4 = request::parse_ipv4(addr4)?;
    let port = request::parse_port(port)?;
    let mapper = table.find_by_ipv4(addr4)?.mapper()?;
    let port = request::check_port_assignable(&mapper, port)?;
    let psid = mapper.port_to_psid(port);
    tracing::debug!(%addr4, port, psid, "Mapping IPv4 to IPv6");
    Ok(mapper.ipv4_to_ipv6(addr4, psid)?)
}

/// Returns the IPv4 address, PSID and ports of a user address or prefix.
pub fn ipv4_for(table: &RuleTable, addr6: &str) -> Result<Ipv4Lookup, LookupError> {
    let pref6 = request::parse_user_prefix(addr6)?;
    let mapper = table.find_by_ipv6(&pref6)?.mapper()?;
    let mapping = mapper.ipv6_to_ipv4(pref6)?;
    Ok(Ipv4Lookup {
        ports: mapper.psid_to_ports(mapping.psid)?,
        mapping,
    })
}
