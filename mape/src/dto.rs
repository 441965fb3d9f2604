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
//! This module provides the public facing DTOs (Data Transfer Object) of the mapping
//! operations.
//!
//! DTO types are the structured results handed to front ends. They must be serializable such
//! that they can be used in APIs, and implement [`ToSchema`] to generate OpenAPI schema
//! definitions. Addresses serialize in their canonical text form.

use std::net::{Ipv4Addr, Ipv6Addr};

use mape_utils::rangeset::Range;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::{Layout, ProviderParams, rules::BasicMapRule};

/// Result of translating an IPv4 address and PSID to IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ipv6Mapping {
    /// The first address of the user IPv6 prefix.
    #[schema(value_type = String, example = "2001:db8:12:3400::")]
    pub ipv6_address: Ipv6Addr,
    /// The MAP CE address, i.e. the user prefix with the MAP interface identifier.
    #[schema(value_type = String, example = "2001:db8:12:3400:0:c000:212:34")]
    pub map_ce_ipv6_address: Ipv6Addr,
}

/// Result of translating an IPv6 address or prefix to IPv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ipv4Mapping {
    /// The shared IPv4 address.
    #[schema(value_type = String, example = "192.0.2.18")]
    pub ipv4_address: Ipv4Addr,
    /// The Port Set Identifier.
    pub psid: u16,
}

/// An inclusive range of ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PortRangeDto {
    /// The first port of the range.
    pub first: u16,
    /// The last port of the range.
    pub last: u16,
}

impl From<Range<u16>> for PortRangeDto {
    fn from(range: Range<u16>) -> Self {
        Self {
            first: range.first,
            last: range.last,
        }
    }
}

impl From<PortRangeDto> for Range<u16> {
    fn from(dto: PortRangeDto) -> Self {
        Range::new(dto.first, dto.last)
    }
}

/// Everything a CE needs to know about its share of the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MappingInfo {
    /// The user IPv6 prefix in network form.
    #[schema(example = "2001:db8:12:3400::/56")]
    pub pref6: String,
    /// The shared IPv4 address.
    #[schema(value_type = String)]
    pub addr4: Ipv4Addr,
    /// The Port Set Identifier.
    pub psid: u16,
    /// The port ranges of the PSID.
    pub port_range: Vec<PortRangeDto>,
    /// All ports of the PSID.
    pub ports: Vec<u16>,
}

/// IPv4 translation result together with the usable ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ipv4Lookup {
    #[serde(flatten)]
    pub mapping: Ipv4Mapping,
    /// All ports of the PSID.
    pub ports: Vec<u16>,
}

/// The rule that matched a user prefix and the mapping of the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BmrLookup {
    pub basic_map_rule: BasicMapRule,
    pub mapping_info: MappingInfo,
}

/// Provider parameters and the layout derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderLayout {
    pub input: ProviderParams,
    pub output: Layout,
}

/// The rule table file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RuleTableDto {
    /// The Basic Mapping Rules.
    pub basic_map_rules: Vec<BasicMapRule>,
}

/// OpenAPI component definitions of the DTOs.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MAP-E Mapping",
        description = "Results of MAP-E address and port mapping",
    ),
    components(schemas(
        BasicMapRule,
        BmrLookup,
        Ipv4Lookup,
        Ipv4Mapping,
        Ipv6Mapping,
        Layout,
        MappingInfo,
        PortRangeDto,
        ProviderLayout,
        ProviderParams,
        RuleTableDto
    ))
)]
pub struct MappingSchemas;
