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
//! # MAP-E
//!
//! Address and port mapping of MAP-E (RFC 7597).
//!
//! A [mapper::Mapper] is built from the [params::ProviderParams] of one Basic Mapping Rule
//! (BMR). It derives the bit-field [params::Layout] of the rule and translates between the
//! IPv6 prefix of a customer edge (CE) and its IPv4 address plus Port Set Identifier (PSID).
//!
//! The [rules::RuleTable] selects the BMR that applies to an address, [request] validates
//! user input and [lookup] combines the three into the queries a front end serves.

use ipnet::IpNet;
use thiserror::Error;

pub mod dto;
pub mod lookup;
pub mod mapper;
pub mod params;
pub mod request;
pub mod rules;

pub use mapper::Mapper;
pub use params::{Layout, ProviderParams};

/// Mapping errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// The provider parameters do not describe a valid rule.
    #[error("invalid rule: {0}")]
    InvalidRule(#[from] InvalidRuleError),
    /// The address is outside of the rule prefix.
    #[error("the given address {addr} is not included in {rule}")]
    AddressNotInRule {
        /// The rejected address.
        addr: IpNet,
        /// The rule prefix of the same address family.
        rule: IpNet,
    },
    /// The PSID has more bits than the rule reserves for it.
    #[error("PSID {psid} does not fit in {psid_len} bits")]
    PsidOutOfRange {
        /// The rejected PSID.
        psid: u16,
        /// The PSID length of the rule.
        psid_len: u8,
    },
}

/// Reasons why provider parameters are rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRuleError {
    /// The IPv6 rule prefix is not an IPv6 CIDR.
    #[error("rule_net6 {0:?} is not an IPv6 prefix")]
    RuleNet6(String),
    /// The IPv4 rule prefix is not an IPv4 CIDR.
    #[error("rule_net4 {0:?} is not an IPv4 prefix")]
    RuleNet4(String),
    /// More EA-bits than an IPv4 address has.
    #[error("ea_bit_len {0} exceeds 32")]
    EaBitLenTooLong(u8),
    /// More offset bits than a port has.
    #[error("psid_offset {0} exceeds 16")]
    PsidOffsetTooLong(u8),
    /// The EA-bits cannot hold the IPv4 suffix, the PSID length would be negative.
    #[error("ea_bit_len {ea_bit_len} is shorter than the IPv4 suffix of {suffix4_len} bits")]
    EaBitLenTooShort {
        /// The configured EA-bit length.
        ea_bit_len: u8,
        /// The IPv4 suffix length of the rule.
        suffix4_len: u8,
    },
    /// Offset and PSID do not fit into the 16 bits of a port.
    #[error("psid_offset {psid_offset} plus psid_len {psid_len} exceeds 16")]
    PortBitsExceeded {
        /// The configured PSID offset.
        psid_offset: u8,
        /// The derived PSID length.
        psid_len: u8,
    },
    /// The user prefix leaves no room for the interface identifier.
    #[error("user prefix length /{0} exceeds /64")]
    UserPrefixTooLong(u8),
}
