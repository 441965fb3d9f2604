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
//! Address and port translation of a single rule.

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use mape_utils::rangeset::Range;

use crate::{
    InvalidRuleError, MapError,
    dto::{Ipv4Mapping, Ipv6Mapping, MappingInfo},
    params::{IPV6_BIT_LEN, Layout, PORT_BIT_LEN, ProviderParams},
};

/// Translates addresses and ports according to one Basic Mapping Rule.
///
/// A mapper is immutable once built and cheap to rebuild per request.
///
/// ```
/// # use mape::{Mapper, ProviderParams};
/// let mapper = Mapper::new(ProviderParams {
///     rule_net6: "2001:db8::/40".to_string(),
///     rule_net4: "192.0.2.0/24".to_string(),
///     ea_bit_len: 16,
///     psid_offset: 6,
///     br_addr6: None,
///     is_rfc: true,
/// })
/// .unwrap();
/// let mapping = mapper.ipv4_to_ipv6("192.0.2.18".parse().unwrap(), 52).unwrap();
/// assert_eq!(mapping.map_ce_ipv6_address.to_string(), "2001:db8:12:3400:0:c000:212:34");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper {
    params: ProviderParams,
    /// Rule prefixes in network form.
    rule_net6: Ipv6Net,
    rule_net4: Ipv4Net,
    layout: Layout,
}

impl Mapper {
    /// Creates a mapper from provider parameters.
    ///
    /// Fails if a rule prefix does not parse or if the derived layout does not fit into an
    /// IPv6 /64, an IPv4 address and a 16-bit port.
    pub fn new(params: ProviderParams) -> Result<Self, MapError> {
        let rule_net6 = params
            .rule_net6
            .trim()
            .parse::<Ipv6Net>()
            .map_err(|_| InvalidRuleError::RuleNet6(params.rule_net6.clone()))?
            .trunc();
        let rule_net4 = params
            .rule_net4
            .trim()
            .parse::<Ipv4Net>()
            .map_err(|_| InvalidRuleError::RuleNet4(params.rule_net4.clone()))?
            .trunc();
        let layout = Layout::derive(
            rule_net6.prefix_len(),
            rule_net4.prefix_len(),
            params.ea_bit_len,
            params.psid_offset,
            params.is_rfc,
        )?;

        tracing::debug!(
            %rule_net6,
            %rule_net4,
            psid_len = layout.psid_len,
            free_port_bit_len = layout.free_port_bit_len,
            "Created mapper"
        );

        Ok(Self {
            params,
            rule_net6,
            rule_net4,
            layout,
        })
    }

    /// The parameters the mapper was created from.
    pub fn params(&self) -> &ProviderParams {
        &self.params
    }

    /// The bit-field layout of the rule.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The IPv6 rule prefix.
    pub fn rule_net6(&self) -> Ipv6Net {
        self.rule_net6
    }

    /// The IPv4 rule prefix.
    pub fn rule_net4(&self) -> Ipv4Net {
        self.rule_net4
    }

    /// Returns the IPv4 address, PSID and ports of a user prefix.
    pub fn mapping_info(&self, pref6: Ipv6Net) -> Result<MappingInfo, MapError> {
        let pref6 = pref6.trunc();
        let Ipv4Mapping { ipv4_address, psid } = self.ipv6_to_ipv4(pref6)?;

        Ok(MappingInfo {
            pref6: pref6.to_string(),
            addr4: ipv4_address,
            psid,
            port_range: self
                .psid_to_port_range(psid)?
                .into_iter()
                .map(Into::into)
                .collect(),
            ports: self.psid_to_ports(psid)?,
        })
    }

    /// Translates an IPv4 address and PSID into the user IPv6 prefix address and the MAP CE
    /// address.
    pub fn ipv4_to_ipv6(&self, addr4: Ipv4Addr, psid: u16) -> Result<Ipv6Mapping, MapError> {
        if !self.rule_net4.contains(&addr4) {
            return Err(MapError::AddressNotInRule {
                addr: IpNet::V4(addr4.into()),
                rule: IpNet::V4(self.rule_net4),
            });
        }
        self.check_psid(psid)?;

        let layout = &self.layout;
        let addr4_bits = u128::from(addr4.to_bits());
        let suffix4_bits = addr4_bits & low_mask(layout.suffix4_len);
        let ea_bits = (suffix4_bits << layout.psid_len) | u128::from(psid);

        // pref6 ++ ea-bits ++ subnet-id (zero), followed by 64 zero bits.
        let user_prefix = self.rule_net6.network().to_bits()
            | ea_bits
                .checked_shl(u32::from(IPV6_BIT_LEN - layout.user_pref6_len))
                .unwrap_or(0);

        // head padding ++ IPv4 address ++ 16-bit PSID ++ tail padding.
        let tail = u32::from(layout.if_id_pad_tail_len);
        let if_id = (addr4_bits << (u32::from(PORT_BIT_LEN) + tail)) | (u128::from(psid) << tail);

        Ok(Ipv6Mapping {
            ipv6_address: Ipv6Addr::from_bits(user_prefix),
            map_ce_ipv6_address: Ipv6Addr::from_bits(user_prefix | if_id),
        })
    }

    /// Translates an IPv6 address or prefix into the IPv4 address and PSID embedded in it.
    pub fn ipv6_to_ipv4(&self, addr6: impl Into<Ipv6Net>) -> Result<Ipv4Mapping, MapError> {
        let addr6 = addr6.into();
        if !self.rule_net6.contains(&addr6) {
            return Err(MapError::AddressNotInRule {
                addr: IpNet::V6(addr6),
                rule: IpNet::V6(self.rule_net6),
            });
        }

        let layout = &self.layout;
        let bits = addr6.addr().to_bits();
        let suffix4_bits = bit_field(bits, layout.pref6_len, layout.suffix4_len) as u32;
        let psid = bit_field(
            bits,
            layout.pref6_len + layout.suffix4_len,
            layout.psid_len,
        ) as u16;

        Ok(Ipv4Mapping {
            ipv4_address: Ipv4Addr::from_bits(self.rule_net4.network().to_bits() | suffix4_bits),
            psid,
        })
    }

    /// Returns the port ranges assigned to a PSID, in ascending order.
    ///
    /// The port space is split into `2^psid_offset` blocks and the PSID owns one range in each
    /// of them. Block 0 holds the reserved ports and is skipped, so a rule without offset bits
    /// yields no ranges.
    pub fn psid_to_port_range(&self, psid: u16) -> Result<Vec<Range<u16>>, MapError> {
        self.check_psid(psid)?;

        let layout = &self.layout;
        let block_bits = u32::from(PORT_BIT_LEN - layout.psid_offset);
        let free_bits = u32::from(layout.free_port_bit_len);
        let ranges = (1..(1u32 << layout.psid_offset))
            .map(|i| {
                let first = (i << block_bits) | (u32::from(psid) << free_bits);
                let last = first + (1 << free_bits) - 1;
                // Both fit into 16 bits: i < 2^psid_offset and psid < 2^psid_len.
                Range::new(first as u16, last as u16)
            })
            .collect();
        Ok(ranges)
    }

    /// Returns all ports assigned to a PSID, in ascending order.
    pub fn psid_to_ports(&self, psid: u16) -> Result<Vec<u16>, MapError> {
        Ok(self
            .psid_to_port_range(psid)?
            .into_iter()
            .flat_map(|range| range.first..=range.last)
            .collect())
    }

    /// Returns true if the port is reserved and not assigned to any user.
    pub fn port_reserved(&self, port: u16) -> bool {
        u32::from(port) < self.layout.rsv_port
    }

    /// Returns the PSID the port belongs to.
    pub fn port_to_psid(&self, port: u16) -> u16 {
        let free_bits = u32::from(self.layout.free_port_bit_len);
        let psid_mask = (1u32 << self.layout.psid_len) - 1;
        // At most 16 bits remain after the shift.
        ((u32::from(port) >> free_bits) & psid_mask) as u16
    }

    fn check_psid(&self, psid: u16) -> Result<(), MapError> {
        if u128::from(psid) > low_mask(self.layout.psid_len) {
            return Err(MapError::PsidOutOfRange {
                psid,
                psid_len: self.layout.psid_len,
            });
        }
        Ok(())
    }
}

/// A value with the lowest `len` bits set, `len <= 127`.
fn low_mask(len: u8) -> u128 {
    (1u128 << len) - 1
}

/// Returns `len` bits of `value`, starting `offset` bits below the most significant bit.
fn bit_field(value: u128, offset: u8, len: u8) -> u128 {
    if len == 0 {
        return 0;
    }
    value.checked_shl(u32::from(offset)).unwrap_or(0) >> (u32::from(IPV6_BIT_LEN - len))
}
