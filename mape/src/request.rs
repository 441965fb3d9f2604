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
//! Validation of user supplied addresses and ports.

use std::net::Ipv4Addr;

use address_set::parse_prefix;
use ipnet::{IpNet, Ipv6Net};
use thiserror::Error;

use crate::Mapper;

/// The shortest user prefix a CE can be assigned.
pub const MIN_USER_PREFIX_LEN: u8 = 56;

/// Request validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The input is neither an address nor a CIDR prefix.
    #[error("input {0:?} is not an IP address or prefix")]
    InvalidAddress(String),
    /// An IPv6 address was expected.
    #[error("input {0} isn't IPv6")]
    NotIpv6(IpNet),
    /// An IPv4 address was expected.
    #[error("input {0} doesn't look like IPv4")]
    NotIpv4(IpNet),
    /// The user prefix is shorter than /56.
    #[error("input prefix length must be /{MIN_USER_PREFIX_LEN} or longer, but got /{0}")]
    PrefixTooShort(u8),
    /// The port is not a number in `0..=65535`.
    #[error("input {0:?} is not within valid TCP/UDP port range")]
    PortOutOfRange(String),
    /// The port is below the reserved port boundary of the rule.
    #[error("input port {0} is reserved, not assigned to users")]
    PortReserved(u16),
}

/// Parses a user IPv6 address or prefix. Prefixes shorter than [MIN_USER_PREFIX_LEN] are
/// rejected, a bare address is a /128.
pub fn parse_user_prefix(s: &str) -> Result<Ipv6Net, RequestError> {
    match parse_prefix(s).map_err(|_| RequestError::InvalidAddress(s.to_string()))? {
        IpNet::V6(net) if net.prefix_len() < MIN_USER_PREFIX_LEN => {
            Err(RequestError::PrefixTooShort(net.prefix_len()))
        }
        IpNet::V6(net) => Ok(net),
        net @ IpNet::V4(_) => Err(RequestError::NotIpv6(net)),
    }
}

/// Parses an IPv4 address. A prefix is accepted and reduced to its address.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, RequestError> {
    match parse_prefix(s).map_err(|_| RequestError::InvalidAddress(s.to_string()))? {
        IpNet::V4(net) => Ok(net.addr()),
        net @ IpNet::V6(_) => Err(RequestError::NotIpv4(net)),
    }
}

/// Parses a TCP/UDP port.
pub fn parse_port(s: &str) -> Result<u16, RequestError> {
    s.trim()
        .parse()
        .map_err(|_| RequestError::PortOutOfRange(s.to_string()))
}

/// Rejects ports that the rule reserves.
pub fn check_port_assignable(mapper: &Mapper, port: u16) -> Result<u16, RequestError> {
    if mapper.port_reserved(port) {
        return Err(RequestError::PortReserved(port));
    }
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderParams;

    #[test]
    fn test_parse_user_prefix() {
        assert_eq!(
            parse_user_prefix("2001:db8:0:3d00::/56").unwrap(),
            "2001:db8:0:3d00::/56".parse::<Ipv6Net>().unwrap()
        );
        assert_eq!(
            parse_user_prefix("2001:db8:0:3d00:a:f000:0:3d00").unwrap(),
            "2001:db8:0:3d00:a:f000:0:3d00/128".parse::<Ipv6Net>().unwrap()
        );
        assert_eq!(
            parse_user_prefix("2001:db8::/48"),
            Err(RequestError::PrefixTooShort(48))
        );
        assert_eq!(
            parse_user_prefix("10.0.0.1"),
            Err(RequestError::NotIpv6("10.0.0.1/32".parse().unwrap()))
        );
        assert_eq!(
            parse_user_prefix("hello"),
            Err(RequestError::InvalidAddress("hello".to_string()))
        );
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("10.240.0.0").unwrap(), Ipv4Addr::new(10, 240, 0, 0));
        assert_eq!(parse_ipv4("10.240.0.7/24").unwrap(), Ipv4Addr::new(10, 240, 0, 7));
        assert_eq!(
            parse_ipv4("::1"),
            Err(RequestError::NotIpv4("::1/128".parse().unwrap()))
        );
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("2000"), Ok(2000));
        assert_eq!(parse_port("65535"), Ok(65535));
        assert_eq!(
            parse_port("65536"),
            Err(RequestError::PortOutOfRange("65536".to_string()))
        );
        assert_eq!(
            parse_port("-1"),
            Err(RequestError::PortOutOfRange("-1".to_string()))
        );
    }

    #[test]
    fn test_check_port_assignable() {
        let mapper = Mapper::new(ProviderParams {
            rule_net6: "2001:db8::/30".to_string(),
            rule_net4: "10.0.0.0/12".to_string(),
            ea_bit_len: 26,
            psid_offset: 6,
            br_addr6: None,
            is_rfc: false,
        })
        .unwrap();
        assert_eq!(
            check_port_assignable(&mapper, 80),
            Err(RequestError::PortReserved(80))
        );
        assert_eq!(check_port_assignable(&mapper, 8888), Ok(8888));
    }
}
