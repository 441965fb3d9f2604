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
//! Pairwise prefix operations.

use ipnet::IpNet;
use num_bigint::BigUint;

use crate::{AddrSetError, same_family};

/// Returns true if every address of `b` lies within `a`.
pub fn contains(a: &IpNet, b: &IpNet) -> Result<bool, AddrSetError> {
    same_family(a, b)?;
    Ok(a.network() <= b.network() && b.broadcast() <= a.broadcast())
}

/// Returns the number of addresses in the prefix. `::/0` holds 2^128 addresses.
pub fn size(prefix: &IpNet) -> BigUint {
    let host_bits = u32::from(prefix.max_prefix_len() - prefix.prefix_len());
    BigUint::from(1u8) << host_bits
}

/// Returns the network of length `new_len` that covers the address of `prefix`.
///
/// ```
/// # use ipnet::IpNet;
/// let net: IpNet = "172.16.10.0/24".parse().unwrap();
/// assert_eq!(address_set::supernet(&net, 23).unwrap().to_string(), "172.16.10.0/23");
/// assert_eq!(address_set::supernet(&net, 22).unwrap().to_string(), "172.16.8.0/22");
/// ```
pub fn supernet(prefix: &IpNet, new_len: u8) -> Result<IpNet, AddrSetError> {
    let invalid = || {
        AddrSetError::InvalidPrefixLength {
            prefix: *prefix,
            new_len,
        }
    };
    if new_len >= prefix.prefix_len() {
        return Err(invalid());
    }
    IpNet::new(prefix.addr(), new_len)
        .map(|net| net.trunc())
        .map_err(|_| invalid())
}

/// Aggregates two prefixes.
///
/// Returns `[a]` if `a` contains `b`, the common supernet if `a` and `b` are its two halves,
/// and `[a, b]` otherwise. The result depends on the operand order, see [join] for the
/// order-independent variant.
pub fn aggregate(a: IpNet, b: IpNet) -> Result<Vec<IpNet>, AddrSetError> {
    if contains(&a, &b)? {
        return Ok(vec![a]);
    }
    // A /0 contains every prefix of its family, so `a` has at least one prefix bit here.
    let parent = supernet(&a, a.prefix_len() - 1)?;

    // size(a) + size(b) == size(parent), where size(parent) == 2 * size(a).
    let fills_parent = b.prefix_len() == a.prefix_len();
    if contains(&parent, &a)? && contains(&parent, &b)? && fills_parent {
        Ok(vec![parent])
    } else {
        Ok(vec![a, b])
    }
}

/// Aggregates the networks of two prefixes in ascending order.
///
/// ```
/// # use ipnet::IpNet;
/// let a: IpNet = "172.16.10.1/24".parse().unwrap();
/// let b: IpNet = "172.16.11.2/24".parse().unwrap();
/// let joined = address_set::join(a, b).unwrap();
/// assert_eq!(joined, vec!["172.16.10.0/23".parse::<IpNet>().unwrap()]);
/// ```
pub fn join(a: IpNet, b: IpNet) -> Result<Vec<IpNet>, AddrSetError> {
    let (a, b) = (a.trunc(), b.trunc());
    if a <= b {
        aggregate(a, b)
    } else {
        aggregate(b, a)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    #[test]
    fn test_contains() {
        assert!(contains(&net("10.0.0.0/24"), &net("10.0.0.0/25")).unwrap());
        assert!(contains(&net("10.0.0.0/24"), &net("10.0.0.128/25")).unwrap());
        assert!(contains(&net("10.0.0.0/24"), &net("10.0.0.0/24")).unwrap());
        assert!(!contains(&net("10.0.0.0/25"), &net("10.0.0.0/24")).unwrap());
        assert!(!contains(&net("10.0.0.0/24"), &net("10.0.1.0/24")).unwrap());
        assert!(contains(&net("2001:db8::/32"), &net("2001:db8:1::/48")).unwrap());
        assert_matches!(
            contains(&net("10.0.0.0/8"), &net("2001:db8::/32")),
            Err(AddrSetError::FamilyMismatch(_, _))
        );
    }

    #[test]
    fn test_size() {
        assert_eq!(size(&net("192.168.0.0/24")), BigUint::from(256u32));
        assert_eq!(size(&net("10.0.0.1/32")), BigUint::from(1u32));
        assert_eq!(size(&net("0.0.0.0/0")), BigUint::from(1u64 << 32));
        assert_eq!(size(&net("2001:db8::/48")), BigUint::from(1u128 << 80));
        assert_eq!(size(&net("::/1")), BigUint::from(1u128 << 127));
        assert_eq!(size(&net("::/0")), BigUint::from(u128::MAX) + 1u32);
    }

    #[test]
    fn test_supernet() {
        assert_eq!(
            supernet(&net("192.168.10.100/24"), 22).unwrap(),
            net("192.168.8.0/22")
        );
        assert_eq!(supernet(&net("192.168.10.0/24"), 0).unwrap(), net("0.0.0.0/0"));
        assert_eq!(supernet(&net("2001:db8:1::/48"), 47).unwrap(), net("2001:db8::/47"));
        assert_eq!(supernet(&net("2001:db8:1::/48"), 0).unwrap(), net("::/0"));
        assert_eq!(
            supernet(&net("2001:db8::/48"), 48),
            Err(AddrSetError::InvalidPrefixLength {
                prefix: net("2001:db8::/48"),
                new_len: 48
            })
        );
        assert_matches!(
            supernet(&net("10.0.0.0/8"), 9),
            Err(AddrSetError::InvalidPrefixLength { new_len: 9, .. })
        );
    }

    #[test]
    fn test_aggregate_ipv4() {
        let ipv4_0 = net("192.168.0.0/24");
        let ipv4_1 = net("192.168.1.0/24");
        let ipv4_2 = net("192.168.0.0/23");
        let ipv4_3 = net("192.168.2.0/23");

        assert_eq!(aggregate(ipv4_0, ipv4_1).unwrap(), vec![ipv4_2]);
        assert_eq!(aggregate(ipv4_2, ipv4_0).unwrap(), vec![ipv4_2]);
        assert_eq!(aggregate(ipv4_0, ipv4_3).unwrap(), vec![ipv4_0, ipv4_3]);
        // Same parent but not two halves of it.
        assert_eq!(
            aggregate(net("10.0.0.0/24"), net("10.0.1.0/25")).unwrap(),
            vec![net("10.0.0.0/24"), net("10.0.1.0/25")]
        );
        // Adjacent but in different parents.
        assert_eq!(
            aggregate(net("10.0.1.0/24"), net("10.0.2.0/24")).unwrap(),
            vec![net("10.0.1.0/24"), net("10.0.2.0/24")]
        );
    }

    #[test]
    fn test_aggregate_halves_of_full_space() {
        assert_eq!(
            aggregate(net("::/1"), net("8000::/1")).unwrap(),
            vec![net("::/0")]
        );
        assert_eq!(
            aggregate(net("0.0.0.0/0"), net("10.0.0.0/8")).unwrap(),
            vec![net("0.0.0.0/0")]
        );
    }

    #[test]
    fn test_aggregate_family_mismatch() {
        assert_matches!(
            aggregate(net("10.0.0.0/24"), net("2001:db8::/48")),
            Err(AddrSetError::FamilyMismatch(_, _))
        );
    }

    #[test]
    fn test_join() {
        let ipv4_0 = net("192.168.0.0/24");
        let ipv4_1 = net("192.168.1.0/24");
        let ipv4_2 = net("192.168.0.0/23");
        let ipv4_3 = net("192.168.2.0/23");

        assert_eq!(join(ipv4_1, ipv4_0).unwrap(), vec![ipv4_2]);
        assert_eq!(join(ipv4_0, ipv4_2).unwrap(), vec![ipv4_2]);
        assert_eq!(join(ipv4_3, ipv4_0).unwrap(), vec![ipv4_0, ipv4_3]);
        assert_eq!(
            join(net("10.0.0.1/24"), net("10.0.2.1/24")).unwrap(),
            vec![net("10.0.0.0/24"), net("10.0.2.0/24")]
        );

        let ipv6_0 = net("2001:db8:0::/48");
        let ipv6_1 = net("2001:db8:1::/48");
        let ipv6_2 = net("2001:db8:0::/47");
        let ipv6_3 = net("2001:db8:2::/47");

        assert_eq!(join(ipv6_0, ipv6_1).unwrap(), vec![ipv6_2]);
        assert_eq!(join(ipv6_0, ipv6_2).unwrap(), vec![ipv6_2]);
        assert_eq!(join(ipv6_3, ipv6_0).unwrap(), vec![ipv6_0, ipv6_3]);
    }
}
