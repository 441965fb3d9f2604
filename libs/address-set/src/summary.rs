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
//! Operations over lists of prefixes.

use std::net::IpAddr;

use ipnet::IpNet;
use mape_utils::rangeset::{Range, RangeSet};
use num_bigint::BigUint;

use crate::{
    AddrSetError, parse_prefix,
    prefix::{aggregate, contains, size},
    same_family,
};

/// Summarizes the prefixes into the smallest list of networks that covers exactly the same
/// addresses.
///
/// Summarization only merges networks that fill a supernet without holes, so the result never
/// covers an address that was not covered by the input. Overlapping and duplicate prefixes are
/// collapsed. The result is sorted.
///
/// ```
/// # use ipnet::IpNet;
/// let prefixes: Vec<IpNet> = ["10.0.0.0/9", "192.168.0.0/16", "10.128.0.0/9"]
///     .iter()
///     .map(|s| s.parse().unwrap())
///     .collect();
/// let summary = address_set::summarize(&prefixes).unwrap();
/// assert_eq!(summary, vec![
///     "10.0.0.0/8".parse::<IpNet>().unwrap(),
///     "192.168.0.0/16".parse().unwrap(),
/// ]);
/// ```
pub fn summarize(prefixes: &[IpNet]) -> Result<Vec<IpNet>, AddrSetError> {
    let Some(first) = prefixes.first() else {
        return Ok(Vec::new());
    };
    for prefix in prefixes {
        same_family(first, prefix)?;
    }

    let mut current: Vec<IpNet> = prefixes.iter().map(IpNet::trunc).collect();
    if current.len() == 1 {
        return Ok(current);
    }

    // Each pass either shrinks the list or leaves it unchanged.
    loop {
        current.sort();
        let next = merge_adjacent(&current)?;
        tracing::debug!(
            before = current.len(),
            after = next.len(),
            "Summarization pass"
        );
        if next.len() == current.len() {
            return Ok(next);
        }
        current = next;
    }
}

/// A single left-to-right pass over sorted networks. A merged network is not compared with
/// its new right neighbor until the next pass.
fn merge_adjacent(sorted: &[IpNet]) -> Result<Vec<IpNet>, AddrSetError> {
    let mut merged = Vec::with_capacity(sorted.len());
    let mut i = 0;
    while i < sorted.len() {
        if let Some(next) = sorted.get(i + 1)
            && let [single] = aggregate(sorted[i], *next)?.as_slice()
        {
            merged.push(*single);
            i += 2;
            continue;
        }
        merged.push(sorted[i]);
        i += 1;
    }
    Ok(merged)
}

/// Returns true if no prefix contains another prefix of the list.
///
/// Prefixes of different address families never contain each other. A prefix listed twice
/// contains its duplicate.
pub fn exclusive(prefixes: &[IpNet]) -> bool {
    for (i, a) in prefixes.iter().enumerate() {
        for (j, b) in prefixes.iter().enumerate() {
            if i == j {
                continue;
            }
            if contains(a, b).unwrap_or(false) {
                tracing::debug!(outer = %a, inner = %b, "Prefix contains another prefix");
                return false;
            }
        }
    }
    true
}

/// Returns the total number of addresses of all prefixes. Overlapping prefixes are counted
/// multiple times.
///
/// ```
/// # use ipnet::IpNet;
/// let halves: Vec<IpNet> = vec!["::/1".parse().unwrap(), "8000::/1".parse().unwrap()];
/// assert_eq!(address_set::size_all(&halves), num_bigint::BigUint::from(1u8) << 128u32);
/// ```
pub fn size_all(prefixes: &[IpNet]) -> BigUint {
    prefixes.iter().map(size).sum()
}

/// Returns the addresses covered by the prefixes as a set of disjoint ranges.
///
/// IPv4 addresses are mapped into `::ffff:0:0/96`.
pub fn coverage(prefixes: &[IpNet]) -> RangeSet<u128> {
    RangeSet::union(
        prefixes
            .iter()
            .map(|prefix| Range::new(to_bits(prefix.network()), to_bits(prefix.broadcast()))),
    )
}

/// Returns the number of distinct addresses covered by the prefixes.
pub fn coverage_size(prefixes: &[IpNet]) -> BigUint {
    // Disjoint ranges overflow u128 only when they cover the whole space.
    coverage(prefixes)
        .len()
        .map_or_else(|| BigUint::from(1u8) << 128u32, BigUint::from)
}

fn to_bits(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(addr) => addr.to_ipv6_mapped().to_bits(),
        IpAddr::V6(addr) => addr.to_bits(),
    }
}

/// Parses the prefix strings and summarizes them, see [summarize].
///
/// ```
/// let summary = address_set::summarize_strs(&["2001:db8:1::/48", "2001:db8::/48"]).unwrap();
/// assert_eq!(summary, vec!["2001:db8::/47".to_string()]);
/// ```
pub fn summarize_strs<S: AsRef<str>>(prefixes: &[S]) -> Result<Vec<String>, AddrSetError> {
    let prefixes = parse_all(prefixes)?;
    Ok(summarize(&prefixes)?
        .iter()
        .map(ToString::to_string)
        .collect())
}

/// Parses the prefix strings and checks them for exclusivity, see [exclusive].
pub fn exclusive_strs<S: AsRef<str>>(prefixes: &[S]) -> Result<bool, AddrSetError> {
    Ok(exclusive(&parse_all(prefixes)?))
}

fn parse_all<S: AsRef<str>>(prefixes: &[S]) -> Result<Vec<IpNet>, AddrSetError> {
    prefixes.iter().map(|s| parse_prefix(s.as_ref())).collect()
}
