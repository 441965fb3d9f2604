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
//! # Address Set Algebra
//!
//! Pure functions over IPv4 and IPv6 prefixes ([ipnet::IpNet]).
//!
//! - [prefix] holds the pairwise primitives: [contains], [supernet], [aggregate] and [join].
//! - [summary] reduces lists of prefixes: [summarize], [exclusive], [size_all], [coverage] and
//!   [coverage_size].
//!
//! Pairwise operations on prefixes of different address families fail with
//! [AddrSetError::FamilyMismatch].

use ipnet::IpNet;
use thiserror::Error;

pub mod prefix;
pub mod summary;

pub use prefix::{aggregate, contains, join, size, supernet};
pub use summary::{
    coverage, coverage_size, exclusive, exclusive_strs, size_all, summarize, summarize_strs,
};

/// Address set algebra errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddrSetError {
    /// The requested supernet is not shorter than the prefix.
    #[error("new prefix length {new_len} must be smaller than the prefix length of {prefix}")]
    InvalidPrefixLength {
        /// The prefix to supernet.
        prefix: IpNet,
        /// The requested prefix length.
        new_len: u8,
    },
    /// The operands belong to different address families.
    #[error("address family mismatch between {0} and {1}")]
    FamilyMismatch(IpNet, IpNet),
    /// A prefix string could not be parsed.
    #[error("invalid prefix {0:?}")]
    InvalidPrefix(String),
}

/// Returns an error if the two prefixes belong to different address families.
pub(crate) fn same_family(a: &IpNet, b: &IpNet) -> Result<(), AddrSetError> {
    if std::mem::discriminant(a) != std::mem::discriminant(b) {
        return Err(AddrSetError::FamilyMismatch(*a, *b));
    }
    Ok(())
}

/// Parses a prefix. A bare address is taken as a host prefix (/32 or /128).
pub fn parse_prefix(s: &str) -> Result<IpNet, AddrSetError> {
    let s = s.trim();
    if let Ok(net) = s.parse::<IpNet>() {
        return Ok(net);
    }
    s.parse::<std::net::IpAddr>()
        .map(IpNet::from)
        .map_err(|_| AddrSetError::InvalidPrefix(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefix() {
        assert_eq!(
            parse_prefix("192.168.0.0/24").unwrap(),
            "192.168.0.0/24".parse::<IpNet>().unwrap()
        );
        assert_eq!(
            parse_prefix(" 2001:db8::1 ").unwrap(),
            "2001:db8::1/128".parse::<IpNet>().unwrap()
        );
        assert_eq!(
            parse_prefix("192.168.0.0/33"),
            Err(AddrSetError::InvalidPrefix("192.168.0.0/33".to_string()))
        );
    }

    #[test]
    fn test_same_family() {
        let v4: IpNet = "10.0.0.0/8".parse().unwrap();
        let v6: IpNet = "2001:db8::/32".parse().unwrap();
        assert!(same_family(&v4, &v4).is_ok());
        assert_eq!(same_family(&v4, &v6), Err(AddrSetError::FamilyMismatch(v4, v6)));
    }
}
