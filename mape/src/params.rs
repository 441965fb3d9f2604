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
//! Provider parameters and the bit-field layout derived from them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::InvalidRuleError;

pub(crate) const IPV6_BIT_LEN: u8 = 128;
pub(crate) const IPV4_BIT_LEN: u8 = 32;
pub(crate) const PORT_BIT_LEN: u8 = 16;
/// Length of the IPv6 prefix part of a CE address; the rest is the interface identifier.
pub(crate) const IPV6_PREFIX_BIT_LEN: u8 = 64;

/// The parameters of one Basic Mapping Rule as a provider configures them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderParams {
    /// The rule IPv6 prefix, e.g. `2001:db8::/30`.
    pub rule_net6: String,
    /// The rule IPv4 prefix, e.g. `192.0.2.0/24`.
    pub rule_net4: String,
    /// Length of the Embedded Address bits.
    pub ea_bit_len: u8,
    /// Number of high-order port bits excluded from the PSID.
    pub psid_offset: u8,
    /// The Border Relay IPv6 address. Passed through untouched.
    #[serde(default)]
    pub br_addr6: Option<String>,
    /// Use the RFC 7597 interface identifier (16 bits of head padding) instead of the draft
    /// layout (8 bits of head and tail padding).
    #[serde(default)]
    pub is_rfc: bool,
}

/// The bit-field layout of a rule.
///
/// All lengths are in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Layout {
    pub ea_bit_len: u8,
    pub psid_offset: u8,
    pub pref6_len: u8,
    pub pref4_len: u8,
    pub suffix6_len: u8,
    pub suffix4_len: u8,
    /// Length of the user (CE) IPv6 prefix: rule prefix plus EA-bits.
    pub user_pref6_len: u8,
    pub subnet_id_len: u8,
    pub if_id_pad_head_len: u8,
    pub if_id_pad_tail_len: u8,
    pub psid_len: u8,
    /// Port bits below the PSID, i.e. the size of one contiguous port range.
    pub free_port_bit_len: u8,
    /// Ports below this value are reserved and never assigned to users.
    pub rsv_port: u32,
    /// Number of users sharing one IPv4 address.
    pub density4: u32,
    pub ports_per_user: u32,
    pub total_user: u64,
}

impl Layout {
    /// Derives the layout of a rule with the given prefix lengths.
    pub fn derive(
        pref6_len: u8,
        pref4_len: u8,
        ea_bit_len: u8,
        psid_offset: u8,
        is_rfc: bool,
    ) -> Result<Self, InvalidRuleError> {
        if ea_bit_len > IPV4_BIT_LEN {
            return Err(InvalidRuleError::EaBitLenTooLong(ea_bit_len));
        }
        if psid_offset > PORT_BIT_LEN {
            return Err(InvalidRuleError::PsidOffsetTooLong(psid_offset));
        }

        let suffix6_len = IPV6_BIT_LEN - pref6_len;
        let suffix4_len = IPV4_BIT_LEN - pref4_len;

        let psid_len = ea_bit_len.checked_sub(suffix4_len).ok_or(
            InvalidRuleError::EaBitLenTooShort {
                ea_bit_len,
                suffix4_len,
            },
        )?;
        let free_port_bit_len = PORT_BIT_LEN
            .checked_sub(psid_offset + psid_len)
            .ok_or(InvalidRuleError::PortBitsExceeded {
                psid_offset,
                psid_len,
            })?;

        let user_pref6_len = pref6_len + ea_bit_len;
        let subnet_id_len = IPV6_PREFIX_BIT_LEN
            .checked_sub(user_pref6_len)
            .ok_or(InvalidRuleError::UserPrefixTooLong(user_pref6_len))?;

        let (if_id_pad_head_len, if_id_pad_tail_len) = if is_rfc { (16, 0) } else { (8, 8) };

        let rsv_port = 1u32 << (PORT_BIT_LEN - psid_offset);
        let density4 = 1u32 << psid_len;
        let ports_per_user = ((1u32 << PORT_BIT_LEN) - rsv_port) / density4;
        let total_user = 1u64 << (suffix4_len + psid_len);

        Ok(Self {
            ea_bit_len,
            psid_offset,
            pref6_len,
            pref4_len,
            suffix6_len,
            suffix4_len,
            user_pref6_len,
            subnet_id_len,
            if_id_pad_head_len,
            if_id_pad_tail_len,
            psid_len,
            free_port_bit_len,
            rsv_port,
            density4,
            ports_per_user,
            total_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_layout() {
        // 2001:db8::/30, 10.0.0.0/12, sized for one half of a national provider.
        let layout = Layout::derive(30, 12, 26, 6, false).unwrap();
        assert_eq!(layout.ea_bit_len, 26);
        assert_eq!(layout.suffix6_len, 98);
        assert_eq!(layout.suffix4_len, 20);
        assert_eq!(layout.user_pref6_len, 56);
        assert_eq!(layout.subnet_id_len, 8);
        assert_eq!(layout.if_id_pad_head_len, 8);
        assert_eq!(layout.if_id_pad_tail_len, 8);
        assert_eq!(layout.psid_offset, 6);
        assert_eq!(layout.psid_len, 6);
        assert_eq!(layout.free_port_bit_len, 4);
        assert_eq!(layout.rsv_port, 1024);
        assert_eq!(layout.density4, 64);
        assert_eq!(layout.ports_per_user, 1008);
        assert_eq!(layout.total_user, 1 << 26);
    }

    #[test]
    fn test_rfc_layout() {
        // RFC 7597 Appendix A, example 1.
        let layout = Layout::derive(40, 24, 16, 6, true).unwrap();
        assert_eq!(layout.psid_len, 8);
        assert_eq!(layout.free_port_bit_len, 2);
        assert_eq!(layout.user_pref6_len, 56);
        assert_eq!(layout.if_id_pad_head_len, 16);
        assert_eq!(layout.if_id_pad_tail_len, 0);
        assert_eq!(layout.density4, 256);
        assert_eq!(layout.ports_per_user, 252);
        assert_eq!(layout.total_user, 1 << 16);
    }

    #[test]
    fn test_layout_without_offset() {
        let layout = Layout::derive(32, 24, 8, 0, true).unwrap();
        assert_eq!(layout.psid_len, 0);
        assert_eq!(layout.rsv_port, 1 << 16);
        assert_eq!(layout.ports_per_user, 0);
        assert_eq!(layout.total_user, 256);
    }

    #[test]
    fn test_invalid_layouts() {
        assert_eq!(
            Layout::derive(30, 12, 33, 6, false),
            Err(InvalidRuleError::EaBitLenTooLong(33))
        );
        assert_eq!(
            Layout::derive(30, 12, 26, 17, false),
            Err(InvalidRuleError::PsidOffsetTooLong(17))
        );
        assert_eq!(
            Layout::derive(30, 12, 19, 6, false),
            Err(InvalidRuleError::EaBitLenTooShort {
                ea_bit_len: 19,
                suffix4_len: 20
            })
        );
        assert_eq!(
            Layout::derive(30, 24, 20, 6, false),
            Err(InvalidRuleError::PortBitsExceeded {
                psid_offset: 6,
                psid_len: 12
            })
        );
        assert_eq!(
            Layout::derive(48, 24, 24, 0, false),
            Err(InvalidRuleError::UserPrefixTooLong(72))
        );
    }
}
