//! Oracle membership and quorum threshold
//!
//! The registry only guards its own invariants (no duplicates, bounded size,
//! quorum >= 1). Effects of membership changes on the active frame are applied
//! by the consensus engine in the same call.

use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of oracle members
pub const MAX_MEMBERS: usize = 256;

/// Quorum in force before the first explicit change
pub const DEFAULT_QUORUM: u32 = 1;

/// Account address of an oracle member (20 bytes)
///
/// Serialized as `0x`-prefixed hex.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, SerializeDisplay, DeserializeFromStr,
)]
pub struct MemberAddress(pub [u8; 20]);

impl MemberAddress {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for MemberAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for MemberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for MemberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberAddress({})", self)
    }
}

/// Failure to parse a [`MemberAddress`] from text
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for MemberAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressParseError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

/// Authorized reporters and the quorum threshold
///
/// `quorum` may exceed the member count after a removal; consensus then
/// simply cannot complete until the quorum is lowered or the set grows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRegistry {
    members: BTreeSet<MemberAddress>,
    quorum: u32,
}

impl Default for MembershipRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipRegistry {
    /// Empty registry with the default quorum
    pub fn new() -> Self {
        Self {
            members: BTreeSet::new(),
            quorum: DEFAULT_QUORUM,
        }
    }

    /// Rebuild a registry from persisted or configured parts
    pub fn from_parts(
        members: impl IntoIterator<Item = MemberAddress>,
        quorum: u32,
    ) -> OracleResult<Self> {
        let mut registry = Self::new();
        for member in members {
            registry.add(member)?;
        }
        registry.set_quorum(quorum)?;
        Ok(registry)
    }

    pub fn add(&mut self, member: MemberAddress) -> OracleResult<()> {
        if self.members.contains(&member) {
            return Err(OracleError::DuplicateMember { member });
        }
        if self.members.len() >= MAX_MEMBERS {
            return Err(OracleError::MemberLimitExceeded { max: MAX_MEMBERS });
        }
        self.members.insert(member);
        Ok(())
    }

    pub fn remove(&mut self, member: &MemberAddress) -> OracleResult<()> {
        if !self.members.remove(member) {
            return Err(OracleError::UnknownMember { member: *member });
        }
        Ok(())
    }

    pub fn set_quorum(&mut self, quorum: u32) -> OracleResult<()> {
        if quorum == 0 {
            return Err(OracleError::InvalidQuorum { quorum });
        }
        self.quorum = quorum;
        Ok(())
    }

    pub fn contains(&self, member: &MemberAddress) -> bool {
        self.members.contains(member)
    }

    pub fn quorum(&self) -> u32 {
        self.quorum
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in ascending address order
    pub fn members(&self) -> Vec<MemberAddress> {
        self.members.iter().copied().collect()
    }

    /// Whether enough members exist to ever reach the quorum
    pub fn is_quorum_reachable(&self) -> bool {
        self.quorum as usize <= self.members.len()
    }
}
