//! Shared client-facing types used across Surge crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque client identifier as issued by the session tracker.
pub type ClientId = String;

/// Paid membership ladder, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl MembershipTier {
    pub const LADDER: [MembershipTier; 5] = [
        MembershipTier::Bronze,
        MembershipTier::Silver,
        MembershipTier::Gold,
        MembershipTier::Platinum,
        MembershipTier::Diamond,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MembershipTier::Bronze => "bronze",
            MembershipTier::Silver => "silver",
            MembershipTier::Gold => "gold",
            MembershipTier::Platinum => "platinum",
            MembershipTier::Diamond => "diamond",
        }
    }

    /// True for the two highest rungs of the ladder.
    pub fn is_top_two(&self) -> bool {
        let rank = Self::LADDER.iter().position(|t| t == self).unwrap_or(0);
        rank + 2 >= Self::LADDER.len()
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MembershipTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::LADDER
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown membership tier: {s}"))
    }
}

/// Membership record as supplied by the account subsystem.
///
/// The tier is kept as the raw name; names outside the ladder simply grant
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipStatus {
    pub tier: Option<String>,
}

impl MembershipStatus {
    pub fn new(tier: impl Into<String>) -> Self {
        Self {
            tier: Some(tier.into()),
        }
    }

    pub fn ladder_tier(&self) -> Option<MembershipTier> {
        self.tier.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VipStatus {
    pub is_active: bool,
}
