//! Priority access evaluation.
//!
//! A client qualifies for reserved capacity if it is a designated operator,
//! holds an active VIP flag, or sits on one of the top two rungs of the
//! membership ladder. Missing membership or VIP data grants nothing.

use std::collections::HashSet;

use surge_core::{MembershipStatus, VipStatus};

#[derive(Debug, Clone, Default)]
pub struct PriorityAccess {
    operators: HashSet<String>,
}

impl PriorityAccess {
    pub fn new<I, S>(operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operators: operators.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_operator(&self, client_id: &str) -> bool {
        self.operators.contains(client_id)
    }

    pub fn has_priority(
        &self,
        client_id: &str,
        membership: Option<&MembershipStatus>,
        vip: Option<&VipStatus>,
    ) -> bool {
        self.is_operator(client_id)
            || vip.is_some_and(|v| v.is_active)
            || membership
                .and_then(MembershipStatus::ladder_tier)
                .is_some_and(|tier| tier.is_top_two())
    }
}
