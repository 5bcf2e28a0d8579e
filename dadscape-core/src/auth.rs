//! Rank-based edit gating.
//!
//! Ranks come from the clan's membership directory. The catalog does not
//! check them itself: hosts consult [`AuthorizationGate`] before calling a
//! mutating catalog operation.

use std::collections::HashMap;

pub mod rank {
    pub const GUEST: i32 = -1;
    pub const FRIEND: i32 = 0;
    pub const RECRUIT: i32 = 10;
    pub const CORPORAL: i32 = 20;
    pub const SERGEANT: i32 = 30;
    pub const LIEUTENANT: i32 = 40;
    pub const CAPTAIN: i32 = 50;
    pub const GENERAL: i32 = 60;
    pub const ADMIN: i32 = 100;
    pub const DEPUTY_OWNER: i32 = 125;
    pub const OWNER: i32 = 127;

    /// Display title for a rank value. Values between named ranks take the
    /// title of the highest named rank they reach.
    pub fn title(value: i32) -> &'static str {
        match value {
            v if v >= OWNER => "Owner",
            v if v >= DEPUTY_OWNER => "Deputy Owner",
            v if v >= ADMIN => "Administrator",
            v if v >= GENERAL => "General",
            v if v >= CAPTAIN => "Captain",
            v if v >= LIEUTENANT => "Lieutenant",
            v if v >= SERGEANT => "Sergeant",
            v if v >= CORPORAL => "Corporal",
            v if v >= RECRUIT => "Recruit",
            v if v >= FRIEND => "Friend",
            _ => "Guest",
        }
    }
}

pub fn can_edit(current_rank: i32, min_edit_rank: i32) -> bool {
    current_rank >= min_edit_rank
}

pub fn is_top_rank(current_rank: i32) -> bool {
    current_rank == rank::OWNER
}

/// Source of member ranks.
pub trait MembershipDirectory {
    /// The member's rank, or `None` when there is no membership data for them.
    fn rank_of(&self, rsn: &str) -> Option<i32>;
}

/// Case-insensitive lookup, since display names are not case-sensitive.
impl MembershipDirectory for HashMap<String, i32> {
    fn rank_of(&self, rsn: &str) -> Option<i32> {
        self.get(rsn).copied().or_else(|| {
            self.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(rsn))
                .map(|(_, rank)| *rank)
        })
    }
}

/// Holds the configurable minimum rank for editing diaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationGate {
    min_edit_rank: i32,
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new(rank::FRIEND)
    }
}

impl AuthorizationGate {
    pub fn new(min_edit_rank: i32) -> Self {
        Self { min_edit_rank }
    }

    pub fn min_edit_rank(&self) -> i32 {
        self.min_edit_rank
    }

    /// Takes effect from the next check onward.
    pub fn set_min_edit_rank(&mut self, min_edit_rank: i32) {
        self.min_edit_rank = min_edit_rank;
    }

    /// Unknown rank means no edit capability.
    pub fn allows(&self, current_rank: Option<i32>) -> bool {
        current_rank.is_some_and(|r| can_edit(r, self.min_edit_rank))
    }

    pub fn can_member_edit(&self, directory: &dyn MembershipDirectory, rsn: &str) -> bool {
        self.allows(directory.rank_of(rsn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_edit_boundary() {
        assert!(can_edit(50, 50));
        assert!(!can_edit(49, 50));
        assert!(can_edit(rank::OWNER, rank::ADMIN));
    }

    #[test]
    fn test_is_top_rank() {
        assert!(is_top_rank(rank::OWNER));
        assert!(!is_top_rank(rank::DEPUTY_OWNER));
        assert!(!is_top_rank(rank::ADMIN));
    }

    #[test]
    fn test_rank_titles() {
        assert_eq!(rank::title(rank::CAPTAIN), "Captain");
        assert_eq!(rank::title(55), "Captain");
        assert_eq!(rank::title(rank::GUEST), "Guest");
        assert_eq!(rank::title(rank::OWNER), "Owner");
    }

    #[test]
    fn test_gate_without_membership_denies() {
        let members: HashMap<String, i32> = HashMap::from([("Bob".to_string(), rank::CAPTAIN)]);
        let gate = AuthorizationGate::new(rank::CAPTAIN);

        assert!(gate.can_member_edit(&members, "Bob"));
        assert!(gate.can_member_edit(&members, "bob"));
        assert!(!gate.can_member_edit(&members, "Alice"));
        assert!(!gate.allows(None));
    }

    #[test]
    fn test_gate_threshold_changes_apply_to_next_check() {
        let mut gate = AuthorizationGate::default();
        assert!(gate.allows(Some(rank::RECRUIT)));

        gate.set_min_edit_rank(rank::GENERAL);
        assert!(!gate.allows(Some(rank::RECRUIT)));
        assert!(gate.allows(Some(rank::ADMIN)));
    }
}
