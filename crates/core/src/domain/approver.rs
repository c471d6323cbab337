use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::normalize_key;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverProfile {
    pub user_id: String,
    pub authority_level: u8,
    pub department: String,
    pub groups: Vec<String>,
}

/// Resolves approver authority levels and group memberships from the
/// organizational directory. The directory is owned by the calling system;
/// lookup failures surface as `None` and degrade to escalation downstream.
pub trait ApproverDirectory {
    fn level_of(&self, user_id: &str) -> Option<u8>;
    fn members_of(&self, group: &str) -> Vec<String>;
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryApproverDirectory {
    profiles_by_user: HashMap<String, ApproverProfile>,
}

impl InMemoryApproverDirectory {
    pub fn new(profiles: Vec<ApproverProfile>) -> Self {
        let profiles_by_user = profiles
            .into_iter()
            .map(|profile| (normalize_key(&profile.user_id), profile))
            .collect();
        Self { profiles_by_user }
    }
}

impl ApproverDirectory for InMemoryApproverDirectory {
    fn level_of(&self, user_id: &str) -> Option<u8> {
        self.profiles_by_user.get(&normalize_key(user_id)).map(|profile| profile.authority_level)
    }

    fn members_of(&self, group: &str) -> Vec<String> {
        let group_key = normalize_key(group);
        let mut members: Vec<String> = self
            .profiles_by_user
            .values()
            .filter(|profile| profile.groups.iter().any(|name| normalize_key(name) == group_key))
            .map(|profile| profile.user_id.clone())
            .collect();
        members.sort();
        members
    }
}
