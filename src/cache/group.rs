use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use crate::database::GroupMembership;

/// 进程内用户组缓存：用户 id -> 所属用户组 id
#[derive(Debug, Default)]
pub struct UserGroupCache {
    memberships: RwLock<HashMap<i32, HashSet<i32>>>,
}

impl UserGroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_memberships(rows: impl IntoIterator<Item = GroupMembership>) -> Self {
        let cache = Self::new();
        cache.refresh(rows);
        cache
    }

    /// 整体替换缓存内容
    pub fn refresh(&self, rows: impl IntoIterator<Item = GroupMembership>) {
        let mut map: HashMap<i32, HashSet<i32>> = HashMap::new();
        for row in rows {
            map.entry(row.user_id).or_default().insert(row.group_id);
        }
        let count = map.len();
        *self
            .memberships
            .write()
            .unwrap_or_else(PoisonError::into_inner) = map;
        tracing::debug!("User group cache refreshed for {} users", count);
    }

    /// 用户所属的用户组 id（升序）
    pub fn group_ids(&self, user_id: i32) -> Vec<i32> {
        let memberships = self
            .memberships
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<i32> = memberships
            .get(&user_id)
            .map(|groups| groups.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    pub fn is_member(&self, user_id: i32, group_id: i32) -> bool {
        self.memberships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .is_some_and(|groups| groups.contains(&group_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(group_id: i32, user_id: i32) -> GroupMembership {
        GroupMembership { group_id, user_id }
    }

    #[test]
    fn groups_are_collected_per_user() {
        let cache = UserGroupCache::from_memberships([row(3, 1), row(1, 1), row(2, 5)]);
        assert_eq!(cache.group_ids(1), vec![1, 3]);
        assert_eq!(cache.group_ids(5), vec![2]);
        assert!(cache.group_ids(9).is_empty());
        assert!(cache.is_member(1, 3));
        assert!(!cache.is_member(5, 3));
    }

    #[test]
    fn refresh_replaces_previous_state() {
        let cache = UserGroupCache::from_memberships([row(1, 1)]);
        cache.refresh([row(2, 1)]);
        assert_eq!(cache.group_ids(1), vec![2]);
    }
}
