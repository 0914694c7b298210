//! Hit-groups: the broad-phase buckets entity collision scans are filtered by
//!
//! A top-level entity joins at most one group when it is spawned. Children are
//! never registered themselves; scans reach them through their parent.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use crate::consts::HIT_GROUP_COUNT;

/// Named collision bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitGroup {
    Player,
    PlayerShot,
    Monster,
    MonsterShot,
    Person,
}

impl HitGroup {
    pub const ALL: [HitGroup; HIT_GROUP_COUNT] = [
        HitGroup::Player,
        HitGroup::PlayerShot,
        HitGroup::Monster,
        HitGroup::MonsterShot,
        HitGroup::Person,
    ];

    /// Slot in the group table
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Mask containing only this group
    #[inline]
    pub const fn mask(self) -> GroupMask {
        GroupMask(1 << self as u8)
    }
}

/// Bitset of hit-groups a body tests itself against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMask(u8);

impl GroupMask {
    pub const NONE: GroupMask = GroupMask(0);

    pub const fn with(self, group: HitGroup) -> Self {
        GroupMask(self.0 | 1 << group as u8)
    }

    pub const fn contains(self, group: HitGroup) -> bool {
        self.0 & (1 << group as u8) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Groups in the mask, lowest index first
    pub fn iter(self) -> impl Iterator<Item = HitGroup> {
        HitGroup::ALL.into_iter().filter(move |g| self.contains(*g))
    }
}

impl From<HitGroup> for GroupMask {
    fn from(group: HitGroup) -> Self {
        group.mask()
    }
}

impl std::ops::BitOr for GroupMask {
    type Output = GroupMask;

    fn bitor(self, rhs: GroupMask) -> GroupMask {
        GroupMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOr<HitGroup> for HitGroup {
    type Output = GroupMask;

    fn bitor(self, rhs: HitGroup) -> GroupMask {
        self.mask().with(rhs)
    }
}

/// Fixed table of group membership lists
#[derive(Debug, Clone, Default)]
pub struct HitGroups {
    lists: [Vec<EntityId>; HIT_GROUP_COUNT],
}

impl HitGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: HitGroup, id: EntityId) {
        self.lists[group.index()].push(id);
    }

    /// Members of a group, in unspecified order
    pub fn members(&self, group: HitGroup) -> &[EntityId] {
        &self.lists[group.index()]
    }

    pub fn len(&self, group: HitGroup) -> usize {
        self.lists[group.index()].len()
    }

    pub fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }

    /// Drop every member for which `is_gone` holds, using swap-with-last
    ///
    /// Removal is O(1) per entry and does not preserve member order.
    /// Returns the number of entries removed.
    pub fn prune(&mut self, mut is_gone: impl FnMut(EntityId) -> bool) -> usize {
        let mut removed = 0;
        for list in &mut self.lists {
            let mut i = 0;
            while i < list.len() {
                if is_gone(list[i]) {
                    list.swap_remove(i);
                    removed += 1;
                } else {
                    i += 1;
                }
            }
        }
        removed
    }
}
