//! Member/group roster with a bidirectional many-to-many relation.
//!
//! Members and groups live in a single arena ([`Roster`]) and refer to each
//! other through typed identifiers. Every mutation of the relation goes
//! through the roster so that `member.groups` and `group.members` always
//! agree.
//!
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use thiserror::Error;
use tracing::{debug, info};

use crate::error::critical_error;

/// Identifier of a [`Member`] inside the roster that issued it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(usize);

/// Identifier of a [`Group`] inside the roster that issued it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl MemberId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors returned by roster mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("unknown member #{0}")]
    UnknownMember(usize),

    #[error("unknown group #{0}")]
    UnknownGroup(usize),

    #[error("registration code '{0}' is already taken")]
    DuplicateCode(String),

    #[error("registration code must not be empty")]
    EmptyCode,
}

/// A person identified by a unique registration code.
#[derive(Clone, Debug)]
pub struct Member {
    code: String,
    name: String,
    groups: Vec<GroupId>,
}

impl Member {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Groups this member belongs to, in enrollment order.
    pub fn group_ids(&self) -> &[GroupId] {
        &self.groups
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Member: {}, Code: {}", self.name, self.code)
    }
}

/// A named collection of members. Names are not required to be unique.
#[derive(Clone, Debug)]
pub struct Group {
    name: String,
    members: Vec<MemberId>,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members of this group, in enrollment order.
    pub fn member_ids(&self) -> &[MemberId] {
        &self.members
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Roster {
    members: Vec<Member>,
    groups: Vec<Group>,
    codes: HashMap<String, MemberId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new member with no group memberships.
    pub fn add_member(
        &mut self,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> Result<MemberId, RosterError> {
        let code = code.into();
        if code.is_empty() {
            return Err(RosterError::EmptyCode);
        }
        if self.codes.contains_key(&code) {
            return Err(RosterError::DuplicateCode(code));
        }
        let id = MemberId(self.members.len());
        self.codes.insert(code.clone(), id);
        self.members.push(Member {
            code,
            name: name.into(),
            groups: Vec::new(),
        });
        debug!(member = id.0, "member added");
        Ok(id)
    }

    /// Register a new, empty group.
    pub fn add_group(&mut self, name: impl Into<String>) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            name: name.into(),
            members: Vec::new(),
        });
        debug!(group = id.0, "group added");
        id
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(id.0)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    pub fn find_member(&self, code: &str) -> Option<MemberId> {
        self.codes.get(code).copied()
    }

    /// First group created with `name`.
    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| g.name == name).map(GroupId)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> + '_ {
        (0..self.members.len()).map(MemberId)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        (0..self.groups.len()).map(GroupId)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Link `member` and `group` on both sides.
    ///
    /// Idempotent: an existing link is left as is and `Ok(false)` is
    /// returned. Both identifiers are validated before anything changes.
    pub fn enroll(&mut self, member: MemberId, group: GroupId) -> Result<bool, RosterError> {
        self.check(member, group)?;
        let mut linked = false;
        let m = &mut self.members[member.0];
        if !m.groups.contains(&group) {
            m.groups.push(group);
            linked = true;
        }
        let g = &mut self.groups[group.0];
        if !g.members.contains(&member) {
            g.members.push(member);
            linked = true;
        }
        if linked {
            info!(
                member = %self.members[member.0].code,
                group = %self.groups[group.0].name,
                "enrolled"
            );
        }
        Ok(linked)
    }

    /// Member side of [`enroll`](Self::enroll): add `group` to `member`.
    pub fn join(&mut self, member: MemberId, group: GroupId) -> Result<bool, RosterError> {
        self.enroll(member, group)
    }

    /// Group side of [`enroll`](Self::enroll): add `member` to `group`.
    pub fn admit(&mut self, group: GroupId, member: MemberId) -> Result<bool, RosterError> {
        self.enroll(member, group)
    }

    /// Remove the link between `member` and `group` from both sides.
    pub fn withdraw(&mut self, member: MemberId, group: GroupId) -> Result<bool, RosterError> {
        self.check(member, group)?;
        let m = &mut self.members[member.0];
        let before = m.groups.len();
        m.groups.retain(|g| *g != group);
        let mut unlinked = m.groups.len() != before;
        let g = &mut self.groups[group.0];
        let before = g.members.len();
        g.members.retain(|m| *m != member);
        unlinked |= g.members.len() != before;
        if unlinked {
            info!(
                member = %self.members[member.0].code,
                group = %self.groups[group.0].name,
                "withdrawn"
            );
        }
        Ok(unlinked)
    }

    pub fn is_enrolled(&self, member: MemberId, group: GroupId) -> bool {
        self.member(member)
            .map(|m| m.groups.contains(&group))
            .unwrap_or(false)
    }

    /// Members of `group` in enrollment order.
    pub fn list_members(&self, group: GroupId) -> Result<Vec<&Member>, RosterError> {
        let g = self.group(group).ok_or(RosterError::UnknownGroup(group.0))?;
        Ok(g.members
            .iter()
            .map(|id| self.members.get(id.0).unwrap_or_else(|| critical_error()))
            .collect())
    }

    /// Groups of `member` in enrollment order.
    pub fn list_groups(&self, member: MemberId) -> Result<Vec<&Group>, RosterError> {
        let m = self.member(member).ok_or(RosterError::UnknownMember(member.0))?;
        Ok(m.groups
            .iter()
            .map(|id| self.groups.get(id.0).unwrap_or_else(|| critical_error()))
            .collect())
    }

    /// Whether every link is recorded on both sides exactly once.
    pub fn is_consistent(&self) -> bool {
        let members_ok = self.members.iter().enumerate().all(|(mi, m)| {
            m.groups.iter().enumerate().all(|(pos, gid)| {
                !m.groups[..pos].contains(gid)
                    && self
                        .groups
                        .get(gid.0)
                        .is_some_and(|g| g.members.contains(&MemberId(mi)))
            })
        });
        let groups_ok = self.groups.iter().enumerate().all(|(gi, g)| {
            g.members.iter().enumerate().all(|(pos, mid)| {
                !g.members[..pos].contains(mid)
                    && self
                        .members
                        .get(mid.0)
                        .is_some_and(|m| m.groups.contains(&GroupId(gi)))
            })
        });
        members_ok && groups_ok
    }

    fn check(&self, member: MemberId, group: GroupId) -> Result<(), RosterError> {
        if member.0 >= self.members.len() {
            return Err(RosterError::UnknownMember(member.0));
        }
        if group.0 >= self.groups.len() {
            return Err(RosterError::UnknownGroup(group.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn names<T: Display>(items: &[&T]) -> Vec<String> {
		items.iter().map(|i| i.to_string()).collect()
	}

	#[test]
	fn enroll_links_both_sides() {
		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		let ds1 = roster.add_group("DS1");

		assert!(roster.enroll(ana, ds1).unwrap());
		assert_eq!(roster.list_groups(ana).unwrap().len(), 1);
		assert_eq!(roster.list_members(ds1).unwrap()[0].code(), "001");
		assert!(roster.is_enrolled(ana, ds1));
		assert!(roster.is_consistent());
	}

	#[test]
	fn enroll_twice_keeps_single_entries() {
		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		let ds1 = roster.add_group("DS1");

		assert!(roster.enroll(ana, ds1).unwrap());
		assert!(!roster.enroll(ana, ds1).unwrap());
		assert!(!roster.admit(ds1, ana).unwrap());
		assert_eq!(roster.list_groups(ana).unwrap().len(), 1);
		assert_eq!(roster.list_members(ds1).unwrap().len(), 1);
	}

	#[test]
	fn join_and_admit_reach_the_same_state() {
		let mut a = Roster::new();
		let mut b = Roster::new();
		for r in [&mut a, &mut b] {
			r.add_member("Ana", "001").unwrap();
			r.add_group("DS1");
		}
		let (m, g) = (MemberId(0), GroupId(0));
		a.join(m, g).unwrap();
		b.admit(g, m).unwrap();

		assert_eq!(a.member(m).unwrap().group_ids(), b.member(m).unwrap().group_ids());
		assert_eq!(a.group(g).unwrap().member_ids(), b.group(g).unwrap().member_ids());
	}

	#[test]
	fn listing_keeps_enrollment_order() {
		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		let bruno = roster.add_member("Bruno", "002").unwrap();
		let ds1 = roster.add_group("DS1");
		let ds2 = roster.add_group("DS2");

		roster.enroll(ana, ds1).unwrap();
		roster.enroll(ana, ds2).unwrap();
		roster.admit(ds1, bruno).unwrap();

		assert_eq!(names(&roster.list_groups(ana).unwrap()), ["DS1", "DS2"]);
		let members: Vec<&str> = roster.list_members(ds1).unwrap().iter().map(|m| m.name()).collect();
		assert_eq!(members, ["Ana", "Bruno"]);
	}

	#[test]
	fn withdraw_unlinks_both_sides() {
		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		let ds1 = roster.add_group("DS1");
		let ds2 = roster.add_group("DS2");
		roster.enroll(ana, ds1).unwrap();
		roster.enroll(ana, ds2).unwrap();

		assert!(roster.withdraw(ana, ds1).unwrap());
		assert!(!roster.withdraw(ana, ds1).unwrap());
		assert_eq!(names(&roster.list_groups(ana).unwrap()), ["DS2"]);
		assert!(roster.list_members(ds1).unwrap().is_empty());
		assert!(roster.is_consistent());
	}

	#[test]
	fn unknown_ids_are_rejected_without_mutation() {
		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		assert_eq!(roster.enroll(ana, GroupId(3)), Err(RosterError::UnknownGroup(3)));
		assert_eq!(roster.list_groups(MemberId(9)).unwrap_err(), RosterError::UnknownMember(9));
		assert!(roster.member(ana).unwrap().group_ids().is_empty());
	}

	#[test]
	fn codes_must_be_unique_and_non_empty() {
		let mut roster = Roster::new();
		roster.add_member("Ana", "001").unwrap();
		assert_eq!(
			roster.add_member("Another Ana", "001"),
			Err(RosterError::DuplicateCode("001".to_string()))
		);
		assert_eq!(roster.add_member("Nobody", ""), Err(RosterError::EmptyCode));
		assert_eq!(roster.member_count(), 1);
	}

	#[test]
	fn group_names_may_repeat() {
		let mut roster = Roster::new();
		let first = roster.add_group("DS1");
		let second = roster.add_group("DS1");
		assert_ne!(first, second);
		assert_eq!(roster.find_group("DS1"), Some(first));
	}

	#[test]
	#[should_panic(expected = "critical error")]
	fn dangling_internal_id_is_fatal() {
		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		roster.members[ana.0].groups.push(GroupId(42));
		let _ = roster.list_groups(ana);
	}

	#[test]
	fn member_display_shows_name_and_code() {
		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		assert_eq!(roster.member(ana).unwrap().to_string(), "Member: Ana, Code: 001");
	}
}
