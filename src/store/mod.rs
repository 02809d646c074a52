use crate::error::{Context, Result, simple_error};
use crate::roster::Roster;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A `code:name` line of the members file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRecord {
    pub code: String,
    pub name: String,
}

/// A `name:code1,code2` line of the groups file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub members: Vec<String>,
}

/// Reads and writes a roster as a pair of colon-delimited text files.
#[derive(Clone, Debug)]
pub struct RosterStore {
    pub members_path: PathBuf,
    pub groups_path: PathBuf,
}

impl RosterStore {
    pub fn new(members_path: impl Into<PathBuf>, groups_path: impl Into<PathBuf>) -> Self {
        Self { members_path: members_path.into(), groups_path: groups_path.into() }
    }

    /// Build a roster from both files. Missing files count as empty.
    pub fn load(&self) -> Result<Roster> {
        let members = parse_members(&read_optional(&self.members_path)?);
        let groups = parse_groups(&read_optional(&self.groups_path)?);
        let roster = build_roster(members, groups);
        info!(
            members = roster.member_count(),
            groups = roster.group_count(),
            "roster loaded"
        );
        Ok(roster)
    }

    /// Write both files. Fails before writing if a value would not survive a reload.
    pub fn save(&self, roster: &Roster) -> Result<()> {
        check_storable(roster)?;
        fs::write(&self.members_path, render_members(roster))
            .with_ctx(|| format!("write {}", self.members_path.display()))?;
        fs::write(&self.groups_path, render_groups(roster))
            .with_ctx(|| format!("write {}", self.groups_path.display()))?;
        info!(path = %self.groups_path.display(), "roster saved");
        Ok(())
    }
}

/// Whether `value` is written and read back unchanged as one field of a line.
fn storable(value: &str, delimiters: &[char]) -> bool {
    value.trim() == value
        && !value.starts_with('#')
        && !value.contains(['\n', '\r'])
        && !value.contains(delimiters)
}

fn check_storable(roster: &Roster) -> Result<()> {
    for m in roster.member_ids().filter_map(|id| roster.member(id)) {
        if !storable(m.code(), &[':', ',']) {
            return Err(simple_error(format!("member code '{}' cannot be stored", m.code())));
        }
        // Only the first ':' splits a member line, so names may contain one.
        let name_ok = m.name().trim() == m.name() && !m.name().contains(['\n', '\r']);
        if !name_ok {
            return Err(simple_error(format!("member name '{}' cannot be stored", m.name())));
        }
    }
    for g in roster.group_ids().filter_map(|id| roster.group(id)) {
        if !storable(g.name(), &[':']) {
            return Err(simple_error(format!("group name '{}' cannot be stored", g.name())));
        }
    }
    Ok(())
}

fn read_optional(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path).with_ctx(|| format!("read {}", path.display()))
}

pub fn parse_members(contents: &str) -> Vec<MemberRecord> {
    let mut members = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((code, name)) = line.split_once(':') else {
            warn!(line = lineno + 1, "skipping malformed member line");
            continue;
        };
        let code = code.trim();
        if code.is_empty() {
            warn!(line = lineno + 1, "skipping member without code");
            continue;
        }
        members.push(MemberRecord { code: code.to_string(), name: name.trim().to_string() });
    }
    members
}

pub fn parse_groups(contents: &str) -> Vec<GroupRecord> {
    let mut groups = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, codes)) = line.split_once(':') else {
            warn!(line = lineno + 1, "skipping malformed group line");
            continue;
        };
        let members = codes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        groups.push(GroupRecord { name: name.trim().to_string(), members });
    }
    groups
}

/// Enroll everything through the roster so the result is consistent.
pub fn build_roster(members: Vec<MemberRecord>, groups: Vec<GroupRecord>) -> Roster {
    let mut roster = Roster::new();
    for rec in members {
        if let Err(e) = roster.add_member(rec.name, rec.code) {
            warn!(error = %e, "skipping member");
        }
    }
    for rec in groups {
        let gid = roster.add_group(rec.name);
        for code in rec.members {
            match roster.find_member(&code) {
                Some(mid) => {
                    if let Err(e) = roster.admit(gid, mid) {
                        warn!(error = %e, "skipping enrollment");
                    }
                }
                None => warn!(code = %code, "group lists unknown member"),
            }
        }
    }
    roster
}

pub fn render_members(roster: &Roster) -> String {
    let mut out = String::from("# code:name\n");
    for m in roster.member_ids().filter_map(|id| roster.member(id)) {
        out.push_str(&format!("{}:{}\n", m.code(), m.name()));
    }
    out
}

pub fn render_groups(roster: &Roster) -> String {
    let mut out = String::from("# name:code,code,...\n");
    for g in roster.group_ids().filter_map(|id| roster.group(id)) {
        let codes: Vec<&str> = g
            .member_ids()
            .iter()
            .filter_map(|id| roster.member(*id))
            .map(|m| m.code())
            .collect();
        out.push_str(&format!("{}:{}\n", g.name(), codes.join(",")));
    }
    out
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{path::PathBuf, time::{SystemTime, UNIX_EPOCH}};

	fn tmp_path(tag: &str) -> PathBuf {
		let mut p = std::env::temp_dir();
		let n = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
		p.push(format!("roster_rs_{tag}_{}_{}", std::process::id(), n));
		p
	}

	#[test]
	fn parse_members_basic() {
		let data = "\
# comment
001:Ana
002: Bruno Silva
broken line
:nameless
";
		let members = parse_members(data);
		assert_eq!(members.len(), 2);
		assert_eq!(members[0], MemberRecord { code: "001".into(), name: "Ana".into() });
		assert_eq!(members[1].name, "Bruno Silva");
	}

	#[test]
	fn parse_groups_basic() {
		let data = "\
DS1:001,002
DS2:
DS3:003,,004
";
		let groups = parse_groups(data);
		assert_eq!(groups.len(), 3);
		assert_eq!(groups[0].members, vec!["001".to_string(), "002".to_string()]);
		assert!(groups[1].members.is_empty());
		assert_eq!(groups[2].members, vec!["003".to_string(), "004".to_string()]);
	}

	#[test]
	fn build_roster_skips_unknown_and_duplicate_codes() {
		let members = parse_members("001:Ana\n001:Ana again\n002:Bruno\n");
		let groups = parse_groups("DS1:001,999,002,001\n");
		let roster = build_roster(members, groups);

		assert_eq!(roster.member_count(), 2);
		let ds1 = roster.find_group("DS1").unwrap();
		let names: Vec<&str> = roster.list_members(ds1).unwrap().iter().map(|m| m.name()).collect();
		assert_eq!(names, ["Ana", "Bruno"]);
		assert!(roster.is_consistent());
	}

	#[test]
	fn save_then_load_keeps_memberships() {
		let members_path = tmp_path("members");
		let groups_path = tmp_path("groups");
		let store = RosterStore::new(&members_path, &groups_path);

		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		let ds1 = roster.add_group("DS1");
		let ds2 = roster.add_group("DS2");
		roster.join(ana, ds1).unwrap();
		roster.join(ana, ds2).unwrap();
		store.save(&roster).unwrap();

		let loaded = store.load().unwrap();
		fs::remove_file(&members_path).ok();
		fs::remove_file(&groups_path).ok();

		let ana = loaded.find_member("001").unwrap();
		let groups: Vec<&str> = loaded.list_groups(ana).unwrap().iter().map(|g| g.name()).collect();
		assert_eq!(groups, ["DS1", "DS2"]);
	}

	#[test]
	fn save_rejects_delimiters() {
		let store = RosterStore::new(tmp_path("bad_m"), tmp_path("bad_g"));
		let mut roster = Roster::new();
		roster.add_group("a:b");
		let err = store.save(&roster).unwrap_err();
		assert_eq!(err.to_string(), "group name 'a:b' cannot be stored");
		assert!(!store.groups_path.exists());
	}

	fn assert_rejected(roster: &Roster, message: &str) {
		let store = RosterStore::new(tmp_path("rej_m"), tmp_path("rej_g"));
		let err = store.save(roster).unwrap_err();
		assert_eq!(err.to_string(), message);
		assert!(!store.members_path.exists());
		assert!(!store.groups_path.exists());
	}

	#[test]
	fn save_rejects_comment_markers() {
		let mut roster = Roster::new();
		roster.add_member("Ana", "#1").unwrap();
		assert_rejected(&roster, "member code '#1' cannot be stored");

		let mut roster = Roster::new();
		let ana = roster.add_member("Ana", "001").unwrap();
		let team = roster.add_group("#team");
		roster.join(ana, team).unwrap();
		assert_rejected(&roster, "group name '#team' cannot be stored");
	}

	#[test]
	fn save_rejects_line_breaks() {
		let mut roster = Roster::new();
		roster.add_member("Ana\n999:Mallory", "001").unwrap();
		assert_rejected(&roster, "member name 'Ana\n999:Mallory' cannot be stored");

		let mut roster = Roster::new();
		roster.add_member("Ana", "00\r1").unwrap();
		assert_rejected(&roster, "member code '00\r1' cannot be stored");

		let mut roster = Roster::new();
		roster.add_group("DS1\nDS2:001");
		assert_rejected(&roster, "group name 'DS1\nDS2:001' cannot be stored");
	}

	#[test]
	fn save_rejects_comma_in_code_and_padded_names() {
		let mut roster = Roster::new();
		roster.add_member("Ana", "0,1").unwrap();
		assert_rejected(&roster, "member code '0,1' cannot be stored");

		let mut roster = Roster::new();
		roster.add_member(" Ana", "001").unwrap();
		assert_rejected(&roster, "member name ' Ana' cannot be stored");
	}

	#[test]
	fn colon_in_member_name_survives_reload() {
		let members_path = tmp_path("colon_m");
		let groups_path = tmp_path("colon_g");
		let store = RosterStore::new(&members_path, &groups_path);
		let mut roster = Roster::new();
		roster.add_member("Ana: the first", "001").unwrap();
		store.save(&roster).unwrap();

		let loaded = store.load().unwrap();
		fs::remove_file(&members_path).ok();
		fs::remove_file(&groups_path).ok();
		let ana = loaded.find_member("001").unwrap();
		assert_eq!(loaded.member(ana).unwrap().name(), "Ana: the first");
	}

	#[test]
	fn missing_files_load_empty() {
		let store = RosterStore::new(tmp_path("nope_m"), tmp_path("nope_g"));
		let roster = store.load().unwrap();
		assert_eq!(roster.member_count(), 0);
		assert_eq!(roster.group_count(), 0);
	}
}
