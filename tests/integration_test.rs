// Integration tests for roster-manager

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn tmp_path(tag: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nonce = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    path.push(format!("roster_it_{tag}_{}_{}", std::process::id(), nonce));
    path
}

// 1) Theme config roundtrip and init
#[test]
fn theme_roundtrip_and_init() {
    use roster_manager::app::Theme;

    let path_str = tmp_path("theme").to_string_lossy().to_string();

    let t = Theme::mocha();
    t.write_file(&path_str).expect("write theme");
    let t2 = Theme::from_file(&path_str).expect("read theme");
    assert_eq!(t, t2);

    // load_or_init creates file if missing
    let p2_str = tmp_path("theme_init").to_string_lossy().to_string();
    let _created = Theme::load_or_init(&p2_str);
    assert!(PathBuf::from(&p2_str).exists());

    let _ = std::fs::remove_file(&path_str);
    let _ = std::fs::remove_file(&p2_str);
}

// 2) Edits made through the app are persisted and reload consistently
#[test]
fn app_actions_persist_to_store() {
    use roster_manager::app::update::perform_pending_action;
    use roster_manager::app::{AppState, PendingAction, Theme};
    use roster_manager::store::RosterStore;

    let members_path = tmp_path("members");
    let groups_path = tmp_path("groups");
    let store = RosterStore::new(&members_path, &groups_path);

    let roster = store.load().expect("empty load");
    let mut app = AppState::new(roster, Some(store.clone()), Theme::dark());

    perform_pending_action(&mut app, PendingAction::CreateMember { code: "001".into(), name: "Ana".into() }).unwrap();
    perform_pending_action(&mut app, PendingAction::CreateMember { code: "002".into(), name: "Bruno".into() }).unwrap();
    perform_pending_action(&mut app, PendingAction::CreateGroup { name: "DS1".into() }).unwrap();
    perform_pending_action(&mut app, PendingAction::CreateGroup { name: "DS2".into() }).unwrap();

    let ana = app.roster.find_member("001").unwrap();
    let bruno = app.roster.find_member("002").unwrap();
    let ds1 = app.roster.find_group("DS1").unwrap();
    let ds2 = app.roster.find_group("DS2").unwrap();

    let msg = perform_pending_action(&mut app, PendingAction::JoinGroup { member: ana, group: ds1 }).unwrap();
    assert_eq!(msg, "Enrolled 'Ana' in 'DS1'");
    perform_pending_action(&mut app, PendingAction::JoinGroup { member: ana, group: ds2 }).unwrap();
    perform_pending_action(&mut app, PendingAction::AdmitMember { group: ds1, member: bruno }).unwrap();
    let msg = perform_pending_action(&mut app, PendingAction::AdmitMember { group: ds1, member: bruno }).unwrap();
    assert_eq!(msg, "'Bruno' is already in 'DS1'");

    let reloaded = store.load().expect("reload");
    std::fs::remove_file(&members_path).ok();
    std::fs::remove_file(&groups_path).ok();

    assert!(reloaded.is_consistent());
    let ds1 = reloaded.find_group("DS1").unwrap();
    let names: Vec<&str> = reloaded.list_members(ds1).unwrap().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["Ana", "Bruno"]);
    let ana = reloaded.find_member("001").unwrap();
    let groups: Vec<&str> = reloaded.list_groups(ana).unwrap().iter().map(|g| g.name()).collect();
    assert_eq!(groups, ["DS1", "DS2"]);
}

// 3) Member-side and group-side entry points in the UI leave the same roster
#[test]
fn join_and_admit_actions_are_symmetric() {
    use roster_manager::Roster;
    use roster_manager::app::update::perform_pending_action;
    use roster_manager::app::{AppState, PendingAction, Theme};

    let build = || {
        let mut roster = Roster::new();
        roster.add_member("Ana", "001").unwrap();
        roster.add_group("DS1");
        AppState::new(roster, None, Theme::dark())
    };
    let mut a = build();
    let mut b = build();
    let (m, g) = (a.roster.find_member("001").unwrap(), a.roster.find_group("DS1").unwrap());

    perform_pending_action(&mut a, PendingAction::JoinGroup { member: m, group: g }).unwrap();
    perform_pending_action(&mut b, PendingAction::AdmitMember { group: g, member: m }).unwrap();

    assert_eq!(a.roster.member(m).unwrap().group_ids(), b.roster.member(m).unwrap().group_ids());
    assert_eq!(a.roster.group(g).unwrap().member_ids(), b.roster.group(g).unwrap().member_ids());
    assert_eq!(a.selected_member_groups(), vec![g]);
}

// 4) Search after edits sees the new memberships
#[test]
fn search_sees_memberships() {
    use roster_manager::Roster;
    use roster_manager::app::{AppState, InputMode, Theme};
    use roster_manager::search::apply_search;

    let mut roster = Roster::new();
    let ana = roster.add_member("Ana", "001").unwrap();
    roster.add_member("Bruno", "002").unwrap();
    let ds1 = roster.add_group("DS1");
    roster.join(ana, ds1).unwrap();

    let mut app = AppState::new(roster, None, Theme::dark());
    app.input_mode = InputMode::SearchMembers;
    app.search_query = "ds1".into();
    apply_search(&mut app);
    assert_eq!(app.members, vec![ana]);
    assert_eq!(app.selected_member_index, 0);
}
