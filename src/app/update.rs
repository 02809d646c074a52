use anyhow::{Result, anyhow, bail};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::{ActiveTab, AppState, InputMode, MembersFocus, ModalState, PendingAction};
use crate::roster::{GroupId, MemberId, Roster};
use crate::search::apply_search;
use crate::ui;

const PAGE_STEP: usize = 10;

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(app, key.code) {
                    break;
                }
            }
        }
    }

    debug!(uptime = ?app.started_at.elapsed(), "event loop finished");
    Ok(())
}

/// Apply one key press to the state. Returns `true` when the user asked to quit.
pub fn handle_key(app: &mut AppState, code: KeyCode) -> bool {
    match app.input_mode {
        InputMode::Normal => return handle_normal_key(app, code),
        InputMode::Modal => handle_modal_key(app, code),
        InputMode::SearchMembers | InputMode::SearchGroups => match code {
            KeyCode::Enter => {
                apply_search(app);
                app.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                app.search_query.clear();
            }
            KeyCode::Backspace => {
                app.search_query.pop();
            }
            KeyCode::Char(c) => app.search_query.push(c),
            _ => {}
        },
    }
    false
}

fn handle_normal_key(app: &mut AppState, code: KeyCode) -> bool {
    let rpp = app.rows_per_page.max(1);
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => {
            app.search_query.clear();
            app.input_mode = match app.active_tab {
                ActiveTab::Members => InputMode::SearchMembers,
                ActiveTab::Groups => InputMode::SearchGroups,
            };
        }
        KeyCode::Tab => {
            app.active_tab = match app.active_tab {
                ActiveTab::Members => ActiveTab::Groups,
                ActiveTab::Groups => ActiveTab::Members,
            };
        }
        KeyCode::BackTab => {
            if app.active_tab == ActiveTab::Members {
                app.members_focus = match app.members_focus {
                    MembersFocus::MembersList => MembersFocus::MemberOf,
                    MembersFocus::MemberOf => MembersFocus::MembersList,
                };
                app.member_of_index = 0;
            }
        }
        KeyCode::Char('n') => {
            let modal = match app.active_tab {
                ActiveTab::Members => ModalState::MemberAddInput {
                    selected: 0,
                    code: String::new(),
                    name: String::new(),
                },
                ActiveTab::Groups => ModalState::GroupAddInput {
                    name: String::new(),
                },
            };
            open_modal(app, modal);
        }
        KeyCode::Enter => match app.active_tab {
            ActiveTab::Members => match app.members_focus {
                MembersFocus::MembersList => {
                    if app.selected_member().is_some() {
                        open_modal(app, ModalState::MemberActions { selected: 0 });
                    }
                }
                MembersFocus::MemberOf => {
                    let groups = app.selected_member_groups();
                    if let Some(gid) = groups.get(app.member_of_index).copied() {
                        let modal = ModalState::GroupsActions {
                            selected: 0,
                            target: Some(gid),
                        };
                        open_modal(app, modal);
                    }
                }
            },
            ActiveTab::Groups => {
                let modal = ModalState::GroupsActions {
                    selected: 0,
                    target: None,
                };
                open_modal(app, modal);
            }
        },
        KeyCode::Up | KeyCode::Char('k') => move_cursor(app, |idx, _| idx.saturating_sub(1)),
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(app, |idx, len| (idx + 1).min(len.saturating_sub(1)))
        }
        KeyCode::Left | KeyCode::Char('h') => move_cursor(app, |idx, _| idx.saturating_sub(rpp)),
        KeyCode::Right | KeyCode::Char('l') => {
            move_cursor(app, |idx, len| idx.saturating_add(rpp).min(len.saturating_sub(1)))
        }
        _ => {}
    }
    false
}

/// Move whichever cursor is focused; `step` gets the current index and the list length.
fn move_cursor(app: &mut AppState, step: impl Fn(usize, usize) -> usize) {
    match (app.active_tab, app.members_focus) {
        (ActiveTab::Members, MembersFocus::MembersList) => {
            app.selected_member_index = step(app.selected_member_index, app.members.len());
            app.member_of_index = 0;
        }
        (ActiveTab::Members, MembersFocus::MemberOf) => {
            let len = app.selected_member_groups().len();
            app.member_of_index = step(app.member_of_index, len);
        }
        (ActiveTab::Groups, _) => {
            app.selected_group_index = step(app.selected_group_index, app.groups.len());
        }
    }
}

/// Arrow/page navigation shared by the list modals.
fn navigate_list(code: KeyCode, selected: &mut usize, offset: &mut usize, total: usize) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => {
            *selected = selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if *selected + 1 < total {
                *selected += 1;
            }
        }
        KeyCode::PageUp => {
            *selected = selected.saturating_sub(PAGE_STEP);
        }
        KeyCode::PageDown => {
            *selected = (*selected + PAGE_STEP).min(total.saturating_sub(1));
        }
        _ => {}
    }
    if *selected < *offset {
        *offset = *selected;
    }
}

fn open_modal(app: &mut AppState, modal: ModalState) {
    app.modal = Some(modal);
    app.input_mode = InputMode::Modal;
}

fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.input_mode = InputMode::Normal;
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    let Some(modal) = app.modal.take() else {
        close_modal(app);
        return;
    };
    if code == KeyCode::Esc {
        close_modal(app);
        return;
    }
    match next_modal(app, modal, code) {
        Some(next) => app.modal = Some(next),
        None => close_modal(app),
    }
}

/// Compute the modal that follows `modal` after `code`. `None` closes it.
fn next_modal(app: &mut AppState, modal: ModalState, code: KeyCode) -> Option<ModalState> {
    match modal {
        ModalState::MemberActions { mut selected } => match code {
            KeyCode::Up | KeyCode::Char('k') => Some(ModalState::MemberActions {
                selected: selected.saturating_sub(1),
            }),
            KeyCode::Down | KeyCode::Char('j') => {
                if selected < 1 {
                    selected += 1;
                }
                Some(ModalState::MemberActions { selected })
            }
            KeyCode::Enter => match selected {
                0 => Some(ModalState::EnrollGroups { selected: 0, offset: 0 }),
                _ => Some(ModalState::WithdrawGroups { selected: 0, offset: 0 }),
            },
            _ => Some(ModalState::MemberActions { selected }),
        },
        ModalState::EnrollGroups { mut selected, mut offset } => {
            let groups: Vec<GroupId> = app.roster.group_ids().collect();
            if code == KeyCode::Enter {
                let member = app.selected_member()?;
                let group = groups.get(selected).copied()?;
                return Some(run_action(app, PendingAction::JoinGroup { member, group }));
            }
            navigate_list(code, &mut selected, &mut offset, groups.len());
            Some(ModalState::EnrollGroups { selected, offset })
        }
        ModalState::WithdrawGroups { mut selected, mut offset } => {
            let groups = app.selected_member_groups();
            if code == KeyCode::Enter {
                let member = app.selected_member()?;
                let group = groups.get(selected).copied()?;
                return Some(run_action(app, PendingAction::Withdraw { member, group }));
            }
            navigate_list(code, &mut selected, &mut offset, groups.len());
            Some(ModalState::WithdrawGroups { selected, offset })
        }
        ModalState::MemberAddInput {
            mut selected,
            code: mut member_code,
            mut name,
        } => {
            let field = if selected == 0 { &mut member_code } else { &mut name };
            match code {
                KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                    selected = 1 - selected.min(1);
                }
                KeyCode::Enter => {
                    let pending = PendingAction::CreateMember {
                        code: member_code,
                        name,
                    };
                    return Some(run_action(app, pending));
                }
                KeyCode::Backspace => {
                    field.pop();
                }
                KeyCode::Char(c) => field.push(c),
                _ => {}
            }
            Some(ModalState::MemberAddInput {
                selected,
                code: member_code,
                name,
            })
        }
        ModalState::GroupsActions { mut selected, target } => match code {
            KeyCode::Up | KeyCode::Char('k') => Some(ModalState::GroupsActions {
                selected: selected.saturating_sub(1),
                target,
            }),
            KeyCode::Down | KeyCode::Char('j') => {
                if selected < 2 {
                    selected += 1;
                }
                Some(ModalState::GroupsActions { selected, target })
            }
            KeyCode::Enter => match selected {
                0 => Some(ModalState::GroupAddMembers {
                    selected: 0,
                    offset: 0,
                    target,
                }),
                1 => Some(ModalState::GroupRemoveMembers {
                    selected: 0,
                    offset: 0,
                    target,
                }),
                _ => Some(ModalState::GroupAddInput {
                    name: String::new(),
                }),
            },
            _ => Some(ModalState::GroupsActions { selected, target }),
        },
        ModalState::GroupAddInput { mut name } => {
            match code {
                KeyCode::Enter => {
                    return Some(run_action(app, PendingAction::CreateGroup { name }));
                }
                KeyCode::Backspace => {
                    name.pop();
                }
                KeyCode::Char(c) => name.push(c),
                _ => {}
            }
            Some(ModalState::GroupAddInput { name })
        }
        ModalState::GroupAddMembers {
            mut selected,
            mut offset,
            target,
        } => {
            let members: Vec<MemberId> = app.roster.member_ids().collect();
            if code == KeyCode::Enter {
                let group = target.or(app.selected_group())?;
                let member = members.get(selected).copied()?;
                return Some(run_action(app, PendingAction::AdmitMember { group, member }));
            }
            navigate_list(code, &mut selected, &mut offset, members.len());
            Some(ModalState::GroupAddMembers {
                selected,
                offset,
                target,
            })
        }
        ModalState::GroupRemoveMembers {
            mut selected,
            mut offset,
            target,
        } => {
            let group = target.or(app.selected_group());
            let members: Vec<MemberId> = group
                .and_then(|g| app.roster.group(g))
                .map(|g| g.member_ids().to_vec())
                .unwrap_or_default();
            if code == KeyCode::Enter {
                let group = group?;
                let member = members.get(selected).copied()?;
                return Some(run_action(app, PendingAction::Withdraw { member, group }));
            }
            navigate_list(code, &mut selected, &mut offset, members.len());
            Some(ModalState::GroupRemoveMembers {
                selected,
                offset,
                target,
            })
        }
        ModalState::Info { message } => match code {
            KeyCode::Enter => None,
            _ => Some(ModalState::Info { message }),
        },
    }
}

/// Perform `pending` and report the outcome in an info modal.
fn run_action(app: &mut AppState, pending: PendingAction) -> ModalState {
    match perform_pending_action(app, pending) {
        Ok(message) => ModalState::Info { message },
        Err(e) => {
            warn!(error = %e, "roster action failed");
            ModalState::Info {
                message: format!("Error: {e}"),
            }
        }
    }
}

fn labels(roster: &Roster, member: MemberId, group: GroupId) -> (String, String) {
    let m = roster.member(member).map(|m| m.name().to_string()).unwrap_or_default();
    let g = roster.group(group).map(|g| g.name().to_string()).unwrap_or_default();
    (m, g)
}

fn apply_pending(roster: &mut Roster, pending: PendingAction) -> Result<String> {
    let message = match pending {
        PendingAction::JoinGroup { member, group } => {
            let added = roster.join(member, group)?;
            let (m, g) = labels(roster, member, group);
            if added {
                format!("Enrolled '{m}' in '{g}'")
            } else {
                format!("'{m}' is already in '{g}'")
            }
        }
        PendingAction::AdmitMember { group, member } => {
            let added = roster.admit(group, member)?;
            let (m, g) = labels(roster, member, group);
            if added {
                format!("Added '{m}' to '{g}'")
            } else {
                format!("'{m}' is already in '{g}'")
            }
        }
        PendingAction::Withdraw { member, group } => {
            let removed = roster.withdraw(member, group)?;
            let (m, g) = labels(roster, member, group);
            if removed {
                format!("Removed '{m}' from '{g}'")
            } else {
                format!("'{m}' is not in '{g}'")
            }
        }
        PendingAction::CreateMember { code, name } => {
            let (code, name) = (code.trim(), name.trim());
            if name.is_empty() {
                bail!("member name must not be empty");
            }
            roster.add_member(name, code)?;
            format!("Added member '{name}' ({code})")
        }
        PendingAction::CreateGroup { name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("group name must not be empty");
            }
            roster.add_group(name);
            format!("Created group '{name}'")
        }
    };
    Ok(message)
}

/// Apply a roster change, persist it when a store is configured, and refresh the views.
///
/// The change is made on a copy of the roster, which replaces the live one
/// only after it was saved, so a failed save leaves the app unchanged.
pub fn perform_pending_action(app: &mut AppState, pending: PendingAction) -> Result<String> {
    let mut roster = app.roster.clone();
    let message = apply_pending(&mut roster, pending)?;
    if let Some(store) = &app.store {
        store.save(&roster).map_err(|e| anyhow!(e))?;
    }
    app.roster = roster;
    app.reset_views();
    Ok(message)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::app::Theme;
	use crate::roster::Roster;

	fn mk_app() -> AppState {
		let mut roster = Roster::new();
		roster.add_member("Ana", "001").unwrap();
		roster.add_member("Bruno", "002").unwrap();
		roster.add_group("DS1");
		roster.add_group("DS2");
		AppState::new(roster, None, Theme::dark())
	}

	fn press(app: &mut AppState, keys: &[KeyCode]) {
		for k in keys {
			handle_key(app, *k);
		}
	}

	#[test]
	fn enroll_from_member_actions() {
		let mut app = mk_app();
		// Ana -> Enroll in group -> second group
		press(&mut app, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Down, KeyCode::Enter]);
		assert!(matches!(app.modal, Some(ModalState::Info { ref message }) if message == "Enrolled 'Ana' in 'DS2'"));
		press(&mut app, &[KeyCode::Enter]);
		assert_eq!(app.input_mode, InputMode::Normal);

		let ana = app.roster.find_member("001").unwrap();
		let ds2 = app.roster.find_group("DS2").unwrap();
		assert!(app.roster.is_enrolled(ana, ds2));
		assert_eq!(app.selected_member_groups(), vec![ds2]);
	}

	#[test]
	fn add_member_from_groups_tab() {
		let mut app = mk_app();
		// Groups tab -> DS1 -> Add member -> Bruno
		press(&mut app, &[KeyCode::Tab, KeyCode::Enter, KeyCode::Enter, KeyCode::Char('j'), KeyCode::Enter]);
		let bruno = app.roster.find_member("002").unwrap();
		let ds1 = app.roster.find_group("DS1").unwrap();
		assert_eq!(app.roster.member(bruno).unwrap().group_ids(), [ds1]);
		assert!(app.roster.is_consistent());
	}

	#[test]
	fn new_member_form_switches_fields() {
		let mut app = mk_app();
		press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('0'), KeyCode::Char('3'), KeyCode::Tab]);
		press(&mut app, &[KeyCode::Char('C'), KeyCode::Char('a'), KeyCode::Char('i')]);
		assert_eq!(
			app.modal,
			Some(ModalState::MemberAddInput { selected: 1, code: "03".into(), name: "Cai".into() })
		);
		press(&mut app, &[KeyCode::Enter]);
		let cai = app.roster.find_member("03").unwrap();
		assert_eq!(app.roster.member(cai).unwrap().name(), "Cai");
		assert_eq!(app.members.len(), 3);
	}

	#[test]
	fn duplicate_code_reports_error() {
		let mut app = mk_app();
		let msg = perform_pending_action(&mut app, PendingAction::CreateMember { code: "001".into(), name: "Ana".into() })
			.unwrap_err()
			.to_string();
		assert!(msg.contains("already taken"));
		assert_eq!(app.roster.member_count(), 2);
	}

	#[test]
	fn failed_save_leaves_roster_untouched() {
		use crate::store::RosterStore;
		use std::time::{SystemTime, UNIX_EPOCH};
		let n = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
		let dir = std::env::temp_dir();
		let store = RosterStore::new(
			dir.join(format!("roster_upd_m_{}_{n}", std::process::id())),
			dir.join(format!("roster_upd_g_{}_{n}", std::process::id())),
		);
		let mut app = AppState::new(Roster::new(), Some(store.clone()), Theme::dark());

		let err = perform_pending_action(&mut app, PendingAction::CreateGroup { name: "a:b".into() })
			.unwrap_err();
		assert_eq!(err.to_string(), "group name 'a:b' cannot be stored");
		assert_eq!(app.roster.group_count(), 0);
		assert!(app.groups.is_empty());

		// The rejected group does not poison later edits.
		let pending = PendingAction::CreateMember { code: "001".into(), name: "Ana".into() };
		perform_pending_action(&mut app, pending).unwrap();
		let on_disk = store.load().unwrap();
		std::fs::remove_file(&store.members_path).ok();
		std::fs::remove_file(&store.groups_path).ok();
		assert_eq!(app.roster.member_count(), 1);
		assert_eq!(on_disk.member_count(), 1);
		assert_eq!(on_disk.group_count(), 0);
	}

	#[test]
	fn esc_closes_any_modal() {
		let mut app = mk_app();
		press(&mut app, &[KeyCode::Enter, KeyCode::Esc]);
		assert!(app.modal.is_none());
		assert_eq!(app.input_mode, InputMode::Normal);
	}

	#[test]
	fn q_quits_only_in_normal_mode() {
		let mut app = mk_app();
		press(&mut app, &[KeyCode::Char('/')]);
		assert!(!handle_key(&mut app, KeyCode::Char('q')));
		assert_eq!(app.search_query, "q");
		press(&mut app, &[KeyCode::Esc]);
		assert!(handle_key(&mut app, KeyCode::Char('q')));
	}
}
