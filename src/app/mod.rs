//! Application state types and entry glue.
//!
//! Defines enums and structs that model the TUI state, as well as helpers
//! to construct defaults and to run the application loop (re-exported as `run`).
//!
pub mod update;

use ratatui::style::Color;
use std::time::Instant;

use crate::roster::{GroupId, MemberId, Roster};
use crate::store::RosterStore;

/// Top-level active tab in the UI.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActiveTab {
    Members,
    Groups,
}

/// Which pane is focused on the Members screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MembersFocus {
    MembersList,
    MemberOf,
}

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    SearchMembers,
    SearchGroups,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub text: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
        }
    }

    /// Catppuccin Mocha palette.
    pub fn mocha() -> Self {
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
        }
    }

    fn slots(&mut self) -> [(&'static str, &mut Color); 8] {
        [
            ("text", &mut self.text),
            ("title", &mut self.title),
            ("border", &mut self.border),
            ("header_bg", &mut self.header_bg),
            ("header_fg", &mut self.header_fg),
            ("status_bg", &mut self.status_bg),
            ("status_fg", &mut self.status_fg),
            ("highlight_fg", &mut self.highlight_fg),
        ]
    }

    /// Parse `key = color` lines over the `mocha` defaults. Unknown keys and bad colors are ignored.
    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let (key, Some(color)) = (key.trim(), parse_color(val)) else { continue };
            if let Some((_, slot)) = theme.slots().into_iter().find(|(k, _)| *k == key) {
                *slot = color;
            }
        }
        theme
    }

    pub fn from_file(path: &str) -> Option<Self> {
        std::fs::read_to_string(path).ok().map(|c| Self::parse(&c))
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::from("# roster-manager theme\n# Colors: #RRGGBB, RRGGBB or 'reset'\n\n");
        let mut copy = *self;
        for (key, color) in copy.slots() {
            let _ = writeln!(&mut buf, "{} = {}", key, color_to_str(*color));
        }
        std::fs::write(path, buf)
    }

    /// Load `path`, writing the default theme there first if it does not exist.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::warn!(path, error = %e, "could not write default theme");
        }
        t
    }
}

fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "reset" {
        return Some(Color::Reset);
    }
    let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn color_to_str(c: Color) -> String {
    match c {
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Black => "#000000".to_string(),
        Color::Gray => "#B3B3B3".to_string(),
        Color::DarkGray => "#4D4D4D".to_string(),
        Color::Cyan => "#00FFFF".to_string(),
        Color::Yellow => "#FFFF00".to_string(),
        Color::White => "#FFFFFF".to_string(),
        _ => "reset".to_string(),
    }
}

/// Modal dialog states for member and group actions.
#[derive(Clone, Debug, PartialEq)]
pub enum ModalState {
    MemberActions {
        selected: usize,
    },
    EnrollGroups {
        selected: usize,
        offset: usize,
    },
    WithdrawGroups {
        selected: usize,
        offset: usize,
    },
    MemberAddInput {
        selected: usize,
        code: String,
        name: String,
    },
    GroupsActions {
        selected: usize,
        target: Option<GroupId>,
    },
    GroupAddInput {
        name: String,
    },
    GroupAddMembers {
        selected: usize,
        offset: usize,
        target: Option<GroupId>,
    },
    GroupRemoveMembers {
        selected: usize,
        offset: usize,
        target: Option<GroupId>,
    },
    Info {
        message: String,
    },
}

/// Roster changes requested from the UI, executed by `update::perform_pending_action`.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingAction {
    /// Member side: add the group to the member.
    JoinGroup {
        member: MemberId,
        group: GroupId,
    },
    /// Group side: add the member to the group.
    AdmitMember {
        group: GroupId,
        member: MemberId,
    },
    Withdraw {
        member: MemberId,
        group: GroupId,
    },
    CreateMember {
        code: String,
        name: String,
    },
    CreateGroup {
        name: String,
    },
}

pub struct AppState {
    pub started_at: Instant,
    pub roster: Roster,
    pub store: Option<RosterStore>,
    /// Visible members (after search), as roster ids.
    pub members: Vec<MemberId>,
    /// Visible groups (after search), as roster ids.
    pub groups: Vec<GroupId>,
    pub active_tab: ActiveTab,
    pub selected_member_index: usize,
    pub selected_group_index: usize,
    /// Cursor inside the "Member of" pane.
    pub member_of_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub modal: Option<ModalState>,
    pub members_focus: MembersFocus,
}

impl AppState {
    pub fn new(roster: Roster, store: Option<RosterStore>, theme: Theme) -> Self {
        let mut app = Self {
            started_at: Instant::now(),
            roster,
            store,
            members: Vec::new(),
            groups: Vec::new(),
            active_tab: ActiveTab::Members,
            selected_member_index: 0,
            selected_group_index: 0,
            member_of_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme,
            modal: None,
            members_focus: MembersFocus::MembersList,
        };
        app.reset_views();
        app
    }

    /// Show every member and group again, keeping selections in range.
    pub fn reset_views(&mut self) {
        self.members = self.roster.member_ids().collect();
        self.groups = self.roster.group_ids().collect();
        self.selected_member_index = self.selected_member_index.min(self.members.len().saturating_sub(1));
        self.selected_group_index = self.selected_group_index.min(self.groups.len().saturating_sub(1));
        self.member_of_index = self.member_of_index.min(self.selected_member_groups().len().saturating_sub(1));
    }

    pub fn selected_member(&self) -> Option<MemberId> {
        self.members.get(self.selected_member_index).copied()
    }

    pub fn selected_group(&self) -> Option<GroupId> {
        self.groups.get(self.selected_group_index).copied()
    }

    /// Groups of the selected member, used by the "Member of" pane.
    pub fn selected_member_groups(&self) -> Vec<GroupId> {
        self.selected_member()
            .and_then(|id| self.roster.member(id))
            .map(|m| m.group_ids().to_vec())
            .unwrap_or_default()
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
