pub mod components;
pub mod groups;
pub mod members;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{ActiveTab, AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(root[1]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)].as_ref())
        .split(body[1]);

    let tabs = match app.active_tab { ActiveTab::Members => "[Members]  Groups", ActiveTab::Groups => "Members  [Groups]" };
    let prompt = match app.input_mode {
        InputMode::SearchMembers => format!("  Search members: {}", app.search_query),
        InputMode::SearchGroups => format!("  Search groups: {}", app.search_query),
        InputMode::Normal | InputMode::Modal => String::new(),
    };
    let p = Paragraph::new(format!(
        "{tabs}{prompt}  Tab: switch tab; Shift-Tab: member-of; /: search; n: new; Enter: actions; Esc: cancel; q: quit"
    ))
    .block(
        Block::default()
            .title("roster-manager")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    match app.active_tab {
        ActiveTab::Members => {
            members::render_members_table(f, body[0], app);
            members::render_member_details(f, right[0], app);
            members::render_member_groups(f, right[1], app);
        }
        ActiveTab::Groups => {
            groups::render_groups_table(f, body[0], app);
            groups::render_group_details(f, right[0], app);
            groups::render_group_members(f, right[1], app);
        }
    }

    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        let area = f.area();
        render_modal(f, area, app);
    }
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(state) = app.modal.as_ref() else { return };
    match state {
        ModalState::MemberActions { .. }
        | ModalState::EnrollGroups { .. }
        | ModalState::WithdrawGroups { .. }
        | ModalState::MemberAddInput { .. } => members::render_member_modal(f, area, app, state),
        ModalState::GroupsActions { .. }
        | ModalState::GroupAddInput { .. }
        | ModalState::GroupAddMembers { .. }
        | ModalState::GroupRemoveMembers { .. } => groups::render_group_modal(f, area, app, state),
        ModalState::Info { .. } => components::render_info_modal(f, area, app, state),
    }
}
