//! Groups screen rendering and modals.
//!
//! Contains the groups table, details panel, members list, and group-related
//! modal dialogs for creating groups and adding/removing members.
//!
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::{AppState, ModalState};
use crate::roster::GroupId;
use crate::ui::components::{centered_rect, render_menu, render_paged_table, render_pick_list};

/// Render the groups table and manage pagination state.
pub fn render_groups_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }
    let rows: Vec<Vec<String>> = app
        .groups
        .iter()
        .filter_map(|id| app.roster.group(*id))
        .map(|g| vec![g.name().to_string(), g.member_ids().len().to_string()])
        .collect();
    let title = match app.selected_group().and_then(|id| app.roster.group(id)) {
        Some(g) => format!("Groups - {}", g.name()),
        None => "Groups".to_string(),
    };
    let widths = [Constraint::Percentage(100), Constraint::Length(8)];
    render_paged_table(f, area, app, title, vec!["GROUP", "MEMBERS"], &widths, rows, Some(app.selected_group_index));
}

/// Render the selected group's summary details.
pub fn render_group_details(f: &mut Frame, area: Rect, app: &AppState) {
    let (name, members) = match app.selected_group().and_then(|id| app.roster.group(id)) {
        Some(g) => (g.name().to_string(), g.member_ids().len()),
        None => (String::new(), 0),
    };
    let text = format!("Group: {name}\nMembers: {members}");
    let p = Paragraph::new(text)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Group Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

/// Render the selected group's members in enrollment order.
pub fn render_group_members(f: &mut Frame, area: Rect, app: &AppState) {
    let rows: Vec<Vec<String>> = app
        .selected_group()
        .and_then(|id| app.roster.list_members(id).ok())
        .unwrap_or_default()
        .into_iter()
        .map(|m| vec![m.code().to_string(), m.name().to_string()])
        .collect();
    let widths = [Constraint::Length(10), Constraint::Percentage(100)];
    render_paged_table(f, area, app, "Group Members".to_string(), vec!["CODE", "NAME"], &widths, rows, None);
}

fn target_group(app: &AppState, target: Option<GroupId>) -> Option<GroupId> {
    target.or(app.selected_group())
}

/// Render group-related modal dialogs based on state.
pub fn render_group_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    match state {
        ModalState::GroupsActions { selected, .. } => {
            render_menu(f, area, app, "Group actions", &["Add member", "Remove member", "New group"], *selected);
        }
        ModalState::GroupAddInput { name } => {
            let rect = centered_rect(48, 7, area);
            let msg = format!("New group name:\n{}", name);
            let p = Paragraph::new(msg).block(
                Block::default()
                    .title("Create group")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
            f.render_widget(Clear, rect);
            f.render_widget(p, rect);
        }
        ModalState::GroupAddMembers { selected, target, .. } => {
            let group = target_group(app, *target);
            let name = group.and_then(|g| app.roster.group(g)).map(|g| g.name().to_string()).unwrap_or_default();
            let labels: Vec<String> = app
                .roster
                .member_ids()
                .filter_map(|id| app.roster.member(id))
                .map(|m| {
                    let already = group.is_some_and(|g| m.group_ids().contains(&g));
                    format!("{} {} ({})", if already { "[x]" } else { "[ ]" }, m.name(), m.code())
                })
                .collect();
            render_pick_list(f, area, app, format!("Add member to '{name}'"), &labels, *selected);
        }
        ModalState::GroupRemoveMembers { selected, target, .. } => {
            let group = target_group(app, *target).and_then(|g| app.roster.group(g));
            let name = group.map(|g| g.name().to_string()).unwrap_or_default();
            let labels: Vec<String> = group
                .map(|g| g.member_ids().to_vec())
                .unwrap_or_default()
                .into_iter()
                .filter_map(|id| app.roster.member(id))
                .map(|m| format!("{} ({})", m.name(), m.code()))
                .collect();
            render_pick_list(f, area, app, format!("Remove member from '{name}'"), &labels, *selected);
        }
        _ => {}
    }
}
