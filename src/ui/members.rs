//! Members screen: member table, details, "Member of" pane and member modals.
//!
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::{AppState, MembersFocus, ModalState};
use crate::ui::components::{centered_rect, render_menu, render_paged_table, render_pick_list};

pub fn render_members_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 { app.rows_per_page = body_height; }

    let rows: Vec<Vec<String>> = app
        .members
        .iter()
        .filter_map(|id| app.roster.member(*id))
        .map(|m| vec![m.code().to_string(), m.name().to_string(), m.group_ids().len().to_string()])
        .collect();
    let selected = (app.members_focus == MembersFocus::MembersList).then_some(app.selected_member_index);
    let widths = [Constraint::Length(10), Constraint::Percentage(100), Constraint::Length(7)];
    render_paged_table(f, area, app, "Members".to_string(), vec!["CODE", "NAME", "GROUPS"], &widths, rows, selected);
}

pub fn render_member_details(f: &mut Frame, area: Rect, app: &AppState) {
    let member = app.selected_member().and_then(|id| app.roster.member(id));
    let text = match member {
        Some(m) => format!("Name: {}\nCode: {}\nGroups: {}", m.name(), m.code(), m.group_ids().len()),
        None => "No member selected".to_string(),
    };
    let p = Paragraph::new(text).style(Style::default().fg(app.theme.text)).block(
        Block::default().title("Details").borders(Borders::ALL).border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, area);
}

pub fn render_member_groups(f: &mut Frame, area: Rect, app: &AppState) {
    let rows: Vec<Vec<String>> = app
        .selected_member_groups()
        .into_iter()
        .filter_map(|id| app.roster.group(id))
        .map(|g| vec![g.name().to_string(), g.member_ids().len().to_string()])
        .collect();
    let selected = (app.members_focus == MembersFocus::MemberOf).then_some(app.member_of_index);
    let widths = [Constraint::Percentage(100), Constraint::Length(8)];
    render_paged_table(f, area, app, "Member of".to_string(), vec!["GROUP", "MEMBERS"], &widths, rows, selected);
}

pub fn render_member_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let member_name = app
        .selected_member()
        .and_then(|id| app.roster.member(id))
        .map(|m| m.name().to_string())
        .unwrap_or_default();
    match state {
        ModalState::MemberActions { selected } => {
            render_menu(f, area, app, "Actions", &["Enroll in group", "Withdraw from group"], *selected);
        }
        ModalState::EnrollGroups { selected, .. } => {
            let labels: Vec<String> = app
                .roster
                .group_ids()
                .filter_map(|id| app.roster.group(id))
                .map(|g| format!("{} ({} members)", g.name(), g.member_ids().len()))
                .collect();
            render_pick_list(f, area, app, format!("Enroll '{member_name}' in"), &labels, *selected);
        }
        ModalState::WithdrawGroups { selected, .. } => {
            let labels: Vec<String> = app
                .selected_member_groups()
                .into_iter()
                .filter_map(|id| app.roster.group(id))
                .map(|g| g.name().to_string())
                .collect();
            render_pick_list(f, area, app, format!("Withdraw '{member_name}' from"), &labels, *selected);
        }
        ModalState::MemberAddInput { selected, code, name } => {
            let rect = centered_rect(50, 7, area);
            let marker = |idx: usize| if *selected == idx { "▶" } else { " " };
            let body = format!("{} Code: {}\n{} Name: {}\n\nTab: switch field  Enter: save", marker(0), code, marker(1), name);
            let p = Paragraph::new(body).block(
                Block::default().title("New member").borders(Borders::ALL).border_style(Style::default().fg(app.theme.border)),
            );
            f.render_widget(Clear, rect);
            f.render_widget(p, rect);
        }
        _ => {}
    }
}
