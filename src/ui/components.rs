//! Shared UI components (status bar, modal helpers).
//!
//! Contains small building blocks reused by the members/groups screens.
//!
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, InputMode, ModalState};

/// Render the bottom status bar with mode and counts.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::SearchMembers => "SEARCH(members)",
        InputMode::SearchGroups => "SEARCH(groups)",
        InputMode::Modal => "MODAL",
    };
    let saving = match &app.store {
        Some(store) => format!("  saving to {}", store.groups_path.display()),
        None => "  in-memory".to_string(),
    };
    let msg = format!(
        "mode: {mode}  members:{}/{}  groups:{}/{}{}",
        app.members.len(),
        app.roster.member_count(),
        app.groups.len(),
        app.roster.group_count(),
        saving
    );
    let p = Paragraph::new(msg).style(Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg));
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// First row of a page of `rows` that keeps `selected` visible.
pub fn page_start(selected: usize, rows: usize) -> usize {
    let rows = rows.max(1);
    (selected / rows) * rows
}

/// Render a table page around `selected`, highlighting it when `focused`.
pub fn render_paged_table(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    title: String,
    header: Vec<&str>,
    widths: &[Constraint],
    rows: Vec<Vec<String>>,
    selected: Option<usize>,
) {
    let per_page = (area.height.saturating_sub(3) as usize).max(1);
    let start = page_start(selected.unwrap_or(0), per_page);
    let end = (start + per_page).min(rows.len());
    let body = rows.get(start..end).unwrap_or_default().iter().enumerate().map(|(i, cells)| {
        let style = if Some(start + i) == selected {
            Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(cells.clone()).style(style)
    });
    let header = Row::new(header).style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));
    let table = Table::new(body, widths.to_vec())
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);
    f.render_widget(table, area);
}

/// Render a small menu with a `▶` marker on the selected option.
pub fn render_menu(f: &mut Frame, area: Rect, app: &AppState, title: &str, options: &[&str], selected: usize) {
    let width = options.iter().map(|o| o.len() as u16).max().unwrap_or(0).max(title.len() as u16) + 8;
    let rect = centered_rect(width, options.len() as u16 + 4, area);
    let mut text = String::new();
    for (idx, label) in options.iter().enumerate() {
        if idx == selected {
            text.push_str(&format!("▶ {}\n", label));
        } else {
            text.push_str(&format!("  {}\n", label));
        }
    }
    let p = Paragraph::new(text).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Render a scrolling pick list centered in `area`.
pub fn render_pick_list(f: &mut Frame, area: Rect, app: &AppState, title: String, labels: &[String], selected: usize) {
    let width = (area.width.saturating_sub(10)).clamp(40, 60);
    let height = (area.height.saturating_sub(6)).clamp(8, 20);
    let rect = centered_rect(width, height, area);
    let visible = rect.height.saturating_sub(2) as usize;
    let total = labels.len();
    let start = selected.saturating_sub(visible / 2).min(total.saturating_sub(visible));
    let end = (start + visible).min(total);
    let items: Vec<ListItem> = labels[start..end]
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let focus = if start + i == selected { "▶ " } else { "  " };
            ListItem::new(format!("{focus}{label}"))
        })
        .collect();
    let body: Vec<ListItem> = if items.is_empty() { vec![ListItem::new("  (nothing to pick)")] } else { items };
    let list = List::new(body).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(list, rect);
}

/// Render a generic informational modal dialog.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { message } = state {
        let max_w = area.width.saturating_sub(6).max(30);
        let min_w = 40u16.min(max_w);
        let approx_lines = (message.len() as u16 / (min_w.saturating_sub(4).max(10))).max(1);
        let max_h = area.height.saturating_sub(6).max(5);
        let height = (approx_lines + 4).min(max_h).max(5);
        let rect = centered_rect(min_w, height, area);
        let p = Paragraph::new(message.clone())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Info")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}
