use crate::app::{AppState, InputMode};
use crate::roster::{GroupId, MemberId, Roster};

fn member_matches(roster: &Roster, id: MemberId, q: &str) -> bool {
    let Some(m) = roster.member(id) else { return false };
    m.name().to_lowercase().contains(q)
        || m.code().to_lowercase().contains(q)
        || m.group_ids()
            .iter()
            .filter_map(|g| roster.group(*g))
            .any(|g| g.name().to_lowercase().contains(q))
}

fn group_matches(roster: &Roster, id: GroupId, q: &str) -> bool {
    let Some(g) = roster.group(id) else { return false };
    g.name().to_lowercase().contains(q)
        || g.member_ids()
            .iter()
            .filter_map(|m| roster.member(*m))
            .any(|m| m.name().to_lowercase().contains(q) || m.code().to_lowercase().contains(q))
}

pub fn apply_search(app: &mut AppState) {
    let q = app.search_query.to_lowercase();
    match app.input_mode {
        InputMode::SearchMembers => {
            app.members = app
                .roster
                .member_ids()
                .filter(|id| q.is_empty() || member_matches(&app.roster, *id, &q))
                .collect();
            app.selected_member_index = 0;
        }
        InputMode::SearchGroups => {
            app.groups = app
                .roster
                .group_ids()
                .filter(|id| q.is_empty() || group_matches(&app.roster, *id, &q))
                .collect();
            app.selected_group_index = 0;
        }
        InputMode::Normal | InputMode::Modal => {}
    }
}
