use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::app::ViewMode;

use super::theme::Theme;

pub struct StatusBarState {
    pub view_mode: ViewMode,
    pub is_editing: bool,
    pub status_message: Option<(String, bool)>, // (message, is_error)
}

/// Key hints for each screen, as (key, description) pairs
fn hints(view_mode: ViewMode) -> &'static [(&'static str, &'static str)] {
    match view_mode {
        ViewMode::Login => &[("Tab", "field"), ("Enter", "login"), ("Esc", "quit")],
        ViewMode::Timetable => &[
            ("h/l", "day"),
            ("t", "today"),
            ("j/k", "move"),
            ("Enter", "attendance"),
            ("n", "new lesson"),
            ("r", "refresh"),
            ("L", "logout"),
            ("q", "quit"),
        ],
        ViewMode::Attendance => &[
            ("Space", "toggle"),
            ("a/A", "all present/absent"),
            ("p", "photo"),
            ("s", "save"),
            ("Esc", "back"),
        ],
        ViewMode::LessonForm => &[
            ("Tab", "field"),
            ("Up/Down", "option"),
            ("Enter", "pick"),
            ("Ctrl+s", "create"),
            ("Esc", "back"),
        ],
    }
}

pub fn render_status_bar(
    f: &mut Frame,
    state: &StatusBarState,
    area: ratatui::layout::Rect,
    theme: &Theme,
) {
    let status_bar = if let Some((ref msg, is_error)) = state.status_message {
        let color = if is_error { theme.error() } else { theme.warning() };
        Paragraph::new(Line::from(vec![
            Span::styled(
                if is_error { "XATO" } else { "INFO" },
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(": "),
            Span::styled(msg.as_str(), Style::default().fg(color)),
        ]))
    } else if state.is_editing {
        Paragraph::new(Line::from(vec![
            Span::styled(
                "INSERT",
                Style::default().fg(theme.warning()).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | "),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": confirm | "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": cancel"),
        ]))
    } else {
        let mut spans = vec![Span::styled(
            "NORMAL",
            Style::default().fg(theme.success()).add_modifier(Modifier::BOLD),
        )];
        for (key, description) in hints(state.view_mode) {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(*key, Style::default().add_modifier(Modifier::BOLD)));
            spans.push(Span::raw(format!(": {}", description)));
        }
        Paragraph::new(Line::from(spans))
    };

    let status_bar = status_bar.block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(status_bar, area);
}
