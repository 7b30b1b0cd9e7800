use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{LoginField, LoginState};

use super::theme::Theme;

pub fn render_login_view(f: &mut Frame, state: &LoginState, area: Rect, theme: &Theme) {
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 10.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Tizimga kirish ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.primary()));
    f.render_widget(block.clone(), popup_area);

    let inner = block.inner(popup_area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let masked = "*".repeat(state.password.chars().count());
    render_input(f, "Login", &state.username, state.field == LoginField::Username, chunks[0], theme);
    render_input(f, "Parol", &masked, state.field == LoginField::Password, chunks[1], theme);

    let help = if state.submitting { "Kirilmoqda..." } else { "Enter: kirish | Tab: maydon | Esc: chiqish" };
    let help = Paragraph::new(help)
        .style(Style::default().fg(theme.text_disabled()))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);
}

fn render_input(f: &mut Frame, label: &str, value: &str, focused: bool, area: Rect, theme: &Theme) {
    let text = if focused { format!("{}_", value) } else { value.to_string() };
    let style = if focused {
        Style::default().fg(theme.warning()).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let input = Paragraph::new(text).style(style).block(
        Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(theme.border_style(focused)),
    );
    f.render_widget(input, area);
}
