use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::AttendanceState;

use super::theme::Theme;

pub fn render_attendance_view(f: &mut Frame, state: &AttendanceState, area: Rect, theme: &Theme) {
    let Some(ref sheet) = state.sheet else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let lesson = sheet.lesson();
    let title = format!(
        "{} {} | {} keldi, {} kelmadi{}",
        lesson.start,
        lesson.subject,
        sheet.present_count(),
        sheet.absent_count(),
        if state.saving { " [saqlanmoqda]" } else { "" },
    );

    let items: Vec<ListItem> = sheet
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mark = if entry.came { "[+] keldi  " } else { "[-] kelmadi" };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:2}. ", i + 1), Style::default().fg(theme.text_muted())),
                Span::styled(mark, theme.mark_style(entry.came)),
                Span::raw("  "),
                Span::raw(entry.name.clone()),
            ]))
        })
        .collect();

    let roster = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme.border_style(!state.editing_photo)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    f.render_stateful_widget(
        roster,
        chunks[0],
        &mut ListState::default().with_selected(Some(state.selected)),
    );

    let photo_line = if state.editing_photo {
        Line::from(Span::styled(
            format!("{}_", state.photo_input),
            Style::default().fg(theme.warning()).add_modifier(Modifier::BOLD),
        ))
    } else {
        match sheet.photo() {
            Some(photo) => Line::from(vec![
                Span::styled(photo.file_name.clone(), Style::default().fg(theme.success())),
                Span::styled(
                    format!("  ({})", photo.path.display()),
                    Style::default().fg(theme.text_muted()),
                ),
            ]),
            None => Line::from(Span::styled(
                "Davomatni saqlash uchun rasm oling ('p')",
                Style::default().fg(theme.text_disabled()),
            )),
        }
    };

    let photo = Paragraph::new(photo_line).block(
        Block::default()
            .title("Rasm")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.border_style(state.editing_photo)),
    );
    f.render_widget(photo, chunks[1]);
}
