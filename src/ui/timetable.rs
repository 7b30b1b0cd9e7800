use chrono::{Datelike, NaiveDate, Weekday};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use davomat::sync::SyncSnapshot;

use super::theme::Theme;

pub const EMPTY_DAY_MESSAGE: &str = "Bugun darslar yo'q";
pub const FETCH_ERROR_MESSAGE: &str = "Darslarni yuklashda xatolik";
const LOADING_MESSAGE: &str = "Yuklanmoqda...";

pub struct TimetableViewState<'a> {
    pub snapshot: &'a SyncSnapshot,
    pub selected: usize,
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Dushanba",
        Weekday::Tue => "Seshanba",
        Weekday::Wed => "Chorshanba",
        Weekday::Thu => "Payshanba",
        Weekday::Fri => "Juma",
        Weekday::Sat => "Shanba",
        Weekday::Sun => "Yakshanba",
    }
}

/// e.g. "24.11.2025, Dushanba"
pub fn format_day(date: NaiveDate) -> String {
    format!("{}, {}", date.format("%d.%m.%Y"), weekday_name(date.weekday()))
}

pub fn render_timetable_view(f: &mut Frame, state: &TimetableViewState, area: Rect, theme: &Theme) {
    let snapshot = state.snapshot;

    let mut title = format!("{} ({} dars)", format_day(snapshot.date), snapshot.lessons.len());
    if snapshot.refreshing {
        title.push_str(" [yangilanmoqda]");
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.primary()));

    // Full-screen states replace the list entirely
    let placeholder = if snapshot.loading && snapshot.is_empty() {
        Some((LOADING_MESSAGE.to_string(), theme.text_muted()))
    } else if let Some(ref error) = snapshot.error {
        let message = if error.trim().is_empty() {
            FETCH_ERROR_MESSAGE.to_string()
        } else {
            format!("{}\n\n'r' - qayta urinish", error)
        };
        Some((message, theme.error()))
    } else if snapshot.is_empty() {
        Some((EMPTY_DAY_MESSAGE.to_string(), theme.text_disabled()))
    } else {
        None
    };

    if let Some((message, color)) = placeholder {
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = snapshot
        .lessons
        .iter()
        .map(|lesson| {
            let mut spans = vec![
                Span::styled(
                    format!("{:<12}", lesson.start),
                    Style::default().fg(theme.primary()).add_modifier(Modifier::BOLD),
                ),
                Span::raw(lesson.subject.clone()),
                Span::styled(
                    format!("  [{}]", lesson.kind),
                    Style::default().fg(theme.text_muted()),
                ),
            ];
            if !lesson.room.is_empty() {
                spans.push(Span::raw(format!("  xona {}", lesson.room)));
            }
            if !lesson.group.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", lesson.group),
                    Style::default().fg(theme.text_muted()),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.highlight_style())
        .highlight_symbol("> ");

    f.render_stateful_widget(
        list,
        area,
        &mut ListState::default().with_selected(Some(state.selected)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_day() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 24).unwrap();
        assert_eq!(format_day(date), "24.11.2025, Dushanba");

        let sunday = NaiveDate::from_ymd_opt(2025, 11, 30).unwrap();
        assert_eq!(weekday_name(sunday.weekday()), "Yakshanba");
    }
}
