use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{FormField, LessonFormState};

use super::theme::Theme;
use super::timetable::format_day;

pub struct LessonFormViewState<'a> {
    pub state: &'a LessonFormState,
    pub date: Option<chrono::NaiveDate>,
}

pub fn render_lesson_form_view(f: &mut Frame, view: &LessonFormViewState, area: Rect, theme: &Theme) {
    let state = view.state;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let lines: Vec<Line> = FormField::ALL
        .iter()
        .map(|&field| {
            let focused = field == state.field;
            let label_style = if focused {
                theme.highlight_style()
            } else {
                Style::default().fg(theme.text_muted())
            };

            let mut spans = vec![Span::styled(format!("{:<10} ", field.label()), label_style)];
            match state.selection(field) {
                Some(value) => spans.push(Span::styled(value, Style::default().fg(theme.success()))),
                None => spans.push(Span::styled("-", Style::default().fg(theme.text_disabled()))),
            }

            let input = field_input(state, field);
            if focused && (field.is_lookup() || field == FormField::Image) {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    format!("{}_", input),
                    Style::default().fg(theme.warning()).add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        })
        .collect();

    let title = match view.date {
        Some(date) => format!("Yangi dars: {}", format_day(date)),
        None => "Yangi dars".to_string(),
    };
    let title = if state.submitting {
        format!("{} [saqlanmoqda]", title)
    } else {
        title
    };

    let fields = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.border_style(true)),
    );
    f.render_widget(fields, chunks[0]);

    render_options(f, state, chunks[1], theme);
}

fn field_input(state: &LessonFormState, field: FormField) -> &str {
    match field {
        FormField::Room => state.form.room.query.as_str(),
        FormField::Group => state.form.group.query.as_str(),
        FormField::Subject => state.form.subject.query.as_str(),
        FormField::Image => state.image_path.as_str(),
        _ => "",
    }
}

fn render_options(f: &mut Frame, state: &LessonFormState, area: Rect, theme: &Theme) {
    let searching = match state.field {
        FormField::Room => state.form.room.searching,
        FormField::Group => state.form.group.searching,
        FormField::Subject => state.form.subject.searching,
        _ => false,
    };

    let block = Block::default()
        .title(format!(
            "{}{}",
            state.field.label(),
            if searching { " [qidirilmoqda]" } else { "" }
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style(false));

    if state.field == FormField::Image {
        let hint = Paragraph::new("Rasm fayli yo'lini kiriting (ixtiyoriy)")
            .style(Style::default().fg(theme.text_disabled()))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(hint, area);
        return;
    }

    let names = state.option_names();
    if names.is_empty() {
        let empty = Paragraph::new("Hech narsa topilmadi")
            .style(Style::default().fg(theme.text_disabled()))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = names.into_iter().map(ListItem::new).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(theme.highlight_style())
        .highlight_symbol("> ");

    f.render_stateful_widget(
        list,
        area,
        &mut ListState::default().with_selected(Some(state.option_index)),
    );
}
