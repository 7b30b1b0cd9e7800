use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, ViewMode};

pub enum KeyAction {
    Continue,
    Quit,
}

pub async fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    // Windows terminals report releases too
    if key.kind == KeyEventKind::Release {
        return KeyAction::Continue;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    match app.view_mode {
        ViewMode::Login => handle_login_input(app, key).await,
        ViewMode::Timetable => handle_timetable(app, key).await,
        ViewMode::Attendance => handle_attendance(app, key).await,
        ViewMode::LessonForm => handle_lesson_form(app, key).await,
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => app.login.next_field(),
        KeyCode::Enter => app.login().await,
        KeyCode::Backspace => {
            app.login.input_mut().pop();
        }
        KeyCode::Char(c) => app.login.input_mut().push(c),
        _ => {}
    }
    KeyAction::Continue
}

async fn handle_timetable(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(true),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(false),
        KeyCode::Char('h') | KeyCode::Left => app.shift_date(-1),
        KeyCode::Char('l') | KeyCode::Right => app.shift_date(1),
        KeyCode::Char('t') => app.go_to_today(),
        KeyCode::Char('r') => app.refresh_lessons(),
        KeyCode::Enter => app.open_attendance().await,
        KeyCode::Char('n') => app.open_lesson_form().await,
        KeyCode::Char('L') => app.logout().await,
        KeyCode::Char('d') => app.show_debug = !app.show_debug,
        KeyCode::Char('c') => app.debug_log.clear(),
        _ => {}
    }
    KeyAction::Continue
}

async fn handle_attendance(app: &mut App, key: KeyEvent) -> KeyAction {
    if app.attendance.editing_photo {
        match key.code {
            KeyCode::Enter => app.confirm_photo(),
            KeyCode::Esc => app.attendance.editing_photo = false,
            KeyCode::Backspace => {
                app.attendance.photo_input.pop();
            }
            KeyCode::Char(c) => app.attendance.photo_input.push(c),
            _ => {}
        }
        return KeyAction::Continue;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_attendance(),
        KeyCode::Char('j') | KeyCode::Down => app.move_roster_selection(true),
        KeyCode::Char('k') | KeyCode::Up => app.move_roster_selection(false),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_mark(),
        KeyCode::Char('a') => app.mark_all(true),
        KeyCode::Char('A') => app.mark_all(false),
        KeyCode::Char('p') => app.begin_photo_entry(),
        KeyCode::Char('s') => app.submit_attendance().await,
        KeyCode::Char('d') => app.show_debug = !app.show_debug,
        _ => {}
    }
    KeyAction::Continue
}

async fn handle_lesson_form(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s') {
            app.submit_lesson_form().await;
        }
        return KeyAction::Continue;
    }

    let accepts_text = app.is_editing();
    match key.code {
        KeyCode::Esc => app.close_lesson_form(),
        KeyCode::Tab => {
            let next = app.lesson_form.field.next();
            app.lesson_form.focus(next);
        }
        KeyCode::BackTab => {
            let prev = app.lesson_form.field.prev();
            app.lesson_form.focus(prev);
        }
        KeyCode::Down => app.lesson_form.move_option(true),
        KeyCode::Up => app.lesson_form.move_option(false),
        KeyCode::Enter => app.form_confirm_field(),
        KeyCode::Backspace if accepts_text => app.form_pop_char(),
        KeyCode::Char(c) if accepts_text => app.form_push_char(c),
        KeyCode::Char('j') => app.lesson_form.move_option(true),
        KeyCode::Char('k') => app.lesson_form.move_option(false),
        _ => {}
    }
    KeyAction::Continue
}
