use chrono::{Days, Local, NaiveDate};

use davomat::attendance::AttendanceSheet;
use davomat::models::LessonView;

use super::{App, AttendanceState, ViewMode};

impl App {
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.snapshot.as_ref().map(|s| s.date)
    }

    pub fn shift_date(&mut self, days: i64) {
        let Some(date) = self.current_date() else {
            return;
        };
        let target = if days >= 0 {
            date.checked_add_days(Days::new(days as u64))
        } else {
            date.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        if let Some(target) = target {
            self.go_to_date(target);
        }
    }

    pub fn go_to_today(&mut self) {
        self.go_to_date(Local::now().date_naive());
    }

    fn go_to_date(&mut self, date: NaiveDate) {
        if let Some(ref sync) = self.sync {
            sync.set_date(date);
            self.timetable.selected = 0;
        }
    }

    pub fn refresh_lessons(&mut self) {
        if let Some(ref sync) = self.sync {
            sync.refresh();
            self.add_debug("Refresh requested".to_string());
        }
    }

    pub fn lessons(&self) -> &[LessonView] {
        self.snapshot
            .as_ref()
            .map(|s| s.lessons.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_lesson(&self) -> Option<&LessonView> {
        self.lessons().get(self.timetable.selected)
    }

    pub fn move_selection(&mut self, down: bool) {
        let len = self.lessons().len();
        if len == 0 {
            return;
        }
        self.timetable.selected = if down {
            (self.timetable.selected + 1).min(len - 1)
        } else {
            self.timetable.selected.saturating_sub(1)
        };
    }

    /// Load the selected lesson with its roster and switch to attendance.
    pub async fn open_attendance(&mut self) {
        let Some(lesson_id) = self.selected_lesson().map(|l| l.id) else {
            return;
        };

        self.add_debug(format!("Loading roster for lesson {}", lesson_id));
        let result = self.api.fetch_lesson(lesson_id).await;
        let sheet = result.and_then(|lesson| AttendanceSheet::from_lesson(&lesson));

        match sheet {
            Ok(sheet) => {
                self.add_debug(format!("Roster loaded: {} students", sheet.len()));
                self.attendance = AttendanceState {
                    sheet: Some(sheet),
                    ..AttendanceState::default()
                };
                self.view_mode = ViewMode::Attendance;
            }
            Err(e) => self.handle_api_error(e),
        }
    }
}
