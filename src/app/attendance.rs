use davomat::api::FileUpload;

use super::{App, AttendanceState, ViewMode};

impl App {
    pub fn toggle_selected_mark(&mut self) {
        let index = self.attendance.selected;
        if let Some(sheet) = self.attendance.sheet.as_mut() {
            sheet.toggle(index);
        }
    }

    pub fn mark_all(&mut self, came: bool) {
        if let Some(sheet) = self.attendance.sheet.as_mut() {
            sheet.mark_all(came);
        }
    }

    pub fn move_roster_selection(&mut self, down: bool) {
        let len = self.attendance.sheet.as_ref().map_or(0, |s| s.len());
        if len == 0 {
            return;
        }
        self.attendance.selected = if down {
            (self.attendance.selected + 1).min(len - 1)
        } else {
            self.attendance.selected.saturating_sub(1)
        };
    }

    pub fn begin_photo_entry(&mut self) {
        self.attendance.editing_photo = true;
        self.attendance.photo_input = self
            .attendance
            .sheet
            .as_ref()
            .and_then(|s| s.photo())
            .map(|p| p.path.display().to_string())
            .unwrap_or_default();
    }

    /// Attach the typed path as the class photo; a blank path removes it.
    pub fn confirm_photo(&mut self) {
        self.attendance.editing_photo = false;
        let path = self.attendance.photo_input.trim().to_string();
        let photo = (!path.is_empty()).then(|| FileUpload::from_path(&path));
        if let Some(sheet) = self.attendance.sheet.as_mut() {
            sheet.set_photo(photo);
        }
    }

    pub async fn submit_attendance(&mut self) {
        if self.attendance.saving {
            return;
        }
        let Some(submission) = self.attendance.sheet.as_ref().map(|s| s.submission()) else {
            return;
        };

        self.attendance.saving = true;
        let lesson_id = submission.lesson_id;
        let result = self.api.save_attendance(submission).await;
        self.attendance.saving = false;

        match result {
            Ok(message) => {
                self.add_debug(format!("Attendance saved for lesson {}", lesson_id));
                self.set_status_info(message);
                self.close_attendance();
                if let Some(ref sync) = self.sync {
                    sync.reload();
                }
            }
            Err(e) => self.handle_api_error(e),
        }
    }

    pub fn close_attendance(&mut self) {
        self.attendance = AttendanceState::default();
        self.view_mode = ViewMode::Timetable;
    }
}
