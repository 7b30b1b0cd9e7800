//! Attendance taking for one lesson.

use crate::api::FileUpload;
use crate::error::{ApiError, ApiResult};
use crate::models::{AttendanceMark, AttendanceSubmission, Lesson, LessonView};

pub const EMPTY_ROSTER_MESSAGE: &str = "Bu darsda talabalar ro'yxati topilmadi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub attendance_id: u64,
    pub student_id: Option<u64>,
    pub name: String,
    pub came: bool,
}

/// Marks for every student of a lesson, edited locally and submitted in
/// one batch together with a class photo.
#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    lesson: LessonView,
    entries: Vec<RosterEntry>,
    photo: Option<FileUpload>,
}

impl AttendanceSheet {
    /// Build the roster from a lesson fetched with its attendances.
    /// Students the server has not marked yet start as present.
    pub fn from_lesson(lesson: &Lesson) -> ApiResult<Self> {
        if lesson.attendances.is_empty() {
            return Err(ApiError::validation(EMPTY_ROSTER_MESSAGE));
        }

        let entries = lesson
            .attendances
            .iter()
            .enumerate()
            .map(|(i, record)| RosterEntry {
                attendance_id: record.id,
                student_id: record.student_id,
                name: record.student_name(i),
                came: record.came.unwrap_or(true),
            })
            .collect();

        Ok(Self {
            lesson: LessonView::from(lesson),
            entries,
            photo: None,
        })
    }

    pub fn lesson(&self) -> &LessonView {
        &self.lesson
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flip the mark at `index`, returning the new value.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let entry = self.entries.get_mut(index)?;
        entry.came = !entry.came;
        Some(entry.came)
    }

    /// Set the mark for one attendance record. Returns false for unknown ids.
    pub fn set(&mut self, attendance_id: u64, came: bool) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| e.attendance_id == attendance_id)
        {
            Some(entry) => {
                entry.came = came;
                true
            }
            None => false,
        }
    }

    pub fn mark_all(&mut self, came: bool) {
        for entry in &mut self.entries {
            entry.came = came;
        }
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.came).count()
    }

    pub fn absent_count(&self) -> usize {
        self.entries.len() - self.present_count()
    }

    pub fn set_photo(&mut self, photo: Option<FileUpload>) {
        self.photo = photo;
    }

    pub fn photo(&self) -> Option<&FileUpload> {
        self.photo.as_ref()
    }

    /// The photo is the only thing the teacher has to add before saving.
    pub fn can_submit(&self) -> bool {
        self.photo.is_some()
    }

    pub fn submission(&self) -> AttendanceSubmission {
        AttendanceSubmission {
            lesson_id: self.lesson.id,
            marks: self
                .entries
                .iter()
                .map(|e| AttendanceMark {
                    attendance_id: e.attendance_id,
                    student_id: e.student_id,
                    came: e.came,
                })
                .collect(),
            photo: self.photo.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lesson() -> Lesson {
        serde_json::from_value(json!({
            "id": 12,
            "details": {"subject_name": "Matematika", "time_at": "08:30-09:50"},
            "attendances": [
                {"id": 101, "student_id": 40, "came": 0, "student": {"name": "Aziz"}},
                {"id": 102, "student_id": 41, "came": null, "student": {"full_name": "Dilnoza K."}},
                {"id": 103, "came": true}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_roster_defaults_pending_to_present() {
        let sheet = AttendanceSheet::from_lesson(&lesson()).unwrap();

        let marks: Vec<bool> = sheet.entries().iter().map(|e| e.came).collect();
        assert_eq!(marks, vec![false, true, true]);
        assert_eq!(sheet.entries()[2].name, "Talaba #3");
        assert_eq!(sheet.present_count(), 2);
        assert_eq!(sheet.absent_count(), 1);
        assert_eq!(sheet.lesson().subject, "Matematika");
    }

    #[test]
    fn test_empty_roster_is_an_error() {
        let empty: Lesson = serde_json::from_value(json!({"id": 5, "attendances": []})).unwrap();
        let err = AttendanceSheet::from_lesson(&empty).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_ROSTER_MESSAGE);
    }

    #[test]
    fn test_toggle_set_and_mark_all() {
        let mut sheet = AttendanceSheet::from_lesson(&lesson()).unwrap();

        assert_eq!(sheet.toggle(0), Some(true));
        assert_eq!(sheet.toggle(9), None);
        assert!(sheet.set(103, false));
        assert!(!sheet.set(999, false));
        assert_eq!(sheet.absent_count(), 1);

        sheet.mark_all(false);
        assert_eq!(sheet.present_count(), 0);
    }

    #[test]
    fn test_submission_requires_photo() {
        let mut sheet = AttendanceSheet::from_lesson(&lesson()).unwrap();
        assert!(!sheet.can_submit());
        assert!(sheet.submission().photo.is_none());

        sheet.set_photo(Some(FileUpload::from_path("/tmp/class.jpg")));
        let submission = sheet.submission();
        assert!(sheet.can_submit());
        assert_eq!(submission.lesson_id, 12);
        assert_eq!(
            submission.marks[1],
            AttendanceMark {
                attendance_id: 102,
                student_id: Some(41),
                came: true,
            }
        );
        assert_eq!(submission.photo.unwrap().file_name, "class.jpg");
    }
}
