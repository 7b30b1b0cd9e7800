//! Wire models for the timetable backend and the view models built from them.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::api::FileUpload;

const DEFAULT_LESSON_TYPE: &str = "Ma'ruza";
const MISSING: &str = "-";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonDetails {
    #[serde(default)]
    pub fakultet: Option<String>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub time_at: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    /// Lesson type label ("Ma'ruza", "Amaliy", "Seminar")
    #[serde(default)]
    pub build: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fakultet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// One student's presence on one lesson. `came` is `None` until marked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: u64,
    #[serde(default)]
    pub student_id: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_flag")]
    pub came: Option<bool>,
    #[serde(default)]
    pub student: Option<StudentRef>,
}

impl AttendanceRecord {
    pub fn student_name(&self, position: usize) -> String {
        self.student
            .as_ref()
            .and_then(|s| s.name.clone().or_else(|| s.full_name.clone()))
            .unwrap_or_else(|| {
                format!("Talaba #{}", self.student_id.unwrap_or(position as u64 + 1))
            })
    }
}

/// A scheduled class occurrence as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: u64,
    #[serde(default)]
    pub teacher_id: Option<u64>,
    #[serde(default)]
    pub group_id: Option<u64>,
    #[serde(default)]
    pub room_id: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub details: Option<LessonDetails>,
    #[serde(default)]
    pub group: Option<GroupRef>,
    #[serde(default)]
    pub room: Option<RoomRef>,
    #[serde(default)]
    pub attendances: Vec<AttendanceRecord>,
}

impl Lesson {
    fn details(&self) -> Option<&LessonDetails> {
        self.details.as_ref()
    }

    pub fn subject(&self) -> String {
        self.details()
            .and_then(|d| d.subject_name.clone())
            .or_else(|| self.subject_name.clone())
            .or_else(|| {
                self.group
                    .as_ref()
                    .and_then(|g| g.name.as_ref())
                    .map(|name| format!("{} darsi", name))
            })
            .unwrap_or_else(|| MISSING.to_string())
    }

    /// Time-slot label, e.g. "08:30-09:50"
    pub fn start(&self) -> String {
        self.details()
            .and_then(|d| d.time_at.clone().or_else(|| d.start.clone()))
            .unwrap_or_else(|| MISSING.to_string())
    }

    pub fn kind(&self) -> String {
        self.details()
            .and_then(|d| d.build.clone())
            .unwrap_or_else(|| DEFAULT_LESSON_TYPE.to_string())
    }

    pub fn group_name(&self) -> String {
        self.group
            .as_ref()
            .and_then(|g| g.name.clone())
            .or_else(|| self.group_id.map(|id| id.to_string()))
            .unwrap_or_default()
    }

    pub fn room_name(&self) -> String {
        self.room
            .as_ref()
            .and_then(|r| r.name.clone())
            .or_else(|| self.room_id.map(|id| id.to_string()))
            .unwrap_or_default()
    }

    pub fn faculty(&self) -> Option<String> {
        self.details()
            .and_then(|d| d.fakultet.clone())
            .or_else(|| self.room.as_ref().and_then(|r| r.fakultet.clone()))
    }
}

/// What the timetable list shows for one lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonView {
    pub id: u64,
    pub subject: String,
    pub kind: String,
    pub start: String,
    pub room: String,
    pub group: String,
    pub date: Option<NaiveDate>,
}

impl From<&Lesson> for LessonView {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            subject: lesson.subject(),
            kind: lesson.kind(),
            start: lesson.start(),
            room: lesson.room_name(),
            group: lesson.group_name(),
            date: lesson.date,
        }
    }
}

/// One page of `GET /teacher/lessons`.
#[derive(Debug, Clone, Default)]
pub struct LessonPage {
    pub lessons: Vec<Lesson>,
    pub total: usize,
}

/// Payload for `POST /teacher/lessons`.
#[derive(Debug, Clone, Serialize)]
pub struct NewLesson {
    pub group_id: u64,
    pub room_id: u64,
    pub date: NaiveDate,
    pub fakultet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_at: Option<String>,
    /// Lesson type label, sent as `build` to match `details.build`
    #[serde(rename = "build", skip_serializing_if = "Option::is_none")]
    pub lesson_type: Option<String>,
    #[serde(skip)]
    pub image: Option<FileUpload>,
}

/// One row of an attendance submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    pub attendance_id: u64,
    pub student_id: Option<u64>,
    pub came: bool,
}

/// Batch attendance submission for one lesson; the photo is mandatory.
#[derive(Debug, Clone)]
pub struct AttendanceSubmission {
    pub lesson_id: u64,
    pub marks: Vec<AttendanceMark>,
    pub photo: Option<FileUpload>,
}

/// Picker entry returned by the search endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOption {
    pub id: String,
    pub name: String,
    pub fakultet: Option<String>,
}

/// Accepts `YYYY-MM-DD` as well as full timestamps starting with a date.
fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let day = s.get(..10).unwrap_or(&s);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }))
}

/// Accepts `true`/`false`, `0`/`1`, `"0"`/`"1"` and `null`.
fn de_opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        Some(Value::String(s)) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
