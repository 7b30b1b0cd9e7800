use serde::Deserialize;

use super::{ApiClient, RequestBody};
use crate::error::{ApiError, ApiResult};
use crate::models::AttendanceSubmission;

pub const PHOTO_REQUIRED_MESSAGE: &str = "Davomatni saqlash uchun rasm oling";
const EMPTY_ROSTER_MESSAGE: &str = "Saqlash uchun talabalar yo'q";

#[derive(Debug, Default, Deserialize)]
struct SavedData {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// Submit all marks for one lesson together with the class photo.
    ///
    /// Everything that can be checked locally is checked before the request
    /// is built: the photo must be present and readable, a token must be
    /// stored and there must be at least one mark.
    pub async fn save_attendance(&self, submission: AttendanceSubmission) -> ApiResult<String> {
        let photo = submission
            .photo
            .ok_or_else(|| ApiError::validation(PHOTO_REQUIRED_MESSAGE))?;
        photo.ensure_readable().await?;

        if !self.session().is_logged_in().await {
            return Err(ApiError::AuthMissing);
        }
        if submission.marks.is_empty() {
            return Err(ApiError::validation(EMPTY_ROSTER_MESSAGE));
        }

        let mut body = RequestBody::new();
        for (i, mark) in submission.marks.iter().enumerate() {
            body = body.field(format!("attendances[{}][attendance_id]", i), mark.attendance_id);
            if let Some(student_id) = mark.student_id {
                body = body.field(format!("attendances[{}][student_id]", i), student_id);
            }
            body = body.field(
                format!("attendances[{}][came]", i),
                if mark.came { "1" } else { "0" },
            );
        }
        let body = body.file("image", photo);

        let path = format!("/teacher/lessons/{}", submission.lesson_id);
        let data: Option<SavedData> = self.post(&path, Some(body), true).await?;

        tracing::info!(
            "Saved attendance for lesson {} ({} marks)",
            submission.lesson_id,
            submission.marks.len()
        );
        Ok(data
            .and_then(|d| d.message)
            .unwrap_or_else(|| "Davomat saqlandi".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::spawn;
    use crate::api::FileUpload;
    use crate::models::AttendanceMark;
    use crate::session::{MemoryTokenStore, Session};
    use axum::extract::{Multipart, Path, State};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn client(base_url: &str, session: Session) -> ApiClient {
        ApiClient::with_timeouts(
            base_url,
            session,
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn authed_session() -> Session {
        Session::new(Arc::new(MemoryTokenStore::with_token("tok")))
    }

    fn marks() -> Vec<AttendanceMark> {
        vec![
            AttendanceMark {
                attendance_id: 101,
                student_id: Some(40),
                came: true,
            },
            AttendanceMark {
                attendance_id: 102,
                student_id: None,
                came: false,
            },
        ]
    }

    async fn counting_server(hits: Arc<AtomicUsize>) -> String {
        async fn save(
            State(hits): State<Arc<AtomicUsize>>,
            Path(id): Path<u64>,
            mut multipart: Multipart,
        ) -> Json<Value> {
            hits.fetch_add(1, Ordering::SeqCst);
            let mut fields = Map::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                let file_name = field.file_name().map(str::to_string);
                let value = match file_name {
                    Some(file_name) => format!("file:{}", file_name),
                    None => field.text().await.unwrap(),
                };
                fields.insert(name, Value::String(value));
            }
            assert!(fields.contains_key("image"));
            Json(json!({"success": true, "data": {"message": format!("saved {}", id)}}))
        }

        spawn(
            Router::new()
                .route("/teacher/lessons/:id", post(save))
                .with_state(hits),
        )
        .await
    }

    #[tokio::test]
    async fn test_missing_photo_rejected_before_network() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = counting_server(hits.clone()).await;
        let api = client(&base, authed_session());

        let err = api
            .save_attendance(AttendanceSubmission {
                lesson_id: 12,
                marks: marks(),
                photo: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::validation(PHOTO_REQUIRED_MESSAGE));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_photo_and_missing_token() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = counting_server(hits.clone()).await;
        let dir = tempfile::tempdir().unwrap();

        let api = client(&base, authed_session());
        let err = api
            .save_attendance(AttendanceSubmission {
                lesson_id: 12,
                marks: marks(),
                photo: Some(FileUpload::from_path(dir.path().join("gone.jpg"))),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let photo = dir.path().join("class.jpg");
        std::fs::write(&photo, b"\xff\xd8\xff").unwrap();
        let anonymous = client(&base, Session::in_memory());
        let err = anonymous
            .save_attendance(AttendanceSubmission {
                lesson_id: 12,
                marks: marks(),
                photo: Some(FileUpload::from_path(&photo)),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::AuthMissing);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submission_form_fields() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = counting_server(hits.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("class.jpg");
        std::fs::write(&photo, b"\xff\xd8\xff").unwrap();

        let api = client(&base, authed_session());
        let message = api
            .save_attendance(AttendanceSubmission {
                lesson_id: 12,
                marks: marks(),
                photo: Some(FileUpload::from_path(&photo)),
            })
            .await
            .unwrap();

        assert_eq!(message, "saved 12");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_indexed_field_names() {
        async fn echo(mut multipart: Multipart) -> Json<Value> {
            let mut fields = Map::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                let file_name = field.file_name().map(str::to_string);
                let value = match file_name {
                    Some(file_name) => format!("file:{}", file_name),
                    None => field.text().await.unwrap(),
                };
                fields.insert(name, Value::String(value));
            }
            Json(json!({"success": true, "data": {"message": Value::Object(fields).to_string()}}))
        }
        let base = spawn(Router::new().route("/teacher/lessons/:id", post(echo))).await;
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("class.png");
        std::fs::write(&photo, [0u8; 8]).unwrap();

        let api = client(&base, authed_session());
        let echoed = api
            .save_attendance(AttendanceSubmission {
                lesson_id: 3,
                marks: marks(),
                photo: Some(FileUpload::from_path(&photo)),
            })
            .await
            .unwrap();

        let fields: Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(fields["attendances[0][attendance_id]"], "101");
        assert_eq!(fields["attendances[0][student_id]"], "40");
        assert_eq!(fields["attendances[0][came]"], "1");
        assert_eq!(fields["attendances[1][attendance_id]"], "102");
        assert!(fields.get("attendances[1][student_id]").is_none());
        assert_eq!(fields["attendances[1][came]"], "0");
        assert_eq!(fields["image"], "file:class.png");
    }
}
