use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::{ApiClient, RequestBody};
use crate::error::{ApiError, ApiResult};
use crate::models::{Lesson, LessonPage, NewLesson};
use crate::sync::LessonBackend;

const LESSONS_PATH: &str = "/teacher/lessons";

#[derive(Debug, Default, Deserialize)]
struct LessonsData {
    #[serde(default)]
    lessons: Vec<Lesson>,
    #[serde(default)]
    total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LessonData {
    lesson: Lesson,
}

impl ApiClient {
    /// Lessons scheduled for `date`.
    pub async fn fetch_lessons(&self, date: NaiveDate) -> ApiResult<LessonPage> {
        let query = RequestBody::new().field("date", date.format("%Y-%m-%d").to_string());
        let data: Option<LessonsData> = self.get(LESSONS_PATH, Some(query), true).await?;
        let data = data.unwrap_or_default();

        let total = data.total.unwrap_or(data.lessons.len());
        tracing::debug!("Fetched {} lessons for {}", data.lessons.len(), date);
        Ok(LessonPage {
            lessons: data.lessons,
            total,
        })
    }

    pub async fn fetch_lesson(&self, id: u64) -> ApiResult<Lesson> {
        let data: LessonData = self
            .get(&format!("{}/{}", LESSONS_PATH, id), None, true)
            .await?;
        Ok(data.lesson)
    }

    /// Create a lesson. With an image attached the request goes out as
    /// multipart and needs a stored token.
    pub async fn create_lesson(&self, lesson: NewLesson) -> ApiResult<Lesson> {
        let mut body = RequestBody::from_serialize(&lesson)?;

        if let Some(image) = lesson.image {
            image.ensure_readable().await?;
            if !self.session().is_logged_in().await {
                return Err(ApiError::AuthMissing);
            }
            body = body.file("image", image);
        }

        let data: LessonData = self.post(LESSONS_PATH, Some(body), true).await?;
        tracing::info!("Created lesson {}", data.lesson.id);
        Ok(data.lesson)
    }
}

#[async_trait]
impl LessonBackend for ApiClient {
    async fn fetch_lessons(&self, date: NaiveDate) -> ApiResult<Vec<Lesson>> {
        ApiClient::fetch_lessons(self, date)
            .await
            .map(|page| page.lessons)
    }

    async fn create_lesson(&self, lesson: NewLesson) -> ApiResult<Lesson> {
        ApiClient::create_lesson(self, lesson).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::spawn;
    use crate::api::FileUpload;
    use crate::session::{MemoryTokenStore, Session};
    use axum::extract::{Multipart, Path, Query};
    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Map, Value};
    use std::collections::HashMap;
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

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 24).unwrap()
    }

    fn new_lesson() -> NewLesson {
        NewLesson {
            group_id: 5,
            room_id: 2,
            date: day(),
            fakultet: "A".to_string(),
            subject_name: Some("Matematika".to_string()),
            time_at: Some("08:30-09:50".to_string()),
            lesson_type: Some("Amaliy".to_string()),
            image: None,
        }
    }

    async fn list(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let date = params.get("date").cloned().unwrap_or_default();
        Json(json!({
            "success": true,
            "data": {
                "lessons": [
                    {"id": 1, "date": date, "details": {"time_at": "10:00-11:20"}},
                    {"id": 2, "date": date, "details": {"time_at": "08:30-09:50"}}
                ]
            }
        }))
    }

    async fn detail(Path(id): Path<u64>) -> Json<Value> {
        Json(json!({
            "success": true,
            "data": {"lesson": {"id": id, "attendances": [{"id": 9, "came": null}]}}
        }))
    }

    #[tokio::test]
    async fn test_fetch_lessons_for_date() {
        let base = spawn(
            Router::new()
                .route("/teacher/lessons", get(list))
                .route("/teacher/lessons/:id", get(detail)),
        )
        .await;
        let api = client(&base, authed_session());

        let page = api.fetch_lessons(day()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.lessons[0].id, 1);
        assert_eq!(page.lessons[1].date, Some(day()));

        let lesson = api.fetch_lesson(77).await.unwrap();
        assert_eq!(lesson.id, 77);
        assert_eq!(lesson.attendances.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_lessons_uses_reported_total() {
        async fn paged() -> Json<Value> {
            Json(json!({"success": true, "data": {"lessons": [{"id": 3}], "total": 14}}))
        }
        let base = spawn(Router::new().route("/teacher/lessons", get(paged))).await;
        let api = client(&base, authed_session());

        let page = api.fetch_lessons(day()).await.unwrap();
        assert_eq!(page.lessons.len(), 1);
        assert_eq!(page.total, 14);
    }

    #[tokio::test]
    async fn test_create_lesson_json() {
        async fn create(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(
                headers.get("authorization").and_then(|v| v.to_str().ok()),
                Some("Bearer tok")
            );
            Json(json!({
                "success": true,
                "data": {"lesson": {
                    "id": 31,
                    "group_id": body["group_id"],
                    "room_id": body["room_id"],
                    "date": body["date"],
                    "details": {
                        "fakultet": body["fakultet"],
                        "subject_name": body["subject_name"],
                        "time_at": body["time_at"],
                        "build": body["build"]
                    }
                }}
            }))
        }
        let base = spawn(Router::new().route("/teacher/lessons", get(list).post(create))).await;
        let api = client(&base, authed_session());

        let lesson = api.create_lesson(new_lesson()).await.unwrap();
        assert_eq!(lesson.id, 31);
        assert_eq!(lesson.subject(), "Matematika");
        assert_eq!(lesson.start(), "08:30-09:50");
        assert_eq!(lesson.kind(), "Amaliy");
        assert_eq!(lesson.date, Some(day()));
    }

    #[tokio::test]
    async fn test_create_lesson_with_image_is_multipart() {
        async fn create(mut multipart: Multipart) -> Json<Value> {
            let mut fields = Map::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                let file_name = field.file_name().map(str::to_string);
                let value = match file_name {
                    Some(file_name) => Value::String(format!("file:{}", file_name)),
                    None => Value::String(field.text().await.unwrap()),
                };
                fields.insert(name, value);
            }
            Json(json!({"success": true, "data": {"lesson": {"id": 32, "image": fields["image"], "room_id": 2}}}))
        }

        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("board.jpg");
        std::fs::write(&photo, b"\xff\xd8\xff").unwrap();

        let base = spawn(Router::new().route("/teacher/lessons", get(list).post(create))).await;
        let api = client(&base, authed_session());

        let mut payload = new_lesson();
        payload.image = Some(FileUpload::from_path(&photo));
        let lesson = api.create_lesson(payload).await.unwrap();

        assert_eq!(lesson.id, 32);
        assert_eq!(lesson.image.as_deref(), Some("file:board.jpg"));
    }

    #[tokio::test]
    async fn test_create_lesson_with_image_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("board.jpg");
        std::fs::write(&photo, b"\xff\xd8\xff").unwrap();

        let api = client("http://127.0.0.1:9", Session::in_memory());
        let mut payload = new_lesson();
        payload.image = Some(FileUpload::from_path(&photo));

        assert_eq!(
            api.create_lesson(payload).await.unwrap_err(),
            ApiError::AuthMissing
        );
    }
}
