use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiClient, RequestBody};
use crate::error::{ApiError, ApiResult};

/// `data` of the login and register responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthData {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

impl AuthData {
    pub fn bearer(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or(self.access_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub phone: String,
    pub login: String,
    pub password: String,
    pub password_confirmation: String,
}

impl Registration {
    fn validate(&self) -> ApiResult<()> {
        let fields = [&self.name, &self.phone, &self.login, &self.password];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ApiError::validation("Iltimos, barcha maydonlarni to'ldiring!"));
        }
        if self.password != self.password_confirmation {
            return Err(ApiError::validation("Parollar mos kelmadi"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: String,
}

impl PasswordChange {
    fn validate(&self) -> ApiResult<()> {
        if self.current_password.is_empty() || self.password.is_empty() {
            return Err(ApiError::validation("Parolni kiriting"));
        }
        if self.password != self.password_confirmation {
            return Err(ApiError::validation("Parollar mos kelmadi"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct MessageData {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// Log in and persist the returned token. Nothing is stored on failure.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthData> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(ApiError::validation("Login va parolni to'ldiring"));
        }

        let body = RequestBody::new()
            .field("username", username.trim())
            .field("password", password);
        let data: AuthData = self.post("/login", Some(body), false).await?;

        let token = data.bearer().ok_or_else(|| {
            tracing::warn!("Login succeeded but no token in response");
            ApiError::Decode
        })?;
        self.session()
            .save(token)
            .await
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        tracing::info!("Logged in as {}", username.trim());
        Ok(data)
    }

    /// Tell the backend, then forget the token regardless of the outcome.
    pub async fn logout(&self) -> ApiResult<()> {
        if self.session().is_logged_in().await {
            if let Err(e) = self.post::<Value>("/logout", None, true).await {
                tracing::warn!("Logout request failed: {}", e);
            }
        }
        self.session().clear().await;
        Ok(())
    }

    /// Submit a registration request; returns the server's confirmation text.
    pub async fn register(&self, registration: &Registration) -> ApiResult<String> {
        registration.validate()?;

        let body = RequestBody::from_serialize(registration)?;
        let data: AuthData = self.post("/register", Some(body), false).await?;

        if let Some(token) = data.bearer() {
            self.session()
                .save(token)
                .await
                .map_err(|e| ApiError::Storage(e.to_string()))?;
        }

        Ok(data
            .message
            .unwrap_or_else(|| "Muvaffaqiyatli ro'yxatdan o'tdingiz!".to_string()))
    }

    pub async fn change_password(&self, change: &PasswordChange) -> ApiResult<String> {
        change.validate()?;

        let body = RequestBody::from_serialize(change)?;
        let data: Option<MessageData> = self.post("/change-password", Some(body), true).await?;

        Ok(data
            .and_then(|d| d.message)
            .unwrap_or_else(|| "Parol o'zgartirildi".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::spawn;
    use crate::session::{MemoryTokenStore, Session};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
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

    fn unreachable_base() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    async fn login_handler(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["username"] == "teacher" && body["password"] == "1" {
            (
                StatusCode::OK,
                Json(json!({"success": true, "data": {"token": "tok-42", "user": {"id": 1}}})),
            )
        } else {
            (
                StatusCode::OK,
                Json(json!({"success": false, "data": {"message": "Login yoki parol noto'g'ri"}})),
            )
        }
    }

    #[tokio::test]
    async fn test_login_saves_token() {
        let base = spawn(Router::new().route("/login", post(login_handler))).await;
        let session = Session::in_memory();
        let api = client(&base, session.clone());

        let data = api.login(" teacher ", "1").await.unwrap();

        assert_eq!(data.bearer(), Some("tok-42"));
        assert_eq!(session.token().await.as_deref(), Some("tok-42"));
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_message_and_stores_nothing() {
        let base = spawn(Router::new().route("/login", post(login_handler))).await;
        let session = Session::in_memory();
        let api = client(&base, session.clone());

        let err = api.login("teacher", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Login yoki parol noto'g'ri");
        assert_eq!(session.token().await, None);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let api = client(&unreachable_base(), Session::in_memory());

        let err = api.login("  ", "1").await.unwrap_err();
        assert_eq!(err, ApiError::validation("Login va parolni to'ldiring"));
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_when_server_fails() {
        async fn broken() -> StatusCode {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        let base = spawn(Router::new().route("/logout", post(broken))).await;
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("tok")));
        let api = client(&base, session.clone());

        api.logout().await.unwrap();
        assert_eq!(session.token().await, None);
    }

    #[tokio::test]
    async fn test_register_validates_before_sending() {
        let api = client(&unreachable_base(), Session::in_memory());
        let registration = Registration {
            name: "Ali Valiyev".to_string(),
            phone: "+998901234567".to_string(),
            login: "ali".to_string(),
            password: "secret1".to_string(),
            password_confirmation: "secret2".to_string(),
        };

        let err = api.register(&registration).await.unwrap_err();
        assert_eq!(err.to_string(), "Parollar mos kelmadi");
    }

    #[tokio::test]
    async fn test_register_returns_server_message() {
        async fn register(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["login"], "ali");
            Json(json!({"success": true, "data": {"message": "Arizangiz qabul qilindi"}}))
        }
        let base = spawn(Router::new().route("/register", post(register))).await;
        let session = Session::in_memory();
        let api = client(&base, session.clone());
        let registration = Registration {
            name: "Ali Valiyev".to_string(),
            phone: "+998901234567".to_string(),
            login: "ali".to_string(),
            password: "secret1".to_string(),
            password_confirmation: "secret1".to_string(),
        };

        let message = api.register(&registration).await.unwrap();
        assert_eq!(message, "Arizangiz qabul qilindi");
        assert!(!session.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_change_password_is_authenticated() {
        async fn change(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            let authed = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer tok");
            if !authed || body["current_password"] != "old" {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"success": false, "message": "Joriy parol noto'g'ri"})),
                );
            }
            (StatusCode::OK, Json(json!({"success": true, "data": null})))
        }
        let base = spawn(Router::new().route("/change-password", post(change))).await;
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("tok")));
        let api = client(&base, session);

        let ok = api
            .change_password(&PasswordChange {
                current_password: "old".to_string(),
                password: "new-pass".to_string(),
                password_confirmation: "new-pass".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok, "Parol o'zgartirildi");

        let err = api
            .change_password(&PasswordChange {
                current_password: "bad".to_string(),
                password: "new-pass".to_string(),
                password_confirmation: "new-pass".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Joriy parol noto'g'ri");
    }
}
