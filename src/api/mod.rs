//! REST client for the timetable backend.
//!
//! Every endpoint answers with an envelope `{success, data}`; failures carry
//! a human-readable message in `data.message` or `message`. [`ApiClient`]
//! turns all of that, plus transport failures, into [`ApiError`].

pub mod attendance;
pub mod auth;
pub mod lessons;
pub mod search;
mod upload;

#[cfg(test)]
pub(crate) mod test_server;

pub use upload::FileUpload;

use std::time::Duration;

use anyhow::Result;
use reqwest::multipart::Form;
use reqwest::{header, Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, REQUEST_FAILED_MESSAGE};
use crate::session::Session;

/// Request payload. Plain fields go out as JSON (or as the query string for
/// GET); attaching a file switches the whole body to multipart.
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    fields: Map<String, Value>,
    files: Vec<(String, FileUpload)>,
}

impl RequestBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any struct that serializes to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> ApiResult<Self> {
        match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => Ok(Self {
                fields,
                files: Vec::new(),
            }),
            Ok(_) => Err(ApiError::validation("So'rov tanasi obyekt bo'lishi kerak")),
            Err(e) => Err(ApiError::validation(e.to_string())),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn file(mut self, name: impl Into<String>, upload: FileUpload) -> Self {
        self.files.push((name.into(), upload));
        self
    }

    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| field_text(v).map(|text| (k.clone(), text)))
            .collect()
    }

    fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    async fn into_form(self) -> ApiResult<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            if let Some(text) = field_text(value) {
                form = form.text(name.clone(), text);
            }
        }
        for (name, upload) in self.files {
            form = form.part(name, upload.into_part().await?);
        }
        Ok(form)
    }
}

/// Text form of a scalar field; `null` fields are dropped.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    upload_timeout: Duration,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Session) -> Result<Self> {
        Self::with_timeouts(
            &config.base_url,
            session,
            config.request_timeout(),
            config.upload_timeout(),
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        session: Session,
        request_timeout: Duration,
        upload_timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_timeout,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and decode the envelope's `data` into `T`.
    ///
    /// With `requires_auth` the stored token is attached as a bearer token;
    /// without a token the request still goes out unauthenticated.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        requires_auth: bool,
    ) -> ApiResult<T> {
        let data = self.send(method, path, body, requires_auth).await?;
        serde_json::from_value(data).map_err(|e| {
            tracing::warn!("Unexpected response shape from {}: {}", path, e);
            ApiError::Decode
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<RequestBody>,
        requires_auth: bool,
    ) -> ApiResult<T> {
        self.request(Method::GET, path, query, requires_auth).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<RequestBody>,
        requires_auth: bool,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, body, requires_auth).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        requires_auth: bool,
    ) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(header::ACCEPT, "application/json");

        if requires_auth {
            if let Some(token) = self.session.token().await {
                builder = builder.bearer_auth(token);
            }
        }

        if let Some(body) = body {
            if method == Method::GET {
                builder = builder.query(&body.query_pairs());
            } else if body.is_multipart() {
                builder = builder
                    .multipart(body.into_form().await?)
                    .timeout(self.upload_timeout);
            } else {
                builder = builder.json(&body.to_json());
            }
        }

        tracing::debug!("{} {}", method, path);
        let response = builder.send().await.map_err(ApiError::from_transport)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(ApiError::from_transport)?;

        if status == 401 {
            self.session.clear().await;
        }

        parse_envelope(status, &text).inspect_err(|e| {
            tracing::warn!("{} {} failed ({}): {}", method, path, status, e);
        })
    }
}

/// Pick the most specific human-readable message out of an error payload.
pub(crate) fn extract_message(payload: &Value) -> Option<String> {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    non_empty(payload.pointer("/data/message"))
        .or_else(|| non_empty(payload.get("message")))
        .or_else(|| non_empty(payload.get("error")))
        .or_else(|| non_empty(payload.pointer("/error/message")))
}

/// Classify a raw response and unwrap the envelope's `data`.
pub(crate) fn parse_envelope(status: u16, body: &str) -> ApiResult<Value> {
    let ok_status = (200..300).contains(&status);
    let status_fallback = || format!("Server xatosi: {}", status);

    if body.trim().is_empty() {
        return if ok_status {
            Ok(Value::Null)
        } else {
            Err(ApiError::Server {
                status,
                message: status_fallback(),
            })
        };
    }

    let payload: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) if ok_status => return Err(ApiError::Decode),
        Err(_) => {
            return Err(ApiError::Server {
                status,
                message: status_fallback(),
            })
        }
    };

    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::Server {
            status,
            message: extract_message(&payload)
                .unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string()),
        });
    }

    if !ok_status {
        return Err(ApiError::Server {
            status,
            message: extract_message(&payload).unwrap_or_else(status_fallback),
        });
    }

    Ok(match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    })
}
