use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::multipart::Part;

use crate::error::{ApiError, ApiResult};

const DEFAULT_MIME: &str = "image/jpeg";

/// A local file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
}

impl FileUpload {
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Derive file name and MIME type from the path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("photo-{}.jpg", Utc::now().timestamp_millis()));
        let mime_type = mime_for(&file_name);

        Self {
            path: path.to_path_buf(),
            file_name,
            mime_type,
        }
    }

    /// Fail fast if the file cannot be attached.
    pub async fn ensure_readable(&self) -> ApiResult<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(()),
            _ => Err(ApiError::validation(format!(
                "Rasm fayli topilmadi: {}",
                self.path.display()
            ))),
        }
    }

    pub(crate) async fn into_part(self) -> ApiResult<Part> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            tracing::warn!("Could not read upload {}: {}", self.path.display(), e);
            ApiError::validation(format!("Rasm fayli topilmadi: {}", self.path.display()))
        })?;

        Part::bytes(bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .map_err(|_| ApiError::validation(format!("Noto'g'ri fayl turi: {}", self.mime_type)))
    }
}

fn mime_for(file_name: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => DEFAULT_MIME.to_string(),
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!("image/{}", ext),
        _ => DEFAULT_MIME.to_string(),
    }
}
