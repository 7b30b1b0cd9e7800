//! Teacher timetable and attendance client.
//!
//! The library holds everything that talks to the backend or keeps state
//! outside the terminal: the REST client, the token session, the lesson
//! list synchronizer and the attendance / lesson form models. The `davomat`
//! binary puts a CLI and a ratatui front-end on top.

pub mod api;
pub mod attendance;
pub mod config;
pub mod debounce;
pub mod error;
pub mod lesson_form;
pub mod models;
pub mod session;
pub mod sync;

pub use api::{ApiClient, FileUpload};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use session::{FileTokenStore, Session};
pub use sync::{LessonSync, LessonSyncHandle, SyncSnapshot};
