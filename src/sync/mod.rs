//! Lesson list synchronization.
//!
//! - [`LessonSync`]: one controller task per timetable, owning the debounce
//!   timer, the poll timer and the in-flight fetch
//! - [`list`]: pure helpers for diffing and merging lesson lists
//!
//! The UI talks to the controller through a [`LessonSyncHandle`] and reads
//! state from a `watch` channel of [`SyncSnapshot`]s.

mod controller;
pub mod list;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::SyncConfig;
use crate::error::ApiResult;
use crate::models::{Lesson, LessonView, NewLesson};

pub use controller::{LessonSync, LessonSyncHandle};

/// Where lessons come from. Implemented by `ApiClient`.
#[async_trait]
pub trait LessonBackend: Send + Sync + 'static {
    async fn fetch_lessons(&self, date: NaiveDate) -> ApiResult<Vec<Lesson>>;

    async fn create_lesson(&self, lesson: NewLesson) -> ApiResult<Lesson>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Debouncing,
    Fetching,
    Applied,
    Aborted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppActivity {
    Foreground,
    Background,
}

/// How a scheduled load presents itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Show the full-screen loader while fetching
    pub show_loader: bool,
    /// Replace the list even if nothing changed
    pub force: bool,
}

impl LoadOptions {
    /// Date change or first load.
    pub const LOADER: LoadOptions = LoadOptions {
        show_loader: true,
        force: false,
    };

    /// Poll, foreground return, reconcile after create.
    pub const SILENT: LoadOptions = LoadOptions {
        show_loader: false,
        force: false,
    };

    /// Pull-to-refresh.
    pub const FORCED: LoadOptions = LoadOptions {
        show_loader: false,
        force: true,
    };

    /// Options of a debounce window that absorbed another request.
    pub fn combine(self, other: LoadOptions) -> LoadOptions {
        LoadOptions {
            show_loader: self.show_loader || other.show_loader,
            force: self.force || other.force,
        }
    }
}

/// What the timetable screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub date: NaiveDate,
    pub lessons: Arc<Vec<LessonView>>,
    pub phase: SyncPhase,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
    /// Bumped every time `lessons` is replaced
    pub revision: u64,
}

impl SyncSnapshot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            lessons: Arc::new(Vec::new()),
            phase: SyncPhase::Idle,
            loading: false,
            refreshing: false,
            error: None,
            revision: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    fn replace_lessons(&mut self, lessons: Vec<LessonView>) {
        self.lessons = Arc::new(lessons);
        self.revision += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub debounce: Duration,
    pub poll_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
        }
    }
}
