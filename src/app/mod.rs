pub mod state;
mod attendance;
mod lesson_form;
mod timetable;

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tokio::sync::watch;

use davomat::api::ApiClient;
use davomat::config::Config;
use davomat::error::ApiError;
use davomat::session::{FileTokenStore, Session};
use davomat::sync::{AppActivity, LessonSync, LessonSyncHandle, SyncSettings, SyncSnapshot};

use crate::ui::Theme;

pub use state::{
    AttendanceState, FormField, LessonFormState, LoginField, LoginState, StatusMessage,
    TimetableState, ViewMode,
};

const DEBUG_LOG_LIMIT: usize = 100;

pub struct App {
    // View state
    pub view_mode: ViewMode,
    pub login: LoginState,
    pub timetable: TimetableState,
    pub attendance: AttendanceState,
    pub lesson_form: LessonFormState,

    // Core components
    pub config: Config,
    pub theme: Theme,
    pub api: Arc<ApiClient>,
    pub sync: Option<LessonSyncHandle>,
    /// Last snapshot published by the synchronizer
    pub snapshot: Option<SyncSnapshot>,
    /// Set whenever `sync` is started or stopped so the event loop re-subscribes
    pub sync_changed: bool,

    pub debug_log: VecDeque<String>,
    pub show_debug: bool,
    pub status_message: Option<StatusMessage>,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let session = Session::new(Arc::new(FileTokenStore::in_dir(&Config::config_dir()?)));
        let api = Arc::new(ApiClient::new(&config.api, session)?);

        let theme = match Theme::from_preset(&config.ui.theme) {
            Some(theme) => theme,
            None => {
                tracing::warn!("Unknown theme '{}', using default", config.ui.theme);
                Theme::default()
            }
        }
        .with_overrides(&config.ui.colors);

        let mut app = Self {
            view_mode: ViewMode::Login,
            login: LoginState::default(),
            timetable: TimetableState::default(),
            attendance: AttendanceState::default(),
            lesson_form: LessonFormState::new(&config.search),
            show_debug: config.ui.show_debug,
            config,
            theme,
            api,
            sync: None,
            snapshot: None,
            sync_changed: false,
            debug_log: VecDeque::new(),
            status_message: None,
        };

        if app.api.session().is_logged_in().await {
            app.add_debug("Stored token found".to_string());
            app.start_sync();
        }

        Ok(app)
    }

    /// Start the lesson synchronizer for today and show the timetable.
    pub fn start_sync(&mut self) {
        let today = Local::now().date_naive();
        let backend = self.api.clone();
        let handle = LessonSync::new(backend, SyncSettings::from(&self.config.sync), today).start();
        self.snapshot = Some(handle.snapshot());
        self.sync = Some(handle);
        self.sync_changed = true;
        self.timetable = TimetableState::default();
        self.view_mode = ViewMode::Timetable;
        self.add_debug(format!("Lesson sync started for {}", today));
    }

    pub fn stop_sync(&mut self) {
        if let Some(handle) = self.sync.take() {
            handle.stop();
            self.add_debug("Lesson sync stopped".to_string());
        }
        self.snapshot = None;
        self.sync_changed = true;
    }

    /// Receiver for the event loop, taken once after each start/stop.
    pub fn take_subscription(&mut self) -> Option<Option<watch::Receiver<SyncSnapshot>>> {
        if !self.sync_changed {
            return None;
        }
        self.sync_changed = false;
        Some(self.sync.as_ref().map(LessonSyncHandle::subscribe))
    }

    pub fn apply_snapshot(&mut self, snapshot: SyncSnapshot) {
        if let Some((error_changed, revision_changed)) = self
            .snapshot
            .as_ref()
            .map(|previous| (previous.error != snapshot.error, previous.revision != snapshot.revision))
        {
            if error_changed {
                if let Some(ref error) = snapshot.error {
                    self.add_debug(format!("Lesson fetch failed: {}", error));
                }
            }
            if revision_changed {
                self.add_debug(format!(
                    "{} lessons for {}",
                    snapshot.lessons.len(),
                    snapshot.date
                ));
            }
        }
        self.timetable.clamp(snapshot.lessons.len());
        self.snapshot = Some(snapshot);
    }

    pub fn set_activity(&mut self, activity: AppActivity) {
        if let Some(ref sync) = self.sync {
            sync.set_activity(activity);
        }
    }

    pub async fn login(&mut self) {
        if self.login.submitting {
            return;
        }
        self.login.submitting = true;
        let result = self.api.login(&self.login.username, &self.login.password).await;
        self.login.submitting = false;

        match result {
            Ok(_) => {
                self.add_debug(format!("Logged in as {}", self.login.username.trim()));
                self.login.password.clear();
                self.set_status_info("Xush kelibsiz!".to_string());
                self.start_sync();
            }
            Err(e) => self.set_status_error(e.to_string()),
        }
    }

    pub async fn logout(&mut self) {
        self.stop_sync();
        if let Err(e) = self.api.logout().await {
            self.add_debug(format!("Logout request failed: {}", e));
        }
        self.login = LoginState::default();
        self.attendance = AttendanceState::default();
        self.lesson_form.reset();
        self.view_mode = ViewMode::Login;
    }

    /// Surface an API error; a rejected token sends the user back to login.
    pub fn handle_api_error(&mut self, err: ApiError) {
        if err.is_cancelled() {
            return;
        }
        let unauthorized = err.is_unauthorized() || err == ApiError::AuthMissing;
        self.set_status_error(err.to_string());
        if unauthorized {
            self.stop_sync();
            self.view_mode = ViewMode::Login;
        }
    }

    pub fn add_debug(&mut self, msg: String) {
        tracing::debug!("{}", msg);
        let timestamp = Local::now().format("%H:%M:%S");
        self.debug_log.push_back(format!("[{}] {}", timestamp, msg));
        while self.debug_log.len() > DEBUG_LOG_LIMIT {
            self.debug_log.pop_front();
        }
    }

    pub fn set_status_error(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            message: msg.clone(),
            is_error: true,
            timestamp: std::time::Instant::now(),
        });
        self.add_debug(msg);
    }

    pub fn set_status_info(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            message: msg,
            is_error: false,
            timestamp: std::time::Instant::now(),
        });
    }

    pub fn clear_expired_status(&mut self) {
        if let Some(ref msg) = self.status_message {
            if msg.timestamp.elapsed() > std::time::Duration::from_secs(5) {
                self.status_message = None;
            }
        }
    }

    /// True while a text field owns the keyboard
    pub fn is_editing(&self) -> bool {
        match self.view_mode {
            ViewMode::Login => true,
            ViewMode::Attendance => self.attendance.editing_photo,
            ViewMode::LessonForm => {
                self.lesson_form.field.is_lookup() || self.lesson_form.field == FormField::Image
            }
            ViewMode::Timetable => false,
        }
    }
}
