use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::list::{lessons_differ, merge_created, sort_by_start};
use super::{AppActivity, LessonBackend, LoadOptions, SyncPhase, SyncSettings, SyncSnapshot};
use crate::error::ApiResult;
use crate::models::{Lesson, LessonView, NewLesson};

enum Command {
    SetDate(NaiveDate),
    Reload(LoadOptions),
    Refresh,
    Activity(AppActivity),
    Created {
        lesson: Lesson,
        ack: oneshot::Sender<()>,
    },
}

struct FetchOutcome {
    generation: u64,
    result: ApiResult<Vec<Lesson>>,
}

struct PendingLoad {
    deadline: Instant,
    options: LoadOptions,
}

struct InFlight {
    generation: u64,
    options: LoadOptions,
    abort: AbortHandle,
}

/// Builder for the timetable synchronizer.
pub struct LessonSync {
    backend: Arc<dyn LessonBackend>,
    settings: SyncSettings,
    date: NaiveDate,
    activity: AppActivity,
}

impl LessonSync {
    pub fn new(backend: Arc<dyn LessonBackend>, settings: SyncSettings, date: NaiveDate) -> Self {
        Self {
            backend,
            settings,
            date,
            activity: AppActivity::Foreground,
        }
    }

    /// Initial app activity; polling only runs in the foreground.
    pub fn activity(mut self, activity: AppActivity) -> Self {
        self.activity = activity;
        self
    }

    /// Spawn the controller task and schedule the first load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> LessonSyncHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SyncSnapshot::new(self.date));

        let worker = Worker {
            backend: Arc::clone(&self.backend),
            settings: self.settings,
            date: self.date,
            activity: self.activity,
            snapshot: snapshot_tx,
            commands: command_rx,
            outcome_tx,
            outcome_rx,
            pending: None,
            in_flight: None,
            generation: 0,
            poll: None,
        };
        let task = tokio::spawn(worker.run());

        LessonSyncHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
            backend: self.backend,
            task: Arc::new(TaskGuard(task)),
        }
    }
}

struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Cheap to clone; the controller stops when `stop` is called or the last
/// clone is dropped.
#[derive(Clone)]
pub struct LessonSyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<SyncSnapshot>,
    backend: Arc<dyn LessonBackend>,
    task: Arc<TaskGuard>,
}

impl LessonSyncHandle {
    pub fn set_date(&self, date: NaiveDate) {
        self.send(Command::SetDate(date));
    }

    /// Pull-to-refresh: no loader, replaces the list unconditionally.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Silent reload that only replaces the list when it changed.
    pub fn reload(&self) {
        self.send(Command::Reload(LoadOptions::SILENT));
    }

    pub fn reload_with(&self, options: LoadOptions) {
        self.send(Command::Reload(options));
    }

    pub fn set_activity(&self, activity: AppActivity) {
        self.send(Command::Activity(activity));
    }

    /// Create a lesson on the currently shown date.
    ///
    /// On success the lesson is merged into the visible list before this
    /// returns, and a reconcile fetch is scheduled.
    pub async fn create_lesson(&self, mut lesson: NewLesson) -> ApiResult<Lesson> {
        lesson.date = self.date();
        let created = self.backend.create_lesson(lesson).await?;

        let (ack, merged) = oneshot::channel();
        let command = Command::Created {
            lesson: created.clone(),
            ack,
        };
        if self.commands.send(command).is_ok() {
            merged.await.ok();
        }
        Ok(created)
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn date(&self) -> NaiveDate {
        self.snapshot.borrow().date
    }

    /// Cancel timers and any in-flight fetch.
    pub fn stop(&self) {
        self.task.0.abort();
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Lesson sync already stopped");
        }
    }
}

struct Worker {
    backend: Arc<dyn LessonBackend>,
    settings: SyncSettings,
    date: NaiveDate,
    activity: AppActivity,
    snapshot: watch::Sender<SyncSnapshot>,
    commands: mpsc::UnboundedReceiver<Command>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    pending: Option<PendingLoad>,
    in_flight: Option<InFlight>,
    generation: u64,
    poll: Option<Interval>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

impl Worker {
    async fn run(mut self) {
        self.schedule(LoadOptions::LOADER);
        if self.activity == AppActivity::Foreground {
            self.start_polling();
        }

        loop {
            let deadline = self.pending.as_ref().map(|p| p.deadline);

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.issue_fetch();
                }
                _ = next_tick(&mut self.poll) => {
                    tracing::debug!("Poll tick for {}", self.date);
                    self.schedule(LoadOptions::SILENT);
                }
                Some(outcome) = self.outcome_rx.recv() => self.apply(outcome),
            }
        }

        tracing::debug!("Lesson sync stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetDate(date) => self.change_date(date),
            Command::Reload(options) => self.schedule(options),
            Command::Refresh => {
                self.publish(|s| s.refreshing = true);
                self.schedule(LoadOptions::FORCED);
            }
            Command::Activity(activity) => self.set_activity(activity),
            Command::Created { lesson, ack } => {
                self.apply_created(lesson);
                ack.send(()).ok();
            }
        }
    }

    fn publish(&self, update: impl FnOnce(&mut SyncSnapshot)) {
        self.snapshot.send_if_modified(|snapshot| {
            let before = snapshot.clone();
            update(snapshot);
            *snapshot != before
        });
    }

    /// (Re)start the debounce window.
    fn schedule(&mut self, options: LoadOptions) {
        let options = match self.pending.take() {
            Some(pending) => pending.options.combine(options),
            None => options,
        };
        self.pending = Some(PendingLoad {
            deadline: Instant::now() + self.settings.debounce,
            options,
        });

        if self.in_flight.is_none() {
            self.publish(|s| s.phase = SyncPhase::Debouncing);
        }
    }

    fn change_date(&mut self, date: NaiveDate) {
        if date == self.date {
            return;
        }
        tracing::info!("Timetable date {} -> {}", self.date, date);

        self.abort_in_flight();
        self.pending = None;
        self.date = date;
        self.publish(|s| s.date = date);
        self.schedule(LoadOptions::LOADER);

        if self.poll.is_some() {
            self.start_polling();
        }
    }

    fn set_activity(&mut self, activity: AppActivity) {
        let previous = std::mem::replace(&mut self.activity, activity);

        match activity {
            AppActivity::Foreground => {
                if previous == AppActivity::Background {
                    tracing::info!("Back in foreground, refreshing {}", self.date);
                    self.schedule(LoadOptions::SILENT);
                }
                if self.poll.is_none() {
                    self.start_polling();
                }
            }
            AppActivity::Background => {
                if self.poll.take().is_some() {
                    tracing::debug!("Polling suspended");
                }
            }
        }
    }

    fn start_polling(&mut self) {
        let period = self.settings.poll_interval;
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.poll = Some(interval);
    }

    /// Abort the in-flight fetch, if any. Returns whether one was running.
    fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                tracing::debug!("Aborting fetch generation {}", in_flight.generation);
                in_flight.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel with no replacement fetch issued right away.
    fn abort_in_flight(&mut self) {
        if self.cancel_in_flight() {
            self.mark_aborted();
        }
    }

    fn mark_aborted(&self) {
        self.publish(|s| {
            s.phase = SyncPhase::Aborted;
            s.loading = false;
            s.refreshing = false;
        });
    }

    fn issue_fetch(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.cancel_in_flight();

        self.generation += 1;
        let generation = self.generation;
        let date = self.date;
        let backend = Arc::clone(&self.backend);
        let outcomes = self.outcome_tx.clone();

        let task = tokio::spawn(async move {
            let result = backend.fetch_lessons(date).await;
            outcomes.send(FetchOutcome { generation, result }).ok();
        });

        tracing::debug!("Fetching lessons for {} (generation {})", date, generation);
        self.in_flight = Some(InFlight {
            generation,
            options: pending.options,
            abort: task.abort_handle(),
        });

        let show_loader = pending.options.show_loader;
        self.publish(|s| {
            s.phase = SyncPhase::Fetching;
            s.error = None;
            if show_loader {
                s.loading = true;
            }
        });
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        let options = match self.in_flight.take() {
            Some(in_flight) if in_flight.generation == outcome.generation => in_flight.options,
            other => {
                self.in_flight = other;
                tracing::debug!("Discarding stale fetch generation {}", outcome.generation);
                return;
            }
        };

        match outcome.result {
            Ok(lessons) => {
                let mut views: Vec<LessonView> = lessons.iter().map(LessonView::from).collect();
                sort_by_start(&mut views);
                tracing::debug!("Loaded {} lessons for {}", views.len(), self.date);

                self.publish(|s| {
                    if options.force || lessons_differ(&s.lessons, &views) {
                        s.replace_lessons(views);
                    }
                    s.phase = SyncPhase::Applied;
                    s.loading = false;
                    s.refreshing = false;
                    s.error = None;
                });
            }
            Err(e) if e.is_cancelled() => self.mark_aborted(),
            Err(e) => {
                tracing::warn!("Failed to load lessons for {}: {}", self.date, e);
                let message = e.to_string();
                self.publish(|s| {
                    if !s.lessons.is_empty() {
                        s.replace_lessons(Vec::new());
                    }
                    s.phase = SyncPhase::Failed;
                    s.loading = false;
                    s.refreshing = false;
                    s.error = Some(message);
                });
            }
        }
    }

    /// Optimistic insert of a freshly created lesson, then reconcile.
    ///
    /// A fetch issued before the create cannot contain the new lesson, so it
    /// is superseded here rather than allowed to overwrite the merge.
    fn apply_created(&mut self, lesson: Lesson) {
        self.abort_in_flight();
        if lesson.date.is_some_and(|d| d != self.date) {
            tracing::debug!("Created lesson {} is not on {}", lesson.id, self.date);
        } else {
            let view = LessonView::from(&lesson);
            self.publish(|s| {
                let merged = merge_created(&s.lessons, view);
                s.replace_lessons(merged);
            });
        }
        self.schedule(LoadOptions::SILENT);
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
