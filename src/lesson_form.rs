//! State of the "new lesson" form: six pickers, three of them with
//! server-side typeahead search.

use chrono::NaiveDate;

use crate::api::search::SearchKind;
use crate::api::FileUpload;
use crate::config::SearchConfig;
use crate::debounce::Debouncer;
use crate::error::{ApiError, ApiResult};
use crate::models::{LookupOption, NewLesson};

pub const FORM_INCOMPLETE_MESSAGE: &str = "Iltimos, barcha maydonlarni to'ldiring!";

/// A picker backed by a `/teacher/search/*` endpoint.
#[derive(Debug, Clone)]
pub struct LookupField {
    pub kind: SearchKind,
    pub query: String,
    pub options: Vec<LookupOption>,
    pub selected: Option<LookupOption>,
    pub searching: bool,
    debouncer: Debouncer,
}

impl LookupField {
    pub fn new(kind: SearchKind, debounce_ms: u64) -> Self {
        Self {
            kind,
            query: String::new(),
            options: Vec::new(),
            selected: None,
            searching: false,
            debouncer: Debouncer::from_millis(debounce_ms),
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.debouncer.trigger();
    }

    pub fn pop_char(&mut self) {
        if self.query.pop().is_some() {
            self.debouncer.trigger();
        }
    }

    /// Schedule a search with the current query (e.g. when the picker opens
    /// with no options loaded yet).
    pub fn request_search(&mut self) {
        self.debouncer.trigger();
    }

    /// True once per quiet period after the last keystroke.
    pub fn should_search(&mut self) -> bool {
        self.debouncer.ready()
    }

    /// `q` parameter for the lookup; blank queries list everything.
    pub fn query_param(&self) -> Option<&str> {
        Some(self.query.trim()).filter(|q| !q.is_empty())
    }

    pub fn set_options(&mut self, options: Vec<LookupOption>) {
        self.options = options;
        self.searching = false;
    }

    pub fn select(&mut self, index: usize) -> bool {
        match self.options.get(index) {
            Some(option) => {
                self.selected = Some(option.clone());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.options.clear();
        self.selected = None;
        self.searching = false;
        self.debouncer.cancel();
    }
}

#[derive(Debug, Clone)]
pub struct LessonForm {
    pub faculties: Vec<String>,
    pub fakultet: Option<String>,
    pub room: LookupField,
    pub group: LookupField,
    pub subject: LookupField,
    pub lesson_types: Vec<LookupOption>,
    pub lesson_type: Option<LookupOption>,
    pub paras: Vec<LookupOption>,
    pub para: Option<LookupOption>,
    pub image: Option<FileUpload>,
}

impl LessonForm {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            faculties: Vec::new(),
            fakultet: None,
            room: LookupField::new(SearchKind::Rooms, config.room_debounce_ms),
            group: LookupField::new(SearchKind::Groups, config.debounce_ms),
            subject: LookupField::new(SearchKind::Subjects, config.debounce_ms),
            lesson_types: Vec::new(),
            lesson_type: None,
            paras: Vec::new(),
            para: None,
            image: None,
        }
    }

    /// Rooms are filtered by faculty, so picking one re-runs the room lookup.
    pub fn select_faculty(&mut self, fakultet: &str) {
        if self.fakultet.as_deref() == Some(fakultet) {
            return;
        }
        self.fakultet = Some(fakultet.to_string());
        self.room.selected = None;
        self.room.request_search();
    }

    pub fn lookup_mut(&mut self, kind: SearchKind) -> Option<&mut LookupField> {
        match kind {
            SearchKind::Rooms => Some(&mut self.room),
            SearchKind::Groups => Some(&mut self.group),
            SearchKind::Subjects => Some(&mut self.subject),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.fakultet = None;
        self.room.clear();
        self.group.clear();
        self.subject.clear();
        self.lesson_type = None;
        self.para = None;
        self.image = None;
    }

    /// Validate the selections and build the create payload for `date`.
    pub fn build(&self, date: NaiveDate) -> ApiResult<NewLesson> {
        let incomplete = || ApiError::validation(FORM_INCOMPLETE_MESSAGE);

        let fakultet = self.fakultet.clone().ok_or_else(incomplete)?;
        let room = self.room.selected.as_ref().ok_or_else(incomplete)?;
        let group = self.group.selected.as_ref().ok_or_else(incomplete)?;
        let subject = self.subject.selected.as_ref().ok_or_else(incomplete)?;
        let lesson_type = self.lesson_type.as_ref().ok_or_else(incomplete)?;
        let para = self.para.as_ref().ok_or_else(incomplete)?;

        Ok(NewLesson {
            group_id: numeric_id(group)?,
            room_id: numeric_id(room)?,
            date,
            fakultet,
            subject_name: Some(subject.name.clone()),
            time_at: Some(para.name.clone()),
            lesson_type: Some(lesson_type.name.clone()),
            image: self.image.clone(),
        })
    }
}

fn numeric_id(option: &LookupOption) -> ApiResult<u64> {
    option
        .id
        .parse()
        .map_err(|_| ApiError::validation(format!("Noto'g'ri identifikator: {}", option.id)))
}
