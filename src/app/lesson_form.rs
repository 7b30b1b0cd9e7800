use davomat::api::search::SearchKind;
use davomat::api::FileUpload;

use super::{App, FormField, ViewMode};

const LOOKUP_KINDS: [SearchKind; 3] = [SearchKind::Rooms, SearchKind::Groups, SearchKind::Subjects];

impl App {
    /// Show the form, fetching the static pickers on first use.
    pub async fn open_lesson_form(&mut self) {
        self.lesson_form.reset();
        self.view_mode = ViewMode::LessonForm;

        if !self.lesson_form.loaded {
            if let Err(e) = self.load_form_options().await {
                self.handle_api_error(e);
                return;
            }
            self.lesson_form.loaded = true;
        }

        for kind in LOOKUP_KINDS {
            if let Some(field) = self.lesson_form.form.lookup_mut(kind) {
                field.request_search();
            }
        }
    }

    async fn load_form_options(&mut self) -> davomat::ApiResult<()> {
        let faculties = self.api.get_fakultets().await?;
        let lesson_types = self.api.get_lesson_types().await?;
        let paras = self.api.get_paras().await?;
        self.add_debug(format!(
            "Form options: {} faculties, {} types, {} paras",
            faculties.len(),
            lesson_types.len(),
            paras.len()
        ));

        let form = &mut self.lesson_form.form;
        form.faculties = faculties;
        form.lesson_types = lesson_types;
        form.paras = paras;
        Ok(())
    }

    /// Run any typeahead lookup whose debounce window has elapsed.
    pub async fn poll_lookups(&mut self) {
        if self.view_mode != ViewMode::LessonForm {
            return;
        }

        for kind in LOOKUP_KINDS {
            let fakultet = self.lesson_form.form.fakultet.clone();
            let Some(field) = self.lesson_form.form.lookup_mut(kind) else {
                continue;
            };
            if !field.should_search() {
                continue;
            }
            field.searching = true;
            let query = field.query_param().map(str::to_string);

            let fakultet = if kind == SearchKind::Rooms { fakultet } else { None };
            let result = self
                .api
                .search(kind, query.as_deref(), fakultet.as_deref())
                .await;

            match result {
                Ok(options) => {
                    if let Some(field) = self.lesson_form.form.lookup_mut(kind) {
                        field.set_options(options);
                    }
                    if self.lesson_form.field.is_lookup() {
                        self.lesson_form.option_index = 0;
                    }
                }
                Err(e) => {
                    if let Some(field) = self.lesson_form.form.lookup_mut(kind) {
                        field.searching = false;
                    }
                    self.handle_api_error(e);
                }
            }
        }
    }

    pub fn form_push_char(&mut self, c: char) {
        let state = &mut self.lesson_form;
        match state.field {
            FormField::Room => state.form.room.push_char(c),
            FormField::Group => state.form.group.push_char(c),
            FormField::Subject => state.form.subject.push_char(c),
            FormField::Image => state.image_path.push(c),
            _ => {}
        }
    }

    pub fn form_pop_char(&mut self) {
        let state = &mut self.lesson_form;
        match state.field {
            FormField::Room => state.form.room.pop_char(),
            FormField::Group => state.form.group.pop_char(),
            FormField::Subject => state.form.subject.pop_char(),
            FormField::Image => {
                state.image_path.pop();
            }
            _ => {}
        }
    }

    /// Enter on the focused field: pick the highlighted option, or attach
    /// the typed image path.
    pub fn form_confirm_field(&mut self) {
        let state = &mut self.lesson_form;
        if state.field == FormField::Image {
            let path = state.image_path.trim();
            state.form.image = (!path.is_empty()).then(|| FileUpload::from_path(path));
        } else if !state.pick() {
            return;
        }
        let next = state.field.next();
        state.focus(next);
    }

    pub async fn submit_lesson_form(&mut self) {
        if self.lesson_form.submitting {
            return;
        }
        let (Some(sync), Some(date)) = (self.sync.clone(), self.current_date()) else {
            return;
        };

        let lesson = match self.lesson_form.form.build(date) {
            Ok(lesson) => lesson,
            Err(e) => {
                self.set_status_error(e.to_string());
                return;
            }
        };

        self.lesson_form.submitting = true;
        let result = sync.create_lesson(lesson).await;
        self.lesson_form.submitting = false;

        match result {
            Ok(created) => {
                self.add_debug(format!("Lesson {} created", created.id));
                self.set_status_info("Dars qo'shildi".to_string());
                self.lesson_form.reset();
                self.view_mode = ViewMode::Timetable;
            }
            Err(e) => self.handle_api_error(e),
        }
    }

    pub fn close_lesson_form(&mut self) {
        self.view_mode = ViewMode::Timetable;
    }
}
