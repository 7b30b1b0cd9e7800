use std::time::Instant;

use davomat::attendance::AttendanceSheet;
use davomat::config::SearchConfig;
use davomat::lesson_form::LessonForm;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ViewMode {
    Login,
    Timetable,
    Attendance,
    LessonForm,
}

/// Transient message shown in the status bar
pub struct StatusMessage {
    pub message: String,
    pub is_error: bool,
    pub timestamp: Instant,
}

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

/// Login screen state
#[derive(Default)]
pub struct LoginState {
    pub username: String,
    pub password: String,
    pub field: LoginField,
    pub submitting: bool,
}

impl LoginState {
    pub fn input_mut(&mut self) -> &mut String {
        match self.field {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }
}

/// Timetable list state
#[derive(Default)]
pub struct TimetableState {
    pub selected: usize,
}

impl TimetableState {
    /// Keep the cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Attendance screen state; `sheet` is set once the lesson detail loads
#[derive(Default)]
pub struct AttendanceState {
    pub sheet: Option<AttendanceSheet>,
    pub selected: usize,
    pub photo_input: String,
    pub editing_photo: bool,
    pub saving: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FormField {
    Faculty,
    Room,
    Group,
    Subject,
    LessonType,
    Para,
    Image,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Faculty,
        FormField::Room,
        FormField::Group,
        FormField::Subject,
        FormField::LessonType,
        FormField::Para,
        FormField::Image,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Faculty => "Fakultet",
            FormField::Room => "Xona",
            FormField::Group => "Guruh",
            FormField::Subject => "Fan",
            FormField::LessonType => "Dars turi",
            FormField::Para => "Para",
            FormField::Image => "Rasm",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Fields whose text input drives a server-side search
    pub fn is_lookup(self) -> bool {
        matches!(self, FormField::Room | FormField::Group | FormField::Subject)
    }
}

/// New lesson form state
pub struct LessonFormState {
    pub form: LessonForm,
    pub field: FormField,
    pub option_index: usize,
    pub image_path: String,
    /// Faculty, type and para lists have been fetched
    pub loaded: bool,
    pub submitting: bool,
}

impl LessonFormState {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            form: LessonForm::new(config),
            field: FormField::Faculty,
            option_index: 0,
            image_path: String::new(),
            loaded: false,
            submitting: false,
        }
    }

    /// Names of the options offered by the focused field
    pub fn option_names(&self) -> Vec<String> {
        match self.field {
            FormField::Faculty => self.form.faculties.clone(),
            FormField::Room => names(&self.form.room.options),
            FormField::Group => names(&self.form.group.options),
            FormField::Subject => names(&self.form.subject.options),
            FormField::LessonType => names(&self.form.lesson_types),
            FormField::Para => names(&self.form.paras),
            FormField::Image => Vec::new(),
        }
    }

    pub fn focus(&mut self, field: FormField) {
        self.field = field;
        self.option_index = 0;
    }

    pub fn move_option(&mut self, down: bool) {
        let len = self.option_names().len();
        if len == 0 {
            return;
        }
        self.option_index = if down {
            (self.option_index + 1).min(len - 1)
        } else {
            self.option_index.saturating_sub(1)
        };
    }

    /// Select the highlighted option of the focused field.
    pub fn pick(&mut self) -> bool {
        let index = self.option_index;
        match self.field {
            FormField::Faculty => match self.form.faculties.get(index).cloned() {
                Some(name) => {
                    self.form.select_faculty(&name);
                    true
                }
                None => false,
            },
            FormField::Room => self.form.room.select(index),
            FormField::Group => self.form.group.select(index),
            FormField::Subject => self.form.subject.select(index),
            FormField::LessonType => match self.form.lesson_types.get(index) {
                Some(option) => {
                    self.form.lesson_type = Some(option.clone());
                    true
                }
                None => false,
            },
            FormField::Para => match self.form.paras.get(index) {
                Some(option) => {
                    self.form.para = Some(option.clone());
                    true
                }
                None => false,
            },
            FormField::Image => false,
        }
    }

    /// Display value of the current selection for `field`
    pub fn selection(&self, field: FormField) -> Option<String> {
        match field {
            FormField::Faculty => self.form.fakultet.clone(),
            FormField::Room => self.form.room.selected.as_ref().map(|o| o.name.clone()),
            FormField::Group => self.form.group.selected.as_ref().map(|o| o.name.clone()),
            FormField::Subject => self.form.subject.selected.as_ref().map(|o| o.name.clone()),
            FormField::LessonType => self.form.lesson_type.as_ref().map(|o| o.name.clone()),
            FormField::Para => self.form.para.as_ref().map(|o| o.name.clone()),
            FormField::Image => self.form.image.as_ref().map(|i| i.file_name.clone()),
        }
    }

    pub fn reset(&mut self) {
        self.form.reset();
        self.field = FormField::Faculty;
        self.option_index = 0;
        self.image_path.clear();
        self.submitting = false;
    }
}

fn names(options: &[davomat::models::LookupOption]) -> Vec<String> {
    options.iter().map(|o| o.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use davomat::models::LookupOption;

    fn option(id: &str, name: &str) -> LookupOption {
        LookupOption {
            id: id.to_string(),
            name: name.to_string(),
            fakultet: None,
        }
    }

    #[test]
    fn test_form_field_cycles() {
        assert_eq!(FormField::Faculty.next(), FormField::Room);
        assert_eq!(FormField::Image.next(), FormField::Faculty);
        assert_eq!(FormField::Faculty.prev(), FormField::Image);
        assert!(FormField::Group.is_lookup());
        assert!(!FormField::Para.is_lookup());
    }

    #[test]
    fn test_pick_highlighted_options() {
        let mut state = LessonFormState::new(&SearchConfig::default());
        state.form.faculties = vec!["A".to_string(), "B".to_string()];
        state.move_option(true);
        assert!(state.pick());
        assert_eq!(state.selection(FormField::Faculty).as_deref(), Some("B"));

        state.focus(FormField::Para);
        assert!(!state.pick());
        state.form.paras = vec![option("1", "08:30-09:50")];
        state.move_option(true);
        assert_eq!(state.option_index, 0);
        assert!(state.pick());
        assert_eq!(state.selection(FormField::Para).as_deref(), Some("08:30-09:50"));
    }

    #[test]
    fn test_login_fields_toggle() {
        let mut login = LoginState::default();
        login.input_mut().push_str("teacher");
        login.next_field();
        login.input_mut().push_str("secret");
        assert_eq!(login.username, "teacher");
        assert_eq!(login.password, "secret");
        login.next_field();
        assert_eq!(login.field, LoginField::Username);
    }

    #[test]
    fn test_timetable_clamp() {
        let mut timetable = TimetableState { selected: 7 };
        timetable.clamp(3);
        assert_eq!(timetable.selected, 2);
        timetable.clamp(0);
        assert_eq!(timetable.selected, 0);
    }
}
