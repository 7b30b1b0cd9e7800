pub mod attendance;
pub mod lesson_form;
pub mod login;
pub mod status_bar;
pub mod theme;
pub mod timetable;

pub use attendance::render_attendance_view;
pub use lesson_form::{render_lesson_form_view, LessonFormViewState};
pub use login::render_login_view;
pub use status_bar::{render_status_bar, StatusBarState};
pub use theme::Theme;
pub use timetable::{render_timetable_view, TimetableViewState};
