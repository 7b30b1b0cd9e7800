use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rpassword::prompt_password;

use davomat::api::auth::{PasswordChange, Registration};
use davomat::api::search::SearchKind;
use davomat::api::{ApiClient, FileUpload};
use davomat::attendance::AttendanceSheet;
use davomat::config::Config;
use davomat::models::{LessonView, NewLesson};
use davomat::session::{FileTokenStore, Session};

/// Teacher timetable and attendance client
#[derive(Parser)]
#[command(name = "davomat")]
#[command(about = "Teacher timetable and attendance client", long_about = None)]
pub struct Cli {
    /// Alternate config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the token
    Login {
        login: String,

        /// Password (prompted if not given)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out and forget the token
    Logout,

    /// Create a teacher account; missing fields and passwords are prompted
    Register {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        login: Option<String>,
    },

    /// Change the password of the logged-in account
    ChangePassword,

    /// List lessons for a day
    Lessons {
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show one lesson with its roster
    Lesson { id: u64 },

    /// Create a lesson
    CreateLesson {
        #[arg(long)]
        group_id: u64,

        #[arg(long)]
        room_id: u64,

        #[arg(long)]
        fakultet: String,

        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        subject: Option<String>,

        /// Time slot, e.g. 08:30-09:50
        #[arg(long)]
        time_at: Option<String>,

        /// Lesson type label
        #[arg(long = "type")]
        lesson_type: Option<String>,

        /// Image to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Query a lookup endpoint (fakultets, groups, rooms, subjects, paras, lesson-types)
    Search {
        kind: SearchKind,

        query: Option<String>,

        /// Faculty filter for rooms
        #[arg(long)]
        fakultet: Option<String>,
    },

    /// Submit attendance for a lesson; everyone not listed as absent is present
    Attend {
        lesson_id: u64,

        /// Class photo
        #[arg(long)]
        photo: PathBuf,

        /// Attendance record ids to mark absent
        #[arg(long)]
        absent: Vec<u64>,
    },
}

pub fn build_client(config: &Config) -> Result<ApiClient> {
    let session = Session::new(Arc::new(FileTokenStore::in_dir(&Config::config_dir()?)));
    ApiClient::new(&config.api, session)
}

pub async fn run(command: Commands, config: &Config) -> Result<()> {
    let api = build_client(config)?;

    match command {
        Commands::Login { login, password } => {
            let password = or_else_read(password, "Parol", read_password)?;
            api.login(&login, &password).await?;
            println!("Tizimga kirildi");
        }
        Commands::Logout => {
            api.logout().await?;
            println!("Tizimdan chiqildi");
        }
        Commands::Register { name, phone, login } => {
            let registration = Registration {
                name: or_else_read(name, "Ism", prompt)?,
                phone: or_else_read(phone, "Telefon", prompt)?,
                login: or_else_read(login, "Login", prompt)?,
                password: read_password("Parol")?,
                password_confirmation: read_password("Parolni tasdiqlang")?,
            };
            println!("{}", api.register(&registration).await?);
        }
        Commands::ChangePassword => {
            let change = PasswordChange {
                current_password: read_password("Joriy parol")?,
                password: read_password("Yangi parol")?,
                password_confirmation: read_password("Yangi parolni tasdiqlang")?,
            };
            println!("{}", api.change_password(&change).await?);
        }
        Commands::Lessons { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let page = api.fetch_lessons(date).await?;
            if page.lessons.is_empty() {
                println!("Bugun darslar yo'q");
            }
            for lesson in &page.lessons {
                println!("{}", lesson_line(&LessonView::from(lesson)));
            }
            tracing::info!("Listed {} of {} lessons for {}", page.lessons.len(), page.total, date);
        }
        Commands::Lesson { id } => {
            let lesson = api.fetch_lesson(id).await?;
            println!("{}", lesson_line(&LessonView::from(&lesson)));
            match AttendanceSheet::from_lesson(&lesson) {
                Ok(sheet) => {
                    for entry in sheet.entries() {
                        println!(
                            "  {:>6}  {}  {}",
                            entry.attendance_id,
                            if entry.came { "+" } else { "-" },
                            entry.name
                        );
                    }
                }
                Err(e) => println!("  {}", e),
            }
        }
        Commands::CreateLesson {
            group_id,
            room_id,
            fakultet,
            date,
            subject,
            time_at,
            lesson_type,
            image,
        } => {
            let lesson = NewLesson {
                group_id,
                room_id,
                date: date.unwrap_or_else(|| Local::now().date_naive()),
                fakultet,
                subject_name: subject,
                time_at,
                lesson_type,
                image: image.map(FileUpload::from_path),
            };
            let created = api.create_lesson(lesson).await?;
            println!("{}", lesson_line(&LessonView::from(&created)));
        }
        Commands::Search {
            kind,
            query,
            fakultet,
        } => {
            let options = api
                .search(kind, query.as_deref(), fakultet.as_deref())
                .await?;
            for option in options {
                match option.fakultet {
                    Some(fakultet) => println!("{:>6}  {}  ({})", option.id, option.name, fakultet),
                    None => println!("{:>6}  {}", option.id, option.name),
                }
            }
        }
        Commands::Attend {
            lesson_id,
            photo,
            absent,
        } => {
            let lesson = api.fetch_lesson(lesson_id).await?;
            let mut sheet = AttendanceSheet::from_lesson(&lesson)?;
            for id in absent {
                if !sheet.set(id, false) {
                    tracing::warn!("Attendance record {} not in lesson {}", id, lesson_id);
                    eprintln!("Ogohlantirish: {} yozuvi topilmadi", id);
                }
            }
            sheet.set_photo(Some(FileUpload::from_path(photo)));
            let message = api.save_attendance(sheet.submission()).await?;
            println!(
                "{} ({} keldi, {} kelmadi)",
                message,
                sheet.present_count(),
                sheet.absent_count()
            );
        }
    }

    Ok(())
}

fn lesson_line(lesson: &LessonView) -> String {
    format!(
        "{:>6}  {:<12} {} [{}]  {}  {}",
        lesson.id, lesson.start, lesson.subject, lesson.kind, lesson.room, lesson.group
    )
}

/// Read a secret without echoing it.
fn read_password(label: &str) -> Result<String> {
    prompt_password(format!("{}: ", label)).context("Failed to read password")
}

fn or_else_read(
    value: Option<String>,
    label: &str,
    read: impl FnOnce(&str) -> Result<String>,
) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => read(label),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
