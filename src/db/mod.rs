//! Database module for SQLite persistence.
//!
//! Each entity has its own repository over a shared `SqlitePool`. Lecturers
//! and students are two independent repositories over the one `persons` table.

mod courses;
mod groups;
mod lecturers;
mod lessons;
mod store;
mod students;
mod time_slots;

pub use courses::CourseRepository;
pub use groups::GroupRepository;
pub use lecturers::LecturerRepository;
pub use lessons::LessonRepository;
pub use store::require_id;
pub use students::StudentRepository;
pub use time_slots::TimeSlotRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and create the schema.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create tables, triggers and indexes if they don't exist.
async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // AUTOINCREMENT keeps SQLite from handing out the id of a removed row again
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            person_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            comment TEXT,
            role TEXT NOT NULL CHECK (role IN ('STUDENT', 'LECTURER')),
            active INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS persons_role_immutable
        BEFORE UPDATE OF role ON persons
        WHEN NEW.role <> OLD.role
        BEGIN
            SELECT RAISE(ABORT, 'person role is immutable');
        END;
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            group_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            comment TEXT,
            active INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student_groups (
            student_id INTEGER PRIMARY KEY REFERENCES persons(person_id),
            group_id INTEGER NOT NULL REFERENCES groups(group_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            course_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            author_id INTEGER REFERENCES persons(person_id),
            active INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_courses (
            group_id INTEGER NOT NULL REFERENCES groups(group_id),
            course_id INTEGER NOT NULL REFERENCES courses(course_id),
            PRIMARY KEY (group_id, course_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS time_slots (
            time_slot_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            comment TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            lesson_id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL REFERENCES courses(course_id),
            lecturer_id INTEGER REFERENCES persons(person_id),
            time_slot_id INTEGER REFERENCES time_slots(time_slot_id),
            lesson_date TEXT NOT NULL,
            start_time TEXT,
            end_time TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for the role filter and the back-reference queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_persons_role ON persons(role);
        CREATE INDEX IF NOT EXISTS idx_student_groups_group_id ON student_groups(group_id);
        CREATE INDEX IF NOT EXISTS idx_group_courses_course_id ON group_courses(course_id);
        CREATE INDEX IF NOT EXISTS idx_courses_author_id ON courses(author_id);
        CREATE INDEX IF NOT EXISTS idx_lessons_course_id ON lessons(course_id);
        CREATE INDEX IF NOT EXISTS idx_lessons_lecturer_id ON lessons(lecturer_id);
        CREATE INDEX IF NOT EXISTS idx_lessons_time_slot_id ON lessons(time_slot_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    use super::init_database;

    /// A fresh database in a temporary directory; keep the `TempDir` alive.
    pub async fn test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (pool, temp_dir)
    }
}
