//! Lesson repository.
//!
//! Lessons reference their course, lecturer and time slot by id only; the
//! returned references carry just that id. Lessons are hard-deleted.

use sqlx::{Row, SqlitePool};

use super::lecturers::ensure_lecturer;
use super::store::{ensure_affected, not_found, require_id};
use crate::errors::{AppError, DbResultExt};
use crate::models::{Course, Lecturer, Lesson, TimeSlot};

#[derive(Clone)]
pub struct LessonRepository {
    pool: SqlitePool,
}

impl LessonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all lessons in chronological order.
    pub async fn list_all(&self) -> Result<Vec<Lesson>, AppError> {
        tracing::debug!("list lessons");
        let rows = sqlx::query(
            r#"SELECT lesson_id, course_id, lecturer_id, time_slot_id, lesson_date, start_time, end_time
               FROM lessons
               ORDER BY lesson_date, start_time, lesson_id"#,
        )
        .fetch_all(&self.pool)
        .await
        .with_context(|| "list lessons")?;

        Ok(rows.iter().map(lesson_from_row).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Lesson, AppError> {
        tracing::debug!("get lesson {}", id);
        let row = sqlx::query(
            r#"SELECT lesson_id, course_id, lecturer_id, time_slot_id, lesson_date, start_time, end_time
               FROM lessons
               WHERE lesson_id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("get lesson {}", id))?;

        row.as_ref()
            .map(lesson_from_row)
            .ok_or_else(|| not_found("Lesson", id))
    }

    /// Lessons assigned to a lecturer.
    pub async fn list_by_lecturer(&self, lecturer_id: i64) -> Result<Vec<Lesson>, AppError> {
        tracing::debug!("list lessons of lecturer {}", lecturer_id);
        let rows = sqlx::query(
            r#"SELECT lesson_id, course_id, lecturer_id, time_slot_id, lesson_date, start_time, end_time
               FROM lessons
               WHERE lecturer_id = ?
               ORDER BY lesson_date, start_time, lesson_id"#,
        )
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list lessons of lecturer {}", lecturer_id))?;

        Ok(rows.iter().map(lesson_from_row).collect())
    }

    pub async fn list_by_course(&self, course_id: i64) -> Result<Vec<Lesson>, AppError> {
        tracing::debug!("list lessons of course {}", course_id);
        let rows = sqlx::query(
            r#"SELECT lesson_id, course_id, lecturer_id, time_slot_id, lesson_date, start_time, end_time
               FROM lessons
               WHERE course_id = ?
               ORDER BY lesson_date, start_time, lesson_id"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list lessons of course {}", course_id))?;

        Ok(rows.iter().map(lesson_from_row).collect())
    }

    /// Lessons of every course the student's group is assigned to.
    pub async fn list_by_student(&self, student_id: i64) -> Result<Vec<Lesson>, AppError> {
        tracing::debug!("list lessons of student {}", student_id);
        let rows = sqlx::query(
            r#"SELECT l.lesson_id, l.course_id, l.lecturer_id, l.time_slot_id, l.lesson_date, l.start_time, l.end_time
               FROM lessons l
               JOIN group_courses gc ON gc.course_id = l.course_id
               JOIN student_groups sg ON sg.group_id = gc.group_id
               WHERE sg.student_id = ?
               ORDER BY l.lesson_date, l.start_time, l.lesson_id"#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list lessons of student {}", student_id))?;

        Ok(rows.iter().map(lesson_from_row).collect())
    }

    /// Insert a lesson as given. Use `LessonService::create_lesson` to fill
    /// lecturer and times from the course and time slot. A non-empty lecturer
    /// must be a stored lecturer.
    pub async fn add(&self, lesson: &Lesson) -> Result<Lesson, AppError> {
        let course_id = require_id(lesson.course.id, "Course")?;

        let mut tx = self
            .pool
            .begin()
            .await
            .with_context(|| format!("add lesson of course {}", course_id))?;
        ensure_lecturer(&mut *tx, &lesson.lecturer).await?;

        let result = sqlx::query(
            r#"INSERT INTO lessons (course_id, lecturer_id, time_slot_id, lesson_date, start_time, end_time)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(course_id)
        .bind(lesson.lecturer.id)
        .bind(lesson.time_slot.id)
        .bind(lesson.date)
        .bind(lesson.start_time)
        .bind(lesson.end_time)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("add lesson of course {}", course_id))?;

        let id = result.last_insert_rowid();
        tx.commit()
            .await
            .with_context(|| format!("add lesson {}", id))?;
        tracing::info!("added lesson {}", id);

        Ok(Lesson {
            id: Some(id),
            ..lesson.clone()
        })
    }

    /// Update a lesson, writing lecturer and times exactly as given.
    pub async fn update(&self, lesson: &Lesson) -> Result<(), AppError> {
        let id = require_id(lesson.id, "Lesson")?;
        let course_id = require_id(lesson.course.id, "Course")?;
        tracing::info!("update lesson {}", id);

        let mut tx = self
            .pool
            .begin()
            .await
            .with_context(|| format!("update lesson {}", id))?;
        ensure_lecturer(&mut *tx, &lesson.lecturer).await?;

        let result = sqlx::query(
            r#"UPDATE lessons
               SET course_id = ?, lecturer_id = ?, time_slot_id = ?, lesson_date = ?, start_time = ?, end_time = ?
               WHERE lesson_id = ?"#,
        )
        .bind(course_id)
        .bind(lesson.lecturer.id)
        .bind(lesson.time_slot.id)
        .bind(lesson.date)
        .bind(lesson.start_time)
        .bind(lesson.end_time)
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("update lesson {}", id))?;

        ensure_affected(&result, "Lesson", id)?;
        tx.commit()
            .await
            .with_context(|| format!("update lesson {}", id))
    }

    /// Remove the lesson row.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        tracing::info!("delete lesson {}", id);

        let result = sqlx::query("DELETE FROM lessons WHERE lesson_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete lesson {}", id))?;

        ensure_affected(&result, "Lesson", id)
    }
}

fn lesson_from_row(row: &sqlx::sqlite::SqliteRow) -> Lesson {
    let lecturer_id: Option<i64> = row.get("lecturer_id");
    let time_slot_id: Option<i64> = row.get("time_slot_id");

    Lesson {
        id: Some(row.get("lesson_id")),
        course: Course::with_id(row.get("course_id")),
        lecturer: lecturer_id.map_or_else(Lecturer::empty, Lecturer::with_id),
        date: row.get("lesson_date"),
        time_slot: time_slot_id.map_or_else(TimeSlot::empty, TimeSlot::with_id),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
    }
}
