//! Course repository and the Group↔Course association.
//!
//! The author is read through a join that is itself scoped to the lecturer
//! role, so a course never exposes a student's details as its author.

use sqlx::{Row, SqlitePool};

use super::lecturers::ensure_lecturer;
use super::store::{ensure_affected, flag, not_found, require_id};
use crate::errors::{AppError, DbResultExt};
use crate::models::{Course, Lecturer, Role};

const AUTHOR_ROLE: Role = Role::Lecturer;

#[derive(Clone)]
pub struct CourseRepository {
    pool: SqlitePool,
}

impl CourseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all courses.
    pub async fn list_all(&self) -> Result<Vec<Course>, AppError> {
        tracing::debug!("list courses");
        let rows = sqlx::query(
            r#"SELECT c.course_id, c.name, c.description, c.author_id, c.active,
                      a.first_name AS author_first_name, a.last_name AS author_last_name,
                      a.email AS author_email, a.comment AS author_comment, a.active AS author_active
               FROM courses c
               LEFT JOIN persons a ON a.person_id = c.author_id AND a.role = ?
               ORDER BY c.course_id"#,
        )
        .bind(AUTHOR_ROLE.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| "list courses")?;

        Ok(rows.iter().map(course_from_row).collect())
    }

    /// Get a course by ID, with its author filled in.
    pub async fn get_by_id(&self, id: i64) -> Result<Course, AppError> {
        tracing::debug!("get course {}", id);
        let row = sqlx::query(
            r#"SELECT c.course_id, c.name, c.description, c.author_id, c.active,
                      a.first_name AS author_first_name, a.last_name AS author_last_name,
                      a.email AS author_email, a.comment AS author_comment, a.active AS author_active
               FROM courses c
               LEFT JOIN persons a ON a.person_id = c.author_id AND a.role = ?
               WHERE c.course_id = ?"#,
        )
        .bind(AUTHOR_ROLE.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("get course {}", id))?;

        row.as_ref()
            .map(course_from_row)
            .ok_or_else(|| not_found("Course", id))
    }

    /// Courses authored by a lecturer.
    pub async fn list_by_author(&self, lecturer_id: i64) -> Result<Vec<Course>, AppError> {
        tracing::debug!("list courses of author {}", lecturer_id);
        let rows = sqlx::query(
            r#"SELECT c.course_id, c.name, c.description, c.author_id, c.active,
                      a.first_name AS author_first_name, a.last_name AS author_last_name,
                      a.email AS author_email, a.comment AS author_comment, a.active AS author_active
               FROM courses c
               JOIN persons a ON a.person_id = c.author_id AND a.role = ?
               WHERE c.author_id = ?
               ORDER BY c.course_id"#,
        )
        .bind(AUTHOR_ROLE.as_str())
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list courses of author {}", lecturer_id))?;

        Ok(rows.iter().map(course_from_row).collect())
    }

    /// Courses a group is assigned to.
    pub async fn list_by_group(&self, group_id: i64) -> Result<Vec<Course>, AppError> {
        tracing::debug!("list courses of group {}", group_id);
        let rows = sqlx::query(
            r#"SELECT c.course_id, c.name, c.description, c.author_id, c.active,
                      a.first_name AS author_first_name, a.last_name AS author_last_name,
                      a.email AS author_email, a.comment AS author_comment, a.active AS author_active
               FROM courses c
               JOIN group_courses gc ON gc.course_id = c.course_id
               LEFT JOIN persons a ON a.person_id = c.author_id AND a.role = ?
               WHERE gc.group_id = ?
               ORDER BY c.course_id"#,
        )
        .bind(AUTHOR_ROLE.as_str())
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list courses of group {}", group_id))?;

        Ok(rows.iter().map(course_from_row).collect())
    }

    /// Courses a student attends through their group.
    pub async fn list_by_student(&self, student_id: i64) -> Result<Vec<Course>, AppError> {
        tracing::debug!("list courses of student {}", student_id);
        let rows = sqlx::query(
            r#"SELECT c.course_id, c.name, c.description, c.author_id, c.active,
                      a.first_name AS author_first_name, a.last_name AS author_last_name,
                      a.email AS author_email, a.comment AS author_comment, a.active AS author_active
               FROM courses c
               JOIN group_courses gc ON gc.course_id = c.course_id
               JOIN student_groups sg ON sg.group_id = gc.group_id
               LEFT JOIN persons a ON a.person_id = c.author_id AND a.role = ?
               WHERE sg.student_id = ?
               ORDER BY c.course_id"#,
        )
        .bind(AUTHOR_ROLE.as_str())
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list courses of student {}", student_id))?;

        Ok(rows.iter().map(course_from_row).collect())
    }

    /// Insert a course and return it with the generated id.
    ///
    /// A non-empty author must be a stored lecturer.
    pub async fn add(&self, course: &Course) -> Result<Course, AppError> {
        let mut tx = self.pool.begin().await.with_context(|| "add course")?;
        ensure_lecturer(&mut *tx, &course.author).await?;

        let result = sqlx::query(
            "INSERT INTO courses (name, description, author_id, active) VALUES (?, ?, ?, ?)",
        )
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.author.id)
        .bind(course.active as i32)
        .execute(&mut *tx)
        .await
        .with_context(|| "add course")?;

        let id = result.last_insert_rowid();
        tx.commit()
            .await
            .with_context(|| format!("add course {}", id))?;
        tracing::info!("added course {}", id);

        Ok(Course {
            id: Some(id),
            ..course.clone()
        })
    }

    /// Update a course. Assigned groups are maintained separately.
    pub async fn update(&self, course: &Course) -> Result<(), AppError> {
        let id = require_id(course.id, "Course")?;
        tracing::info!("update course {}", id);

        let mut tx = self
            .pool
            .begin()
            .await
            .with_context(|| format!("update course {}", id))?;
        ensure_lecturer(&mut *tx, &course.author).await?;

        let result = sqlx::query(
            "UPDATE courses SET name = ?, description = ?, author_id = ?, active = ? WHERE course_id = ?",
        )
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.author.id)
        .bind(course.active as i32)
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("update course {}", id))?;

        ensure_affected(&result, "Course", id)?;
        tx.commit()
            .await
            .with_context(|| format!("update course {}", id))
    }

    /// Soft-delete a course.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        tracing::info!("delete course {}", id);

        let result = sqlx::query("UPDATE courses SET active = 0 WHERE course_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete course {}", id))?;

        ensure_affected(&result, "Course", id)
    }

    /// Add a (group, course) pair. Returns `false` if it was already present.
    pub async fn assign_group(&self, group_id: i64, course_id: i64) -> Result<bool, AppError> {
        tracing::debug!("assign group {} to course {}", group_id, course_id);

        let result = sqlx::query(
            "INSERT INTO group_courses (group_id, course_id) VALUES (?, ?) ON CONFLICT (group_id, course_id) DO NOTHING",
        )
        .bind(group_id)
        .bind(course_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("assign group {} to course {}", group_id, course_id))?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a (group, course) pair. Returns `false` if it was not present.
    pub async fn remove_group(&self, group_id: i64, course_id: i64) -> Result<bool, AppError> {
        tracing::debug!("remove group {} from course {}", group_id, course_id);

        let result = sqlx::query("DELETE FROM group_courses WHERE group_id = ? AND course_id = ?")
            .bind(group_id)
            .bind(course_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("remove group {} from course {}", group_id, course_id))?;

        Ok(result.rows_affected() > 0)
    }
}

fn course_from_row(row: &sqlx::sqlite::SqliteRow) -> Course {
    let active: i32 = row.get("active");
    let author_id: Option<i64> = row.get("author_id");
    let author_first_name: Option<String> = row.get("author_first_name");

    // A dangling or non-lecturer author id keeps only the id
    let author = match (author_id, author_first_name) {
        (Some(author_id), Some(first_name)) => {
            let author_active: Option<i32> = row.get("author_active");
            let last_name: Option<String> = row.get("author_last_name");
            Lecturer {
                id: Some(author_id),
                first_name,
                last_name: last_name.unwrap_or_default(),
                email: row.get("author_email"),
                comment: row.get("author_comment"),
                active: author_active.map(flag).unwrap_or(true),
            }
        }
        (Some(author_id), None) => Lecturer::with_id(author_id),
        (None, _) => Lecturer::empty(),
    };

    Course {
        id: Some(row.get("course_id")),
        name: row.get("name"),
        description: row.get("description"),
        author,
        active: flag(active),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::{GroupRepository, LecturerRepository, StudentRepository};
    use crate::models::{Group, Student};

    #[tokio::test]
    async fn test_course_author_round_trip() {
        let (pool, _temp_dir) = test_pool().await;
        let courses = CourseRepository::new(pool.clone());
        let lecturers = LecturerRepository::new(pool);

        let author = lecturers.add(&Lecturer::new("Alan", "Turing")).await.unwrap();
        let course = courses
            .add(&Course::new("Computability", author.clone()))
            .await
            .unwrap();
        let orphan = courses
            .add(&Course::new("Self Study", Lecturer::empty()))
            .await
            .unwrap();

        assert_eq!(courses.get_by_id(course.id.unwrap()).await.unwrap().author, author);
        assert!(courses
            .get_by_id(orphan.id.unwrap())
            .await
            .unwrap()
            .author
            .is_empty());

        let authored = courses.list_by_author(author.id.unwrap()).await.unwrap();
        assert_eq!(authored.len(), 1);
        assert_eq!(authored[0].id, course.id);
    }

    #[tokio::test]
    async fn test_course_soft_delete_keeps_row() {
        let (pool, _temp_dir) = test_pool().await;
        let courses = CourseRepository::new(pool);

        let course = courses
            .add(&Course::new("Logic", Lecturer::empty()))
            .await
            .unwrap();
        let id = course.id.unwrap();
        courses.delete(id).await.unwrap();

        assert!(!courses.get_by_id(id).await.unwrap().active);
        assert_eq!(courses.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_author_is_constraint_violation() {
        let (pool, _temp_dir) = test_pool().await;
        let courses = CourseRepository::new(pool);

        let result = courses
            .add(&Course::new("Ghost Course", Lecturer::with_id(404)))
            .await;
        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_student_is_not_accepted_as_author() {
        let (pool, _temp_dir) = test_pool().await;
        let courses = CourseRepository::new(pool.clone());
        let lecturers = LecturerRepository::new(pool.clone());
        let students = StudentRepository::new(pool);

        let student = students.add(&Student::new("Sam", "Student")).await.unwrap();
        let student_id = student.id.unwrap();

        let result = courses
            .add(&Course::new("Hijack", Lecturer::with_id(student_id)))
            .await;
        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
        assert!(courses.list_all().await.unwrap().is_empty());

        let author = lecturers.add(&Lecturer::new("Ada", "Byron")).await.unwrap();
        let mut course = courses
            .add(&Course::new("Analytical Engines", author.clone()))
            .await
            .unwrap();
        course.author = Lecturer::with_id(student_id);
        assert!(matches!(
            courses.update(&course).await,
            Err(AppError::ConstraintViolation(_))
        ));

        let stored = courses.get_by_id(course.id.unwrap()).await.unwrap();
        assert_eq!(stored.author, author);
        assert!(courses.list_by_author(student_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_assignment_pairs() {
        let (pool, _temp_dir) = test_pool().await;
        let courses = CourseRepository::new(pool.clone());
        let groups = GroupRepository::new(pool.clone());
        let students = StudentRepository::new(pool);

        let course = courses
            .add(&Course::new("Algebra", Lecturer::empty()))
            .await
            .unwrap();
        let group = groups.add(&Group::new("AA-01")).await.unwrap();
        let (course_id, group_id) = (course.id.unwrap(), group.id.unwrap());

        assert!(courses.assign_group(group_id, course_id).await.unwrap());
        assert!(!courses.assign_group(group_id, course_id).await.unwrap());

        let mut student = Student::new("Ann", "Lee");
        student.group = group.clone();
        let student = students.add(&student).await.unwrap();
        let attended = courses.list_by_student(student.id.unwrap()).await.unwrap();
        assert_eq!(attended.len(), 1);
        assert_eq!(courses.list_by_group(group_id).await.unwrap().len(), 1);

        assert!(courses.remove_group(group_id, course_id).await.unwrap());
        assert!(!courses.remove_group(group_id, course_id).await.unwrap());
        assert!(courses.list_by_group(group_id).await.unwrap().is_empty());

        let result = courses.assign_group(999, course_id).await;
        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
    }
}
