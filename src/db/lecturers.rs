//! Lecturer repository over the shared `persons` table.
//!
//! Every statement, reads and writes alike, carries `role = 'LECTURER'` in its
//! predicate. A student's id is therefore indistinguishable from a missing id.

use sqlx::{Executor, Row, Sqlite, SqlitePool};

use super::store::{ensure_affected, flag, not_found, require_id};
use crate::errors::{AppError, DbResultExt};
use crate::models::{Lecturer, Role};

const ROLE: Role = Role::Lecturer;

/// Role-scoped access to lecturers.
#[derive(Clone)]
pub struct LecturerRepository {
    pool: SqlitePool,
}

impl LecturerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all lecturers, active or not.
    pub async fn list_all(&self) -> Result<Vec<Lecturer>, AppError> {
        tracing::debug!("list lecturers");
        let rows = sqlx::query(
            "SELECT person_id, first_name, last_name, email, comment, active FROM persons WHERE role = ? ORDER BY person_id",
        )
        .bind(ROLE.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| "list lecturers")?;

        Ok(rows.iter().map(lecturer_from_row).collect())
    }

    /// Get a lecturer by ID. A row of another role is reported as not found.
    pub async fn get_by_id(&self, id: i64) -> Result<Lecturer, AppError> {
        tracing::debug!("get lecturer {}", id);
        let row = sqlx::query(
            "SELECT person_id, first_name, last_name, email, comment, active FROM persons WHERE person_id = ? AND role = ?",
        )
        .bind(id)
        .bind(ROLE.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("get lecturer {}", id))?;

        row.as_ref()
            .map(lecturer_from_row)
            .ok_or_else(|| not_found("Lecturer", id))
    }

    /// Insert a lecturer and return it with the generated id.
    pub async fn add(&self, lecturer: &Lecturer) -> Result<Lecturer, AppError> {
        let result = sqlx::query(
            "INSERT INTO persons (first_name, last_name, email, comment, role, active) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&lecturer.first_name)
        .bind(&lecturer.last_name)
        .bind(&lecturer.email)
        .bind(&lecturer.comment)
        .bind(ROLE.as_str())
        .bind(lecturer.active as i32)
        .execute(&self.pool)
        .await
        .with_context(|| "add lecturer")?;

        let id = result.last_insert_rowid();
        tracing::info!("added lecturer {}", id);

        Ok(Lecturer {
            id: Some(id),
            ..lecturer.clone()
        })
    }

    /// Update a lecturer. Leaves rows of other roles untouched and reports them as not found.
    pub async fn update(&self, lecturer: &Lecturer) -> Result<(), AppError> {
        let id = require_id(lecturer.id, "Lecturer")?;
        tracing::info!("update lecturer {}", id);

        let result = sqlx::query(
            "UPDATE persons SET first_name = ?, last_name = ?, email = ?, comment = ?, active = ? WHERE person_id = ? AND role = ?",
        )
        .bind(&lecturer.first_name)
        .bind(&lecturer.last_name)
        .bind(&lecturer.email)
        .bind(&lecturer.comment)
        .bind(lecturer.active as i32)
        .bind(id)
        .bind(ROLE.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("update lecturer {}", id))?;

        ensure_affected(&result, "Lecturer", id)
    }

    /// Soft-delete a lecturer by clearing its active flag.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        tracing::info!("delete lecturer {}", id);

        let result = sqlx::query("UPDATE persons SET active = 0 WHERE person_id = ? AND role = ?")
            .bind(id)
            .bind(ROLE.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete lecturer {}", id))?;

        ensure_affected(&result, "Lecturer", id)
    }
}

/// Check that a lecturer reference held by another row names a stored
/// lecturer. The empty lecturer passes; a student's id does not.
///
/// Roles never change and persons are only soft-deleted, so the answer holds
/// until the caller's write commits.
pub(crate) async fn ensure_lecturer<'e, E>(executor: E, lecturer: &Lecturer) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let Some(id) = lecturer.id else {
        return Ok(());
    };

    let found = sqlx::query("SELECT 1 FROM persons WHERE person_id = ? AND role = ?")
        .bind(id)
        .bind(ROLE.as_str())
        .fetch_optional(executor)
        .await
        .with_context(|| format!("check lecturer {}", id))?;

    if found.is_none() {
        tracing::warn!("person {} is not a lecturer", id);
        return Err(AppError::ConstraintViolation(format!(
            "Person {} is not a lecturer",
            id
        )));
    }
    Ok(())
}

fn lecturer_from_row(row: &sqlx::sqlite::SqliteRow) -> Lecturer {
    let active: i32 = row.get("active");
    Lecturer {
        id: Some(row.get("person_id")),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        comment: row.get("comment"),
        active: flag(active),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::StudentRepository;
    use crate::models::Student;

    /// Raw `persons` row, read without any role filter.
    async fn raw_person(
        pool: &SqlitePool,
        id: i64,
    ) -> (i64, String, String, Option<String>, Option<String>, String, i32) {
        let row = sqlx::query(
            "SELECT person_id, first_name, last_name, email, comment, role, active FROM persons WHERE person_id = ?",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
        (
            row.get("person_id"),
            row.get("first_name"),
            row.get("last_name"),
            row.get("email"),
            row.get("comment"),
            row.get("role"),
            row.get("active"),
        )
    }

    #[tokio::test]
    async fn test_lecturer_crud() {
        let (pool, _temp_dir) = test_pool().await;
        let repo = LecturerRepository::new(pool);

        let mut lecturer = Lecturer::new("Grace", "Hopper");
        lecturer.email = Some("grace@example.edu".to_string());
        let stored = repo.add(&lecturer).await.unwrap();
        let id = stored.id.unwrap();

        assert_eq!(repo.get_by_id(id).await.unwrap(), stored);

        let mut changed = stored.clone();
        changed.last_name = "Murray Hopper".to_string();
        repo.update(&changed).await.unwrap();
        assert_eq!(repo.get_by_id(id).await.unwrap().last_name, "Murray Hopper");

        repo.delete(id).await.unwrap();
        let deleted = repo.get_by_id(id).await.unwrap();
        assert!(!deleted.active);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generated_ids_are_not_reused() {
        let (pool, _temp_dir) = test_pool().await;
        let repo = LecturerRepository::new(pool.clone());

        let first = repo.add(&Lecturer::new("A", "One")).await.unwrap().id.unwrap();
        sqlx::query("DELETE FROM persons WHERE person_id = ?")
            .bind(first)
            .execute(&pool)
            .await
            .unwrap();
        let second = repo.add(&Lecturer::new("B", "Two")).await.unwrap().id.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_update_without_id_is_invalid_argument() {
        let (pool, _temp_dir) = test_pool().await;
        let repo = LecturerRepository::new(pool);

        let result = repo.update(&Lecturer::new("No", "Id")).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_student_rows_are_invisible_and_inert() {
        let (pool, _temp_dir) = test_pool().await;
        let lecturers = LecturerRepository::new(pool.clone());
        let students = StudentRepository::new(pool.clone());

        let mut student = Student::new("Sam", "Student");
        student.email = Some("sam@example.edu".to_string());
        student.comment = Some("exchange".to_string());
        let student = students.add(&student).await.unwrap();
        let student_id = student.id.unwrap();
        let before = raw_person(&pool, student_id).await;

        assert!(matches!(
            lecturers.get_by_id(student_id).await,
            Err(AppError::NotFound(_))
        ));

        let mut impostor = Lecturer::new("Mallory", "Overwrite");
        impostor.id = Some(student_id);
        impostor.email = Some("mallory@example.edu".to_string());
        impostor.comment = Some("overwritten".to_string());
        impostor.active = false;
        assert!(matches!(
            lecturers.update(&impostor).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            lecturers.delete(student_id).await,
            Err(AppError::NotFound(_))
        ));

        assert_eq!(raw_person(&pool, student_id).await, before);
        assert!(lecturers.list_all().await.unwrap().is_empty());
    }
}
