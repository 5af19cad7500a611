//! Student repository over the shared `persons` table.
//!
//! Like the lecturer repository, every statement is scoped with
//! `role = 'STUDENT'`. Group membership lives in `student_groups`, keyed by
//! student id, so a student has at most one group.

use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::store::{ensure_affected, flag, not_found, require_id};
use crate::errors::{AppError, DbResultExt};
use crate::models::{Group, Role, Student};

const ROLE: Role = Role::Student;

/// Role-scoped access to students and their group membership.
#[derive(Clone)]
pub struct StudentRepository {
    pool: SqlitePool,
}

impl StudentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all students, active or not.
    pub async fn list_all(&self) -> Result<Vec<Student>, AppError> {
        tracing::debug!("list students");
        let rows = sqlx::query(
            r#"SELECT p.person_id, p.first_name, p.last_name, p.email, p.comment, p.active,
                      g.group_id, g.name AS group_name, g.comment AS group_comment, g.active AS group_active
               FROM persons p
               LEFT JOIN student_groups sg ON sg.student_id = p.person_id
               LEFT JOIN groups g ON g.group_id = sg.group_id
               WHERE p.role = ?
               ORDER BY p.person_id"#,
        )
        .bind(ROLE.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| "list students")?;

        Ok(rows.iter().map(student_from_row).collect())
    }

    /// Get a student by ID. A row of another role is reported as not found.
    pub async fn get_by_id(&self, id: i64) -> Result<Student, AppError> {
        tracing::debug!("get student {}", id);
        let row = sqlx::query(
            r#"SELECT p.person_id, p.first_name, p.last_name, p.email, p.comment, p.active,
                      g.group_id, g.name AS group_name, g.comment AS group_comment, g.active AS group_active
               FROM persons p
               LEFT JOIN student_groups sg ON sg.student_id = p.person_id
               LEFT JOIN groups g ON g.group_id = sg.group_id
               WHERE p.person_id = ? AND p.role = ?"#,
        )
        .bind(id)
        .bind(ROLE.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("get student {}", id))?;

        row.as_ref()
            .map(student_from_row)
            .ok_or_else(|| not_found("Student", id))
    }

    /// Students whose membership points at `group_id`.
    pub async fn list_by_group(&self, group_id: i64) -> Result<Vec<Student>, AppError> {
        tracing::debug!("list students of group {}", group_id);
        let rows = sqlx::query(
            r#"SELECT p.person_id, p.first_name, p.last_name, p.email, p.comment, p.active,
                      g.group_id, g.name AS group_name, g.comment AS group_comment, g.active AS group_active
               FROM persons p
               JOIN student_groups sg ON sg.student_id = p.person_id
               JOIN groups g ON g.group_id = sg.group_id
               WHERE sg.group_id = ? AND p.role = ?
               ORDER BY p.person_id"#,
        )
        .bind(group_id)
        .bind(ROLE.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list students of group {}", group_id))?;

        Ok(rows.iter().map(student_from_row).collect())
    }

    /// Insert a student and, if it has a group, its membership.
    pub async fn add(&self, student: &Student) -> Result<Student, AppError> {
        let mut tx = self.pool.begin().await.with_context(|| "add student")?;

        let result = sqlx::query(
            "INSERT INTO persons (first_name, last_name, email, comment, role, active) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.email)
        .bind(&student.comment)
        .bind(ROLE.as_str())
        .bind(student.active as i32)
        .execute(&mut *tx)
        .await
        .with_context(|| "add student")?;

        let id = result.last_insert_rowid();
        apply_group(&mut tx, id, &student.group).await?;
        tx.commit()
            .await
            .with_context(|| format!("add student {}", id))?;

        tracing::info!("added student {}", id);
        Ok(Student {
            id: Some(id),
            ..student.clone()
        })
    }

    /// Update a student and replace its membership with `student.group`.
    ///
    /// The membership is only touched once the role-scoped person update
    /// matched a row, so a lecturer id leaves every table unchanged.
    pub async fn update(&self, student: &Student) -> Result<(), AppError> {
        let id = require_id(student.id, "Student")?;
        tracing::info!("update student {}", id);

        let mut tx = self
            .pool
            .begin()
            .await
            .with_context(|| format!("update student {}", id))?;

        let result = sqlx::query(
            "UPDATE persons SET first_name = ?, last_name = ?, email = ?, comment = ?, active = ? WHERE person_id = ? AND role = ?",
        )
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.email)
        .bind(&student.comment)
        .bind(student.active as i32)
        .bind(id)
        .bind(ROLE.as_str())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("update student {}", id))?;

        ensure_affected(&result, "Student", id)?;
        apply_group(&mut tx, id, &student.group).await?;

        tx.commit()
            .await
            .with_context(|| format!("update student {}", id))
    }

    /// Soft-delete a student. The group membership is kept.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        tracing::info!("delete student {}", id);

        let result = sqlx::query("UPDATE persons SET active = 0 WHERE person_id = ? AND role = ?")
            .bind(id)
            .bind(ROLE.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete student {}", id))?;

        ensure_affected(&result, "Student", id)
    }
}

/// Upsert the membership for a non-empty group, remove it for the empty group.
async fn apply_group(
    tx: &mut Transaction<'_, Sqlite>,
    student_id: i64,
    group: &Group,
) -> Result<(), AppError> {
    match group.id {
        Some(group_id) => {
            sqlx::query(
                "INSERT INTO student_groups (student_id, group_id) VALUES (?, ?) ON CONFLICT (student_id) DO UPDATE SET group_id = excluded.group_id",
            )
            .bind(student_id)
            .bind(group_id)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("assign student {} to group {}", student_id, group_id))?;
        }
        None => {
            sqlx::query("DELETE FROM student_groups WHERE student_id = ?")
                .bind(student_id)
                .execute(&mut **tx)
                .await
                .with_context(|| format!("clear group of student {}", student_id))?;
        }
    }
    Ok(())
}

fn student_from_row(row: &sqlx::sqlite::SqliteRow) -> Student {
    let active: i32 = row.get("active");
    let group_id: Option<i64> = row.get("group_id");
    let group = match group_id {
        Some(group_id) => {
            let group_name: Option<String> = row.get("group_name");
            let group_active: Option<i32> = row.get("group_active");
            Group {
                id: Some(group_id),
                name: group_name.unwrap_or_default(),
                comment: row.get("group_comment"),
                active: group_active.map(flag).unwrap_or(true),
            }
        }
        None => Group::empty(),
    };

    Student {
        id: Some(row.get("person_id")),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        comment: row.get("comment"),
        active: flag(active),
        group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::{GroupRepository, LecturerRepository};
    use crate::models::Lecturer;

    async fn membership_rows(pool: &SqlitePool) -> Vec<(i64, i64)> {
        sqlx::query("SELECT student_id, group_id FROM student_groups ORDER BY student_id")
            .fetch_all(pool)
            .await
            .unwrap()
            .iter()
            .map(|row| (row.get("student_id"), row.get("group_id")))
            .collect()
    }

    #[tokio::test]
    async fn test_student_group_is_single_valued() {
        let (pool, _temp_dir) = test_pool().await;
        let students = StudentRepository::new(pool.clone());
        let groups = GroupRepository::new(pool.clone());

        let g1 = groups.add(&Group::new("AA-01")).await.unwrap();
        let g2 = groups.add(&Group::new("BB-02")).await.unwrap();

        let mut student = Student::new("Ann", "Lee");
        student.group = g1.clone();
        let mut student = students.add(&student).await.unwrap();
        let id = student.id.unwrap();
        assert_eq!(students.get_by_id(id).await.unwrap().group.id, g1.id);

        student.group = g2.clone();
        students.update(&student).await.unwrap();
        let reloaded = students.get_by_id(id).await.unwrap();
        assert_eq!(reloaded.group.id, g2.id);
        assert_eq!(reloaded.group.name, "BB-02");
        assert_eq!(membership_rows(&pool).await, vec![(id, g2.id.unwrap())]);

        student.group = Group::empty();
        students.update(&student).await.unwrap();
        assert!(students.get_by_id(id).await.unwrap().group.is_empty());
        assert!(membership_rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_group() {
        let (pool, _temp_dir) = test_pool().await;
        let students = StudentRepository::new(pool.clone());
        let groups = GroupRepository::new(pool.clone());

        let group = groups.add(&Group::new("AA-01")).await.unwrap();
        let mut member = Student::new("In", "Group");
        member.group = group.clone();
        let member = students.add(&member).await.unwrap();
        students.add(&Student::new("No", "Group")).await.unwrap();

        let listed = students.list_by_group(group.id.unwrap()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, member.id);
        assert_eq!(students.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_group_is_constraint_violation() {
        let (pool, _temp_dir) = test_pool().await;
        let students = StudentRepository::new(pool);

        let mut student = Student::new("Lost", "Student");
        student.group = Group::with_id(999);
        let result = students.add(&student).await;

        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
        assert!(students.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lecturer_rows_are_invisible_and_inert() {
        let (pool, _temp_dir) = test_pool().await;
        let students = StudentRepository::new(pool.clone());
        let lecturers = LecturerRepository::new(pool.clone());
        let groups = GroupRepository::new(pool.clone());

        let lecturer = lecturers.add(&Lecturer::new("Ada", "Lovelace")).await.unwrap();
        let lecturer_id = lecturer.id.unwrap();
        let group = groups.add(&Group::new("AA-01")).await.unwrap();

        let mut impostor = Student::new("Eve", "Overwrite");
        impostor.id = Some(lecturer_id);
        impostor.group = group;

        assert!(matches!(
            students.get_by_id(lecturer_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            students.update(&impostor).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            students.delete(lecturer_id).await,
            Err(AppError::NotFound(_))
        ));

        assert_eq!(lecturers.get_by_id(lecturer_id).await.unwrap(), lecturer);
        assert!(membership_rows(&pool).await.is_empty());
        assert!(students.list_all().await.unwrap().is_empty());
    }
}
