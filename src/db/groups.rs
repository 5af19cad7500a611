//! Group repository.

use sqlx::{Row, SqlitePool};

use super::store::{ensure_affected, flag, not_found, require_id};
use crate::errors::{AppError, DbResultExt};
use crate::models::Group;

#[derive(Clone)]
pub struct GroupRepository {
    pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all groups.
    pub async fn list_all(&self) -> Result<Vec<Group>, AppError> {
        tracing::debug!("list groups");
        let rows = sqlx::query("SELECT group_id, name, comment, active FROM groups ORDER BY group_id")
            .fetch_all(&self.pool)
            .await
            .with_context(|| "list groups")?;

        Ok(rows.iter().map(group_from_row).collect())
    }

    /// Get a group by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Group, AppError> {
        tracing::debug!("get group {}", id);
        let row = sqlx::query("SELECT group_id, name, comment, active FROM groups WHERE group_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("get group {}", id))?;

        row.as_ref()
            .map(group_from_row)
            .ok_or_else(|| not_found("Group", id))
    }

    /// Groups currently assigned to a course.
    pub async fn list_by_course(&self, course_id: i64) -> Result<Vec<Group>, AppError> {
        tracing::debug!("list groups of course {}", course_id);
        let rows = sqlx::query(
            r#"SELECT g.group_id, g.name, g.comment, g.active
               FROM groups g
               JOIN group_courses gc ON gc.group_id = g.group_id
               WHERE gc.course_id = ?
               ORDER BY g.group_id"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("list groups of course {}", course_id))?;

        Ok(rows.iter().map(group_from_row).collect())
    }

    /// Insert a group and return it with the generated id.
    pub async fn add(&self, group: &Group) -> Result<Group, AppError> {
        let result = sqlx::query("INSERT INTO groups (name, comment, active) VALUES (?, ?, ?)")
            .bind(&group.name)
            .bind(&group.comment)
            .bind(group.active as i32)
            .execute(&self.pool)
            .await
            .with_context(|| "add group")?;

        let id = result.last_insert_rowid();
        tracing::info!("added group {}", id);

        Ok(Group {
            id: Some(id),
            ..group.clone()
        })
    }

    pub async fn update(&self, group: &Group) -> Result<(), AppError> {
        let id = require_id(group.id, "Group")?;
        tracing::info!("update group {}", id);

        let result =
            sqlx::query("UPDATE groups SET name = ?, comment = ?, active = ? WHERE group_id = ?")
                .bind(&group.name)
                .bind(&group.comment)
                .bind(group.active as i32)
                .bind(id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("update group {}", id))?;

        ensure_affected(&result, "Group", id)
    }

    /// Soft-delete a group. Memberships and course assignments stay.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        tracing::info!("delete group {}", id);

        let result = sqlx::query("UPDATE groups SET active = 0 WHERE group_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete group {}", id))?;

        ensure_affected(&result, "Group", id)
    }
}

fn group_from_row(row: &sqlx::sqlite::SqliteRow) -> Group {
    let active: i32 = row.get("active");
    Group {
        id: Some(row.get("group_id")),
        name: row.get("name"),
        comment: row.get("comment"),
        active: flag(active),
    }
}
