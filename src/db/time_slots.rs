//! Time slot repository.
//!
//! Time slots are hard-deleted. Lessons that referenced a deleted slot keep
//! their own start and end times and lose only the slot reference.

use sqlx::{Row, SqlitePool};

use super::store::{ensure_affected, not_found, require_id};
use crate::errors::{AppError, DbResultExt};
use crate::models::TimeSlot;

#[derive(Clone)]
pub struct TimeSlotRepository {
    pool: SqlitePool,
}

impl TimeSlotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all time slots in order of their start time.
    pub async fn list_all(&self) -> Result<Vec<TimeSlot>, AppError> {
        tracing::debug!("list time slots");
        let rows = sqlx::query(
            "SELECT time_slot_id, name, start_time, end_time, comment FROM time_slots ORDER BY start_time, time_slot_id",
        )
        .fetch_all(&self.pool)
        .await
        .with_context(|| "list time slots")?;

        Ok(rows.iter().map(time_slot_from_row).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<TimeSlot, AppError> {
        tracing::debug!("get time slot {}", id);
        let row = sqlx::query(
            "SELECT time_slot_id, name, start_time, end_time, comment FROM time_slots WHERE time_slot_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("get time slot {}", id))?;

        row.as_ref()
            .map(time_slot_from_row)
            .ok_or_else(|| not_found("TimeSlot", id))
    }

    pub async fn add(&self, time_slot: &TimeSlot) -> Result<TimeSlot, AppError> {
        let result = sqlx::query(
            "INSERT INTO time_slots (name, start_time, end_time, comment) VALUES (?, ?, ?, ?)",
        )
        .bind(&time_slot.name)
        .bind(time_slot.start_time)
        .bind(time_slot.end_time)
        .bind(&time_slot.comment)
        .execute(&self.pool)
        .await
        .with_context(|| "add time slot")?;

        let id = result.last_insert_rowid();
        tracing::info!("added time slot {}", id);

        Ok(TimeSlot {
            id: Some(id),
            ..time_slot.clone()
        })
    }

    /// Update a time slot. Existing lessons keep the times they were created with.
    pub async fn update(&self, time_slot: &TimeSlot) -> Result<(), AppError> {
        let id = require_id(time_slot.id, "TimeSlot")?;
        tracing::info!("update time slot {}", id);

        let result = sqlx::query(
            "UPDATE time_slots SET name = ?, start_time = ?, end_time = ?, comment = ? WHERE time_slot_id = ?",
        )
        .bind(&time_slot.name)
        .bind(time_slot.start_time)
        .bind(time_slot.end_time)
        .bind(&time_slot.comment)
        .bind(id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("update time slot {}", id))?;

        ensure_affected(&result, "TimeSlot", id)
    }

    /// Detach the slot from its lessons, then remove it.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        tracing::info!("delete time slot {}", id);

        let mut tx = self
            .pool
            .begin()
            .await
            .with_context(|| format!("delete time slot {}", id))?;

        let detached = sqlx::query("UPDATE lessons SET time_slot_id = NULL WHERE time_slot_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("detach lessons from time slot {}", id))?;

        let result = sqlx::query("DELETE FROM time_slots WHERE time_slot_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("delete time slot {}", id))?;

        ensure_affected(&result, "TimeSlot", id)?;

        tx.commit()
            .await
            .with_context(|| format!("delete time slot {}", id))?;

        tracing::info!(
            "deleted time slot {}, detached {} lessons",
            id,
            detached.rows_affected()
        );
        Ok(())
    }
}

fn time_slot_from_row(row: &sqlx::sqlite::SqliteRow) -> TimeSlot {
    TimeSlot {
        id: Some(row.get("time_slot_id")),
        name: row.get("name"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        comment: row.get("comment"),
    }
}
