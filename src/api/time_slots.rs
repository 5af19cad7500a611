//! Time slot API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::TimeSlot;
use crate::AppState;

/// GET /api/time-slots - List all time slots.
pub async fn list_time_slots(State(state): State<AppState>) -> ApiResult<Vec<TimeSlot>> {
    success(state.time_slots.list_all().await?)
}

/// GET /api/time-slots/:id - Get a single time slot.
pub async fn get_time_slot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<TimeSlot> {
    success(state.time_slots.get_by_id(id).await?)
}

/// POST /api/time-slots - Create a new time slot.
pub async fn create_time_slot(
    State(state): State<AppState>,
    Json(time_slot): Json<TimeSlot>,
) -> ApiResult<TimeSlot> {
    success(state.time_slots.add(&time_slot).await?)
}

/// PUT /api/time-slots/:id - Update a time slot.
pub async fn update_time_slot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(time_slot): Json<TimeSlot>,
) -> ApiResult<TimeSlot> {
    let time_slot = TimeSlot {
        id: Some(id),
        ..time_slot
    };
    state.time_slots.update(&time_slot).await?;
    success(state.time_slots.get_by_id(id).await?)
}

/// DELETE /api/time-slots/:id - Delete a time slot, detaching its lessons.
pub async fn delete_time_slot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.time_slots.delete(id).await?;
    success(())
}
