//! Lesson API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{Lesson, Student};
use crate::AppState;

/// Request body for creating a lesson from a course and a time slot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    pub course_id: i64,
    #[serde(default)]
    pub time_slot_id: Option<i64>,
    pub date: NaiveDate,
}

/// GET /api/lessons - List all lessons.
pub async fn list_lessons(State(state): State<AppState>) -> ApiResult<Vec<Lesson>> {
    success(state.lessons.list_all().await?)
}

/// GET /api/lessons/:id - Get a single lesson.
pub async fn get_lesson(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Lesson> {
    success(state.lessons.get_by_id(id).await?)
}

/// POST /api/lessons - Create a lesson with lecturer and times taken from
/// the course and time slot.
pub async fn create_lesson(
    State(state): State<AppState>,
    Json(request): Json<CreateLessonRequest>,
) -> ApiResult<Lesson> {
    success(
        state
            .lesson_service
            .create_lesson(request.course_id, request.time_slot_id, request.date)
            .await?,
    )
}

/// PUT /api/lessons/:id - Update a lesson; lecturer and times are taken as given.
pub async fn update_lesson(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(lesson): Json<Lesson>,
) -> ApiResult<Lesson> {
    let lesson = Lesson {
        id: Some(id),
        ..lesson
    };
    state.lessons.update(&lesson).await?;
    success(state.lessons.get_by_id(id).await?)
}

/// DELETE /api/lessons/:id - Delete a lesson.
pub async fn delete_lesson(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.lessons.delete(id).await?;
    success(())
}

/// GET /api/lessons/:id/students - Students attending a lesson.
pub async fn list_lesson_students(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Student>> {
    let lesson = state.lessons.get_by_id(id).await?;
    success(state.roster.roster_of_lesson(&lesson).await?)
}
