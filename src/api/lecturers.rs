//! Lecturer API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{Course, Lecturer, Lesson};
use crate::AppState;

/// GET /api/lecturers - List all lecturers.
pub async fn list_lecturers(State(state): State<AppState>) -> ApiResult<Vec<Lecturer>> {
    success(state.lecturers.list_all().await?)
}

/// GET /api/lecturers/:id - Get a single lecturer.
pub async fn get_lecturer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Lecturer> {
    success(state.lecturers.get_by_id(id).await?)
}

/// POST /api/lecturers - Create a new lecturer.
pub async fn create_lecturer(
    State(state): State<AppState>,
    Json(lecturer): Json<Lecturer>,
) -> ApiResult<Lecturer> {
    success(state.lecturers.add(&lecturer).await?)
}

/// PUT /api/lecturers/:id - Update a lecturer.
pub async fn update_lecturer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(lecturer): Json<Lecturer>,
) -> ApiResult<Lecturer> {
    let lecturer = Lecturer {
        id: Some(id),
        ..lecturer
    };
    state.lecturers.update(&lecturer).await?;
    success(state.lecturers.get_by_id(id).await?)
}

/// DELETE /api/lecturers/:id - Deactivate a lecturer.
pub async fn delete_lecturer(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.lecturers.delete(id).await?;
    success(())
}

/// GET /api/lecturers/:id/courses - Courses authored by a lecturer.
pub async fn list_lecturer_courses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Course>> {
    state.lecturers.get_by_id(id).await?;
    success(state.courses.list_by_author(id).await?)
}

/// GET /api/lecturers/:id/lessons - Lessons taught by a lecturer.
pub async fn list_lecturer_lessons(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Lesson>> {
    state.lecturers.get_by_id(id).await?;
    success(state.lessons.list_by_lecturer(id).await?)
}
