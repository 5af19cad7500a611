//! Group API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{Course, Group, Student};
use crate::AppState;

/// GET /api/groups - List all groups.
pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Vec<Group>> {
    success(state.groups.list_all().await?)
}

/// GET /api/groups/:id - Get a single group.
pub async fn get_group(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Group> {
    success(state.groups.get_by_id(id).await?)
}

/// POST /api/groups - Create a new group.
pub async fn create_group(
    State(state): State<AppState>,
    Json(group): Json<Group>,
) -> ApiResult<Group> {
    success(state.groups.add(&group).await?)
}

/// PUT /api/groups/:id - Update a group.
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(group): Json<Group>,
) -> ApiResult<Group> {
    let group = Group {
        id: Some(id),
        ..group
    };
    state.groups.update(&group).await?;
    success(state.groups.get_by_id(id).await?)
}

/// DELETE /api/groups/:id - Deactivate a group.
pub async fn delete_group(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.groups.delete(id).await?;
    success(())
}

/// GET /api/groups/:id/students - Members of a group.
pub async fn list_group_students(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Student>> {
    state.groups.get_by_id(id).await?;
    success(state.students.list_by_group(id).await?)
}

/// GET /api/groups/:id/courses - Courses the group is assigned to.
pub async fn list_group_courses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Course>> {
    state.groups.get_by_id(id).await?;
    success(state.membership.courses_of_group(id).await?)
}
