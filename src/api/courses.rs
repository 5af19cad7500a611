//! Course API endpoints, including group assignment and the course roster.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::db::require_id;
use crate::models::{Course, Group, Lesson, Student};
use crate::services::ReconciliationReport;
use crate::AppState;

/// Request body for replacing the groups of a course.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileGroupsRequest {
    pub group_ids: Vec<i64>,
}

/// GET /api/courses - List all courses.
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Vec<Course>> {
    success(state.courses.list_all().await?)
}

/// GET /api/courses/:id - Get a single course with its author.
pub async fn get_course(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Course> {
    success(state.courses.get_by_id(id).await?)
}

/// POST /api/courses - Create a new course.
pub async fn create_course(
    State(state): State<AppState>,
    Json(course): Json<Course>,
) -> ApiResult<Course> {
    let created = state.courses.add(&course).await?;
    let id = require_id(created.id, "Course")?;
    success(state.courses.get_by_id(id).await?)
}

/// PUT /api/courses/:id - Update a course.
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(course): Json<Course>,
) -> ApiResult<Course> {
    let course = Course {
        id: Some(id),
        ..course
    };
    state.courses.update(&course).await?;
    success(state.courses.get_by_id(id).await?)
}

/// DELETE /api/courses/:id - Deactivate a course.
pub async fn delete_course(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.courses.delete(id).await?;
    success(())
}

/// GET /api/courses/:id/groups - Groups assigned to a course.
pub async fn list_course_groups(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Group>> {
    let course = state.courses.get_by_id(id).await?;
    success(state.membership.currently_assigned_groups(&course).await?)
}

/// PUT /api/courses/:id/groups - Replace the groups assigned to a course.
pub async fn reconcile_course_groups(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ReconcileGroupsRequest>,
) -> ApiResult<ReconciliationReport> {
    let course = state.courses.get_by_id(id).await?;
    let target: Vec<Group> = request.group_ids.into_iter().map(Group::with_id).collect();
    success(state.membership.reconcile(&target, &course).await?)
}

/// POST /api/courses/:id/groups/:group_id - Assign a group to a course.
pub async fn assign_course_group(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(i64, i64)>,
) -> ApiResult<Vec<Group>> {
    let course = state.courses.get_by_id(id).await?;
    let group = state.groups.get_by_id(group_id).await?;
    state.membership.assign(&group, &course).await?;
    success(state.membership.currently_assigned_groups(&course).await?)
}

/// DELETE /api/courses/:id/groups/:group_id - Remove a group from a course.
pub async fn remove_course_group(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(i64, i64)>,
) -> ApiResult<Vec<Group>> {
    let course = state.courses.get_by_id(id).await?;
    state
        .membership
        .remove(&Group::with_id(group_id), &course)
        .await?;
    success(state.membership.currently_assigned_groups(&course).await?)
}

/// GET /api/courses/:id/students - Roster of a course.
pub async fn list_course_students(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Student>> {
    let course = state.courses.get_by_id(id).await?;
    success(state.roster.roster_of_course(&course).await?)
}

/// GET /api/courses/:id/lessons - Lessons of a course.
pub async fn list_course_lessons(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Lesson>> {
    state.courses.get_by_id(id).await?;
    success(state.lessons.list_by_course(id).await?)
}
