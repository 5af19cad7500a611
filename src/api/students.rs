//! Student API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::db::require_id;
use crate::models::{Course, Lesson, Student};
use crate::AppState;

/// GET /api/students - List all students.
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Vec<Student>> {
    success(state.students.list_all().await?)
}

/// GET /api/students/:id - Get a single student with their group.
pub async fn get_student(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Student> {
    success(state.students.get_by_id(id).await?)
}

/// POST /api/students - Create a new student.
pub async fn create_student(
    State(state): State<AppState>,
    Json(student): Json<Student>,
) -> ApiResult<Student> {
    let created = state.students.add(&student).await?;
    let id = require_id(created.id, "Student")?;
    success(state.students.get_by_id(id).await?)
}

/// PUT /api/students/:id - Update a student and their group.
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(student): Json<Student>,
) -> ApiResult<Student> {
    let student = Student {
        id: Some(id),
        ..student
    };
    state.students.update(&student).await?;
    success(state.students.get_by_id(id).await?)
}

/// DELETE /api/students/:id - Deactivate a student.
pub async fn delete_student(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.students.delete(id).await?;
    success(())
}

/// GET /api/students/:id/courses - Courses reachable through the student's group.
pub async fn list_student_courses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Course>> {
    state.students.get_by_id(id).await?;
    success(state.membership.courses_of_student(id).await?)
}

/// GET /api/students/:id/lessons - Lessons of the student's courses.
pub async fn list_student_lessons(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Lesson>> {
    state.students.get_by_id(id).await?;
    success(state.lessons.list_by_student(id).await?)
}
