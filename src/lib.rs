//! University records backend
//!
//! Students, lecturers, groups, courses, time slots and lessons over SQLite,
//! served as a JSON REST API.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::{
    CourseRepository, GroupRepository, LecturerRepository, LessonRepository, StudentRepository,
    TimeSlotRepository,
};
use services::{LessonService, MembershipService, RosterService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub lecturers: LecturerRepository,
    pub students: StudentRepository,
    pub groups: GroupRepository,
    pub courses: CourseRepository,
    pub time_slots: TimeSlotRepository,
    pub lessons: LessonRepository,
    pub membership: MembershipService,
    pub roster: RosterService,
    pub lesson_service: LessonService,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every repository and service to one pool.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let lecturers = LecturerRepository::new(pool.clone());
        let students = StudentRepository::new(pool.clone());
        let groups = GroupRepository::new(pool.clone());
        let courses = CourseRepository::new(pool.clone());
        let time_slots = TimeSlotRepository::new(pool.clone());
        let lessons = LessonRepository::new(pool);

        let membership = MembershipService::new(courses.clone(), groups.clone());
        let roster = RosterService::new(membership.clone(), students.clone());
        let lesson_service =
            LessonService::new(lessons.clone(), courses.clone(), time_slots.clone());

        Self {
            lecturers,
            students,
            groups,
            courses,
            time_slots,
            lessons,
            membership,
            roster,
            lesson_service,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Lecturers
        .route("/lecturers", get(api::list_lecturers).post(api::create_lecturer))
        .route(
            "/lecturers/{id}",
            get(api::get_lecturer)
                .put(api::update_lecturer)
                .delete(api::delete_lecturer),
        )
        .route("/lecturers/{id}/courses", get(api::list_lecturer_courses))
        .route("/lecturers/{id}/lessons", get(api::list_lecturer_lessons))
        // Students
        .route("/students", get(api::list_students).post(api::create_student))
        .route(
            "/students/{id}",
            get(api::get_student)
                .put(api::update_student)
                .delete(api::delete_student),
        )
        .route("/students/{id}/courses", get(api::list_student_courses))
        .route("/students/{id}/lessons", get(api::list_student_lessons))
        // Groups
        .route("/groups", get(api::list_groups).post(api::create_group))
        .route(
            "/groups/{id}",
            get(api::get_group)
                .put(api::update_group)
                .delete(api::delete_group),
        )
        .route("/groups/{id}/students", get(api::list_group_students))
        .route("/groups/{id}/courses", get(api::list_group_courses))
        // Courses
        .route("/courses", get(api::list_courses).post(api::create_course))
        .route(
            "/courses/{id}",
            get(api::get_course)
                .put(api::update_course)
                .delete(api::delete_course),
        )
        .route(
            "/courses/{id}/groups",
            get(api::list_course_groups).put(api::reconcile_course_groups),
        )
        .route(
            "/courses/{id}/groups/{group_id}",
            post(api::assign_course_group).delete(api::remove_course_group),
        )
        .route("/courses/{id}/students", get(api::list_course_students))
        .route("/courses/{id}/lessons", get(api::list_course_lessons))
        // Time slots
        .route(
            "/time-slots",
            get(api::list_time_slots).post(api::create_time_slot),
        )
        .route(
            "/time-slots/{id}",
            get(api::get_time_slot)
                .put(api::update_time_slot)
                .delete(api::delete_time_slot),
        )
        // Lessons
        .route("/lessons", get(api::list_lessons).post(api::create_lesson))
        .route(
            "/lessons/{id}",
            get(api::get_lesson)
                .put(api::update_lesson)
                .delete(api::delete_lesson),
        )
        .route("/lessons/{id}/students", get(api::list_lesson_students));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
