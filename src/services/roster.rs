//! Roster derivation.
//!
//! A roster is never stored. It is recomputed on every call from the groups
//! currently assigned to the course and the students of each group.

use std::collections::HashSet;

use super::MembershipService;
use crate::db::{require_id, StudentRepository};
use crate::errors::AppError;
use crate::models::{Course, Lesson, Student};

#[derive(Clone)]
pub struct RosterService {
    membership: MembershipService,
    students: StudentRepository,
}

impl RosterService {
    pub fn new(membership: MembershipService, students: StudentRepository) -> Self {
        Self {
            membership,
            students,
        }
    }

    /// Students of every group assigned to `course`, inactive ones included.
    pub async fn roster_of_course(&self, course: &Course) -> Result<Vec<Student>, AppError> {
        let course_id = require_id(course.id, "Course")?;

        let groups = self.membership.currently_assigned_groups(course).await?;
        let mut per_group = Vec::with_capacity(groups.len());
        for group in &groups {
            if let Some(group_id) = group.id {
                per_group.push(self.students.list_by_group(group_id).await?);
            }
        }

        let roster = merge_rosters(per_group);
        tracing::debug!(
            "roster of course {}: {} students from {} groups",
            course_id,
            roster.len(),
            groups.len()
        );
        Ok(roster)
    }

    pub async fn roster_of_lesson(&self, lesson: &Lesson) -> Result<Vec<Student>, AppError> {
        if lesson.course.is_empty() {
            return Err(AppError::InvalidArgument(
                "Lesson without course passed".to_string(),
            ));
        }
        self.roster_of_course(&lesson.course).await
    }
}

/// Union of several student lists by id, in order of first appearance.
pub fn merge_rosters(lists: impl IntoIterator<Item = Vec<Student>>) -> Vec<Student> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|student| match student.id {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect()
}
