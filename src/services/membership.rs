//! Group↔Course membership.
//!
//! `reconcile` converges the set of groups assigned to a course to a target
//! set. Only the difference is written: pairs already present are never
//! re-added and absent pairs are never removed.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::db::{require_id, CourseRepository, GroupRepository};
use crate::errors::AppError;
use crate::models::{Course, Group};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Remove,
}

/// One write against the association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChange {
    pub kind: ChangeKind,
    pub group_id: i64,
    pub course_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedChange {
    #[serde(flatten)]
    pub change: GroupChange,
    pub error: String,
}

/// Changes applied by a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub course_id: i64,
    pub added: Vec<i64>,
    pub removed: Vec<i64>,
}

/// Outcome of a reconciliation in which at least one change was rejected.
///
/// `applied` changes are committed. `skipped` changes were never attempted
/// because the backend failed in a way that makes further writes pointless.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationFailure {
    pub course_id: i64,
    pub applied: Vec<GroupChange>,
    pub failed: Vec<FailedChange>,
    pub skipped: Vec<GroupChange>,
}

impl fmt::Display for ReconciliationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "groups of course {} partially reconciled: {} applied, {} failed, {} skipped",
            self.course_id,
            self.applied.len(),
            self.failed.len(),
            self.skipped.len()
        )
    }
}

/// Changes turning `current` into `target`, removals first.
pub fn plan(course_id: i64, current: &BTreeSet<i64>, target: &BTreeSet<i64>) -> Vec<GroupChange> {
    let removals = current.difference(target).map(|&group_id| GroupChange {
        kind: ChangeKind::Remove,
        group_id,
        course_id,
    });
    let additions = target.difference(current).map(|&group_id| GroupChange {
        kind: ChangeKind::Add,
        group_id,
        course_id,
    });

    removals.chain(additions).collect()
}

#[derive(Clone)]
pub struct MembershipService {
    courses: CourseRepository,
    groups: GroupRepository,
}

impl MembershipService {
    pub fn new(courses: CourseRepository, groups: GroupRepository) -> Self {
        Self { courses, groups }
    }

    /// Assign a group to a course. Assigning twice is a no-op.
    pub async fn assign(&self, group: &Group, course: &Course) -> Result<(), AppError> {
        let group_id = require_id(group.id, "Group")?;
        let course_id = require_id(course.id, "Course")?;

        if self.courses.assign_group(group_id, course_id).await? {
            tracing::info!("assigned group {} to course {}", group_id, course_id);
        }
        Ok(())
    }

    /// Remove a group from a course. Removing an absent pair is a no-op.
    pub async fn remove(&self, group: &Group, course: &Course) -> Result<(), AppError> {
        let group_id = require_id(group.id, "Group")?;
        let course_id = require_id(course.id, "Course")?;

        if self.courses.remove_group(group_id, course_id).await? {
            tracing::info!("removed group {} from course {}", group_id, course_id);
        }
        Ok(())
    }

    pub async fn currently_assigned_groups(&self, course: &Course) -> Result<Vec<Group>, AppError> {
        let course_id = require_id(course.id, "Course")?;
        self.groups.list_by_course(course_id).await
    }

    pub async fn courses_of_group(&self, group_id: i64) -> Result<Vec<Course>, AppError> {
        self.courses.list_by_group(group_id).await
    }

    pub async fn courses_of_student(&self, student_id: i64) -> Result<Vec<Course>, AppError> {
        self.courses.list_by_student(student_id).await
    }

    /// Make `target` the exact set of groups assigned to `course`.
    ///
    /// Groups are compared by id and duplicates in `target` collapse. A
    /// constraint violation on one pair is recorded and the remaining pairs
    /// are still attempted; any other error stops the run.
    pub async fn reconcile(
        &self,
        target: &[Group],
        course: &Course,
    ) -> Result<ReconciliationReport, AppError> {
        let course_id = require_id(course.id, "Course")?;
        let target = target
            .iter()
            .map(|group| require_id(group.id, "Group"))
            .collect::<Result<BTreeSet<i64>, AppError>>()?;

        let current = self
            .groups
            .list_by_course(course_id)
            .await?
            .into_iter()
            .filter_map(|group| group.id)
            .collect::<BTreeSet<i64>>();

        let changes = plan(course_id, &current, &target);
        tracing::info!(
            "reconciling groups of course {}: {} current, {} target, {} changes",
            course_id,
            current.len(),
            target.len(),
            changes.len()
        );

        let mut failure = ReconciliationFailure {
            course_id,
            ..Default::default()
        };
        let mut pending = changes.into_iter();

        while let Some(change) = pending.next() {
            let result = match change.kind {
                ChangeKind::Remove => self.courses.remove_group(change.group_id, course_id).await,
                ChangeKind::Add => self.courses.assign_group(change.group_id, course_id).await,
            };

            match result {
                Ok(_) => failure.applied.push(change),
                Err(err) if err.is_constraint_violation() => {
                    tracing::warn!(
                        "{:?} of group {} on course {} rejected: {}",
                        change.kind,
                        change.group_id,
                        course_id,
                        err
                    );
                    failure.failed.push(FailedChange {
                        change,
                        error: err.message(),
                    });
                }
                Err(err) => {
                    tracing::error!(
                        "reconciling groups of course {} stopped: {}",
                        course_id,
                        err
                    );
                    failure.failed.push(FailedChange {
                        change,
                        error: err.message(),
                    });
                    failure.skipped.extend(pending.by_ref());
                }
            }
        }

        if !failure.failed.is_empty() {
            return Err(AppError::Reconciliation(failure));
        }

        let (added, removed): (Vec<GroupChange>, Vec<GroupChange>) = failure
            .applied
            .into_iter()
            .partition(|change| change.kind == ChangeKind::Add);

        Ok(ReconciliationReport {
            course_id,
            added: added.into_iter().map(|change| change.group_id).collect(),
            removed: removed.into_iter().map(|change| change.group_id).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::models::Lecturer;

    fn ids(values: &[i64]) -> BTreeSet<i64> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_plan_removes_before_adding() {
        let changes = plan(7, &ids(&[1, 2, 3]), &ids(&[2, 4]));

        let kinds: Vec<_> = changes.iter().map(|c| (c.kind, c.group_id)).collect();
        assert_eq!(
            kinds,
            vec![
                (ChangeKind::Remove, 1),
                (ChangeKind::Remove, 3),
                (ChangeKind::Add, 4)
            ]
        );
        assert!(changes.iter().all(|c| c.course_id == 7));
    }

    #[test]
    fn test_plan_is_empty_when_converged() {
        assert!(plan(1, &ids(&[5, 6]), &ids(&[6, 5])).is_empty());
        assert!(plan(1, &ids(&[]), &ids(&[])).is_empty());
    }

    async fn setup() -> (MembershipService, GroupRepository, Course, tempfile::TempDir) {
        let (pool, temp_dir) = test_pool().await;
        let courses = CourseRepository::new(pool.clone());
        let groups = GroupRepository::new(pool);
        let course = courses
            .add(&Course::new("Algebra", Lecturer::empty()))
            .await
            .unwrap();
        (
            MembershipService::new(courses, groups.clone()),
            groups,
            course,
            temp_dir,
        )
    }

    fn assigned_ids(groups: &[Group]) -> Vec<i64> {
        groups.iter().filter_map(|g| g.id).collect()
    }

    #[tokio::test]
    async fn test_reconcile_converges_with_minimal_changes() {
        let (service, groups, course, _temp_dir) = setup().await;
        let g1 = groups.add(&Group::new("G1")).await.unwrap();
        let g2 = groups.add(&Group::new("G2")).await.unwrap();
        let g3 = groups.add(&Group::new("G3")).await.unwrap();

        service.assign(&g1, &course).await.unwrap();
        service.assign(&g2, &course).await.unwrap();

        let report = service
            .reconcile(&[g1.clone(), g3.clone(), g3.clone()], &course)
            .await
            .unwrap();
        assert_eq!(report.added, vec![g3.id.unwrap()]);
        assert_eq!(report.removed, vec![g2.id.unwrap()]);

        let current = service.currently_assigned_groups(&course).await.unwrap();
        assert_eq!(assigned_ids(&current), vec![g1.id.unwrap(), g3.id.unwrap()]);

        let again = service.reconcile(&[g3.clone(), g1.clone()], &course).await.unwrap();
        assert!(again.added.is_empty());
        assert!(again.removed.is_empty());

        let cleared = service.reconcile(&[], &course).await.unwrap();
        assert_eq!(cleared.removed.len(), 2);
        assert!(service.currently_assigned_groups(&course).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_and_remove_are_idempotent() {
        let (service, groups, course, _temp_dir) = setup().await;
        let g1 = groups.add(&Group::new("G1")).await.unwrap();

        service.assign(&g1, &course).await.unwrap();
        service.assign(&g1, &course).await.unwrap();
        assert_eq!(service.currently_assigned_groups(&course).await.unwrap().len(), 1);
        assert_eq!(
            service.courses_of_group(g1.id.unwrap()).await.unwrap()[0].id,
            course.id
        );

        service.remove(&g1, &course).await.unwrap();
        service.remove(&g1, &course).await.unwrap();
        assert!(service.currently_assigned_groups(&course).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_validates_before_writing() {
        let (service, groups, course, _temp_dir) = setup().await;
        let g1 = groups.add(&Group::new("G1")).await.unwrap();

        let result = service.reconcile(&[g1.clone(), Group::empty()], &course).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
        assert!(service.currently_assigned_groups(&course).await.unwrap().is_empty());

        let result = service.reconcile(&[g1], &Course::empty()).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_rejected_pair_does_not_stop_the_others() {
        let (service, groups, course, _temp_dir) = setup().await;
        let g1 = groups.add(&Group::new("G1")).await.unwrap();
        let g2 = groups.add(&Group::new("G2")).await.unwrap();

        let result = service
            .reconcile(&[g1.clone(), Group::with_id(999), g2.clone()], &course)
            .await;

        let failure = match result {
            Err(AppError::Reconciliation(failure)) => failure,
            other => panic!("expected reconciliation failure, got {:?}", other),
        };
        assert_eq!(failure.failed.len(), 1);
        assert_eq!(failure.failed[0].change.group_id, 999);
        assert_eq!(failure.applied.len(), 2);
        assert!(failure.skipped.is_empty());

        let current = service.currently_assigned_groups(&course).await.unwrap();
        assert_eq!(assigned_ids(&current), vec![g1.id.unwrap(), g2.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_backend_error_stops_and_skips_the_rest() {
        let (pool, _temp_dir) = test_pool().await;
        let courses = CourseRepository::new(pool.clone());
        let groups = GroupRepository::new(pool.clone());
        let service = MembershipService::new(courses.clone(), groups.clone());

        let course = courses
            .add(&Course::new("Topology", Lecturer::empty()))
            .await
            .unwrap();
        let g0 = groups.add(&Group::new("G0")).await.unwrap();
        let g1 = groups.add(&Group::new("G1")).await.unwrap();
        let g2 = groups.add(&Group::new("G2")).await.unwrap();
        let g3 = groups.add(&Group::new("G3")).await.unwrap();
        service.assign(&g0, &course).await.unwrap();

        // Aborts from a trigger are not one of the constraint kinds the
        // reconciler tolerates.
        sqlx::query(&format!(
            "CREATE TRIGGER lock_group BEFORE INSERT ON group_courses \
             WHEN NEW.group_id = {} BEGIN SELECT RAISE(ABORT, 'group locked'); END",
            g2.id.unwrap()
        ))
        .execute(&pool)
        .await
        .unwrap();

        let result = service
            .reconcile(&[g1.clone(), g2.clone(), g3.clone()], &course)
            .await;
        let failure = match result {
            Err(AppError::Reconciliation(failure)) => failure,
            other => panic!("expected reconciliation failure, got {:?}", other),
        };

        let course_id = course.id.unwrap();
        let change = |kind, group: &Group| GroupChange {
            kind,
            group_id: group.id.unwrap(),
            course_id,
        };
        assert_eq!(
            failure.applied,
            vec![change(ChangeKind::Remove, &g0), change(ChangeKind::Add, &g1)]
        );
        assert_eq!(failure.failed.len(), 1);
        assert_eq!(failure.failed[0].change, change(ChangeKind::Add, &g2));
        assert!(failure.failed[0].error.contains("group locked"));
        assert_eq!(failure.skipped, vec![change(ChangeKind::Add, &g3)]);

        let current = service.currently_assigned_groups(&course).await.unwrap();
        assert_eq!(assigned_ids(&current), vec![g1.id.unwrap()]);
    }
}
