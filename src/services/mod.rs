//! Operations spanning several repositories: group membership of courses,
//! rosters and lesson creation.

mod lessons;
mod membership;
mod roster;

pub use lessons::{materialize, LessonService};
pub use membership::{
    plan, ChangeKind, FailedChange, GroupChange, MembershipService, ReconciliationFailure,
    ReconciliationReport,
};
pub use roster::{merge_rosters, RosterService};
