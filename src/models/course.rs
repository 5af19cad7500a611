//! Course model.

use serde::{Deserialize, Serialize};

use super::{default_active, Lecturer};

/// A course, optionally authored by a lecturer.
///
/// The groups attending a course are not a field: they live in the
/// `group_courses` association and are read with
/// `MembershipService::currently_assigned_groups`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `Lecturer::empty()` for a course without an author
    #[serde(default)]
    pub author: Lecturer,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Course {
    pub fn new(name: impl Into<String>, author: Lecturer) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            author,
            active: true,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }
}
