//! Lecturer and student models, both stored as rows of the `persons` table.

use serde::{Deserialize, Serialize};

use super::{default_active, Group};

/// Discriminator stored in `persons.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Lecturer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Lecturer => "LECTURER",
        }
    }
}

/// A lecturer. Courses authored and lessons taught are looked up by query,
/// see `CourseRepository::list_by_author` and `LessonRepository::list_by_lecturer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecturer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Lecturer {
    /// A new, not yet stored lecturer.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            comment: None,
            active: true,
        }
    }

    /// The "no lecturer" value, e.g. a course without an author.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A reference carrying only the id, as read from a foreign key column.
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

/// A student with at most one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// `Group::empty()` when the student belongs to no group
    #[serde(default)]
    pub group: Group,
}

impl Student {
    /// A new, not yet stored student without a group.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            comment: None,
            active: true,
            group: Group::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_column_value_matches_serialized_form() {
        for role in [Role::Student, Role::Lecturer] {
            assert_eq!(serde_json::to_value(role).unwrap(), role.as_str());
        }
    }

    #[test]
    fn test_missing_group_deserializes_to_empty_group() {
        let student: Student =
            serde_json::from_str(r#"{"firstName": "Ann", "lastName": "Lee"}"#).unwrap();
        assert!(student.active);
        assert!(student.group.is_empty());

        let json = serde_json::to_value(&student).unwrap();
        assert!(json["group"].is_object());
        assert!(json["group"]["id"].is_null());
    }
}
