//! Time slot reference data.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A named wall-clock interval lessons are scheduled into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_time: NaiveTime,
    #[serde(default)]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TimeSlot {
    pub fn new(name: impl Into<String>, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: None,
            name: name.into(),
            start_time,
            end_time,
            comment: None,
        }
    }

    /// The "no time slot" value, e.g. for a lesson whose slot was deleted.
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
