//! Lesson model.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Course, Lecturer, TimeSlot};

/// A single scheduled lesson of a course.
///
/// `lecturer`, `start_time` and `end_time` are snapshots taken from the
/// course and time slot when the lesson is created (see
/// `services::materialize`). They are stored on the lesson row and can be
/// changed independently afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub course: Course,
    #[serde(default)]
    pub lecturer: Lecturer,
    pub date: NaiveDate,
    /// `TimeSlot::empty()` when no slot is referenced
    #[serde(default)]
    pub time_slot: TimeSlot,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
}

impl Lesson {
    /// A new lesson of `course` on `date`, with no lecturer, slot or times yet.
    pub fn new(course: Course, date: NaiveDate) -> Self {
        Self {
            id: None,
            course,
            lecturer: Lecturer::empty(),
            date,
            time_slot: TimeSlot::empty(),
            start_time: None,
            end_time: None,
        }
    }
}
