//! Lesson creation.

use chrono::NaiveDate;

use crate::db::{CourseRepository, LessonRepository, TimeSlotRepository};
use crate::errors::AppError;
use crate::models::{Course, Lesson, TimeSlot};

/// Copy the course's author and the slot's times onto `lesson`.
///
/// The copies are snapshots: later changes to the course or the slot do not
/// reach the lesson. An empty author gives an empty lecturer, and an empty
/// slot leaves the lesson without times.
pub fn materialize(lesson: &mut Lesson, course: &Course, time_slot: &TimeSlot) {
    lesson.course = course.clone();
    lesson.lecturer = course.author.clone();
    lesson.time_slot = time_slot.clone();
    if time_slot.is_empty() {
        lesson.start_time = None;
        lesson.end_time = None;
    } else {
        lesson.start_time = Some(time_slot.start_time);
        lesson.end_time = Some(time_slot.end_time);
    }
}

#[derive(Clone)]
pub struct LessonService {
    lessons: LessonRepository,
    courses: CourseRepository,
    time_slots: TimeSlotRepository,
}

impl LessonService {
    pub fn new(
        lessons: LessonRepository,
        courses: CourseRepository,
        time_slots: TimeSlotRepository,
    ) -> Self {
        Self {
            lessons,
            courses,
            time_slots,
        }
    }

    /// Create a lesson of a course on `date`, materialized from the course
    /// and, when given, the time slot.
    pub async fn create_lesson(
        &self,
        course_id: i64,
        time_slot_id: Option<i64>,
        date: NaiveDate,
    ) -> Result<Lesson, AppError> {
        let course = self.courses.get_by_id(course_id).await?;
        let time_slot = match time_slot_id {
            Some(id) => self.time_slots.get_by_id(id).await?,
            None => TimeSlot::empty(),
        };

        let mut lesson = Lesson::new(course.clone(), date);
        materialize(&mut lesson, &course, &time_slot);

        let lesson = self.lessons.add(&lesson).await?;
        tracing::info!(
            "created lesson {:?} of course {} on {}",
            lesson.id,
            course_id,
            date
        );
        Ok(lesson)
    }
}
