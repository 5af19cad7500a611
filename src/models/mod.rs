//! Data models for the university records backend.
//!
//! References between entities ("a course's author", "a student's group",
//! "a lesson's time slot") are held as full entity values. A reference to
//! nothing is the entity's empty value (`id == None`), never an `Option`.

mod course;
mod group;
mod lesson;
mod person;
mod time_slot;

pub use course::*;
pub use group::*;
pub use lesson::*;
pub use person::*;
pub use time_slot::*;

fn default_active() -> bool {
    true
}
