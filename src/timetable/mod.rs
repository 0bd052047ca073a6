//! Timetable grid: per-class day x slot assignments, teacher double-booking
//! detection, and class/teacher projections over the same cells.
//!
//! The grid has no I/O of its own. Durability and existence checks come in
//! through [`AssignmentSink`] and [`ReferenceCatalog`].

mod backend;
mod conflicts;
mod error;
mod slots;
mod store;
mod types;
mod views;

pub use backend::{AssignmentSink, ReferenceCatalog};
pub use conflicts::{conflict_report, conflicts_for, ConflictPolicy, ConflictRecord};
pub use error::{GridError, GridResult, ReferenceKind};
pub use slots::{
    parse_slot_time, sort_slots, validate_slots, SlotCatalog, SlotError, StaticSlotCatalog,
    TimeSlot,
};
pub use store::{GridStore, UpsertOutcome};
pub use types::{Assignment, CellEdit, CellKey, Day, TeacherCell, UnknownDay};
pub use views::{class_view, teacher_view, ClassView, TeacherView};
