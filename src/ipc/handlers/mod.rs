pub mod catalog;
pub mod core;
pub mod slots;
pub mod timetable;
