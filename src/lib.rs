//! Timetable daemon for school workspaces.
//!
//! [`timetable`] holds the grid itself; the other modules wire it to SQLite
//! and to the line-delimited JSON protocol spoken over stdin/stdout.

pub mod config;
pub mod db;
pub mod ipc;
pub mod logging;
pub mod sqlite;
pub mod timetable;
