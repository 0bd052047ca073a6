use anyhow::Context;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::debug;

use crate::db;
use crate::timetable::{
    parse_slot_time, Assignment, AssignmentSink, Day, ReferenceCatalog, SlotCatalog, TimeSlot,
};

pub type SharedConn = Arc<Mutex<Connection>>;

/// SQLite-backed collaborators for one workspace's grid.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: SharedConn,
}

impl SqliteBackend {
    pub fn new(conn: SharedConn) -> Self {
        Self { conn }
    }

    /// Every stored assignment, used to seed the in-memory grid.
    pub fn load_assignments(&self) -> anyhow::Result<Vec<Assignment>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT class_id, day, slot_id, subject_id, teacher_id
             FROM timetable_entries
             ORDER BY class_id, day, slot_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (class_id, day, slot_id, subject_id, teacher_id) in rows {
            let day: Day = day
                .parse()
                .with_context(|| format!("timetable_entries row for class {class_id}"))?;
            out.push(Assignment {
                class_id,
                day,
                slot_id,
                subject_id,
                teacher_id,
            });
        }
        Ok(out)
    }
}

impl AssignmentSink for SqliteBackend {
    fn save(&self, a: &Assignment) -> anyhow::Result<()> {
        let conn = self.conn.lock();
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO timetable_entries(class_id, day, slot_id, subject_id, teacher_id, updated_at)
             VALUES(?, ?, ?, ?, ?, ?)
             ON CONFLICT(class_id, day, slot_id) DO UPDATE SET
               subject_id = excluded.subject_id,
               teacher_id = excluded.teacher_id,
               updated_at = excluded.updated_at",
            (
                &a.class_id,
                a.day.as_str(),
                &a.slot_id,
                &a.subject_id,
                &a.teacher_id,
                &now,
            ),
        )
        .context("upsert timetable_entries")?;
        Ok(())
    }

    fn remove(&self, class_id: &str, day: Day, slot_id: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM timetable_entries WHERE class_id = ? AND day = ? AND slot_id = ?",
            (class_id, day.as_str(), slot_id),
        )
        .context("delete timetable_entries")?;
        Ok(())
    }
}

impl ReferenceCatalog for SqliteBackend {
    fn class_exists(&self, id: &str) -> anyhow::Result<bool> {
        db::row_exists(&self.conn.lock(), "classes", id)
    }

    fn subject_exists(&self, id: &str) -> anyhow::Result<bool> {
        db::row_exists(&self.conn.lock(), "subjects", id)
    }

    fn teacher_exists(&self, id: &str) -> anyhow::Result<bool> {
        db::row_exists(&self.conn.lock(), "teachers", id)
    }
}

impl SlotCatalog for SqliteBackend {
    fn list_slots(&self) -> anyhow::Result<Vec<TimeSlot>> {
        list_slots(&self.conn.lock())
    }
}

pub fn list_slots(conn: &Connection) -> anyhow::Result<Vec<TimeSlot>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, start_time, end_time FROM time_slots ORDER BY start_time, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut slots = Vec::with_capacity(rows.len());
    for (id, label, start, end) in rows {
        slots.push(TimeSlot {
            start_time: parse_slot_time(&start).with_context(|| format!("slot {id} start"))?,
            end_time: parse_slot_time(&end).with_context(|| format!("slot {id} end"))?,
            id,
            label,
        });
    }
    debug!(count = slots.len(), "loaded slot catalog");
    Ok(slots)
}

pub fn insert_slot(conn: &Connection, slot: &TimeSlot) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO time_slots(id, label, start_time, end_time) VALUES(?, ?, ?, ?)",
        (
            &slot.id,
            &slot.label,
            slot.start_time.format("%H:%M").to_string(),
            slot.end_time.format("%H:%M").to_string(),
        ),
    )?;
    Ok(())
}
