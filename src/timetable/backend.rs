use super::types::{Assignment, Day};

/// Durable side of the grid. The store commits to memory only after these
/// calls return `Ok`.
pub trait AssignmentSink {
    fn save(&self, assignment: &Assignment) -> anyhow::Result<()>;
    fn remove(&self, class_id: &str, day: Day, slot_id: &str) -> anyhow::Result<()>;
}

/// Existence checks run before an upsert is accepted.
pub trait ReferenceCatalog {
    fn class_exists(&self, id: &str) -> anyhow::Result<bool>;
    fn subject_exists(&self, id: &str) -> anyhow::Result<bool>;
    fn teacher_exists(&self, id: &str) -> anyhow::Result<bool>;
}
