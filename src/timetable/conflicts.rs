use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use super::types::{Assignment, Day};

/// What to do when an edit double-books a teacher. Co-teaching is legitimate,
/// so the checker only reports and the caller picks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Flag,
    Block,
}

impl ConflictPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictPolicy::Flag => "flag",
            ConflictPolicy::Block => "block",
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" => Ok(ConflictPolicy::Flag),
            "block" => Ok(ConflictPolicy::Block),
            other => Err(format!("policy must be one of: flag, block (got {other:?})")),
        }
    }
}

/// A teacher bound to more than one class in the same day/slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub day: Day,
    pub slot_id: String,
    pub teacher_id: String,
    pub class_ids: BTreeSet<String>,
}

/// Classes other than `class_id` that have `teacher_id` at `(day, slot_id)`.
pub fn conflicts_for<'a, I>(
    assignments: I,
    day: Day,
    slot_id: &str,
    teacher_id: &str,
    class_id: &str,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    assignments
        .into_iter()
        .filter(|a| a.day == day && a.slot_id == slot_id && a.class_id != class_id)
        .filter(|a| a.teacher_id.as_deref() == Some(teacher_id))
        .map(|a| a.class_id.clone())
        .collect()
}

/// Every double-booking in the snapshot, ordered by day, slot, then teacher.
pub fn conflict_report<'a, I>(assignments: I) -> Vec<ConflictRecord>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let mut by_cell: BTreeMap<(Day, &str, &str), BTreeSet<String>> = BTreeMap::new();
    for a in assignments {
        let Some(teacher_id) = a.teacher_id.as_deref() else {
            continue;
        };
        by_cell
            .entry((a.day, a.slot_id.as_str(), teacher_id))
            .or_default()
            .insert(a.class_id.clone());
    }

    by_cell
        .into_iter()
        .filter(|(_, classes)| classes.len() > 1)
        .map(|((day, slot_id, teacher_id), class_ids)| ConflictRecord {
            day,
            slot_id: slot_id.to_string(),
            teacher_id: teacher_id.to_string(),
            class_ids,
        })
        .collect()
}
