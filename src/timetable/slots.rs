use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named period of the school day, e.g. "Period 1" 08:00-08:45.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub label: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// Source of the ordered period list. Owned by scheduling configuration; the
/// grid only reads it.
pub trait SlotCatalog {
    fn list_slots(&self) -> anyhow::Result<Vec<TimeSlot>>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot {id} must end after it starts")]
    InvalidRange { id: String },
    #[error("duplicate slot id: {id}")]
    DuplicateId { id: String },
    #[error("slot {second} overlaps slot {first}")]
    Overlap { first: String, second: String },
    #[error("invalid time {0:?}, expected HH:MM")]
    BadTime(String),
}

/// Parses `HH:MM` (a trailing `:SS` is tolerated).
pub fn parse_slot_time(raw: &str) -> Result<NaiveTime, SlotError> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| SlotError::BadTime(raw.to_string()))
}

pub fn sort_slots(slots: &mut [TimeSlot]) {
    slots.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Checks the catalog invariants: positive ranges, unique ids, and no two
/// slots overlapping. Touching ranges (08:45 end, 08:45 start) are fine.
pub fn validate_slots(slots: &[TimeSlot]) -> Result<(), SlotError> {
    let mut ids = HashSet::new();
    for s in slots {
        if s.start_time >= s.end_time {
            return Err(SlotError::InvalidRange { id: s.id.clone() });
        }
        if !ids.insert(s.id.as_str()) {
            return Err(SlotError::DuplicateId { id: s.id.clone() });
        }
    }

    let mut ordered: Vec<&TimeSlot> = slots.iter().collect();
    ordered.sort_by_key(|s| s.start_time);
    for pair in ordered.windows(2) {
        if pair[1].start_time < pair[0].end_time {
            return Err(SlotError::Overlap {
                first: pair[0].id.clone(),
                second: pair[1].id.clone(),
            });
        }
    }
    Ok(())
}

/// Fixed in-memory catalog, sorted on construction.
#[derive(Debug, Clone, Default)]
pub struct StaticSlotCatalog {
    slots: Vec<TimeSlot>,
}

impl StaticSlotCatalog {
    pub fn new(mut slots: Vec<TimeSlot>) -> Result<Self, SlotError> {
        validate_slots(&slots)?;
        sort_slots(&mut slots);
        Ok(Self { slots })
    }
}

impl SlotCatalog for StaticSlotCatalog {
    fn list_slots(&self) -> anyhow::Result<Vec<TimeSlot>> {
        Ok(self.slots.clone())
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_slot_time(&raw).map_err(serde::de::Error::custom)
    }
}
