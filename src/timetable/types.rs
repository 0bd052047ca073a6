use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "MONDAY",
            Day::Tuesday => "TUESDAY",
            Day::Wednesday => "WEDNESDAY",
            Day::Thursday => "THURSDAY",
            Day::Friday => "FRIDAY",
            Day::Saturday => "SATURDAY",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown day: {0}")]
pub struct UnknownDay(pub String);

impl FromStr for Day {
    type Err = UnknownDay;

    /// Accepts full names and three-letter abbreviations, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MONDAY" | "MON" => Ok(Day::Monday),
            "TUESDAY" | "TUE" => Ok(Day::Tuesday),
            "WEDNESDAY" | "WED" => Ok(Day::Wednesday),
            "THURSDAY" | "THU" => Ok(Day::Thursday),
            "FRIDAY" | "FRI" => Ok(Day::Friday),
            "SATURDAY" | "SAT" => Ok(Day::Saturday),
            _ => Err(UnknownDay(s.to_string())),
        }
    }
}

// Wire input goes through `FromStr` so every caller accepts the same spellings.
impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity of one timetable cell. Field order fixes the iteration order of
/// the store: class, then day, then slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub class_id: String,
    pub day: Day,
    pub slot_id: String,
}

impl CellKey {
    pub fn new(class_id: impl Into<String>, day: Day, slot_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            day,
            slot_id: slot_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub class_id: String,
    pub day: Day,
    pub slot_id: String,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<String>,
}

impl Assignment {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.class_id.clone(), self.day, self.slot_id.clone())
    }

    /// An assignment with neither subject nor teacher is an empty cell.
    pub fn is_empty(&self) -> bool {
        self.subject_id.is_none() && self.teacher_id.is_none()
    }
}

/// A single cell edit as sent by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellEdit {
    pub class_id: String,
    pub day: Day,
    pub slot_id: String,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<String>,
}

impl CellEdit {
    /// Blank ids are treated as cleared fields.
    pub fn into_assignment(self) -> Assignment {
        Assignment {
            class_id: self.class_id,
            day: self.day,
            slot_id: self.slot_id,
            subject_id: non_blank(self.subject_id),
            teacher_id: non_blank(self.teacher_id),
        }
    }
}

fn non_blank(id: Option<String>) -> Option<String> {
    id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// One entry of the teacher-centric view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCell {
    pub class_id: String,
    pub subject_id: Option<String>,
}
