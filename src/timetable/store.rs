use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::backend::{AssignmentSink, ReferenceCatalog};
use super::conflicts::{self, ConflictPolicy, ConflictRecord};
use super::error::{GridError, GridResult, ReferenceKind};
use super::types::{Assignment, CellEdit, CellKey, Day};
use super::views::{self, ClassView, TeacherView};

/// Result of a policy-aware upsert. `assignment` is `None` when the edit
/// cleared the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub assignment: Option<Assignment>,
    pub conflicts: BTreeSet<String>,
}

/// Sparse day x slot grid for every class of one workspace.
///
/// Writers are serialized by `write_gate`, held across validation,
/// persistence and apply. The cell map is write-locked only for the final
/// apply, so readers see either the old or the new state of a cell.
pub struct GridStore<B> {
    backend: B,
    cells: RwLock<BTreeMap<CellKey, Assignment>>,
    write_gate: Mutex<()>,
}

impl<B> GridStore<B>
where
    B: AssignmentSink + ReferenceCatalog,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cells: RwLock::new(BTreeMap::new()),
            write_gate: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Seeds the store from durable state. Does not call the backend.
    pub fn load<I>(&self, assignments: I) -> usize
    where
        I: IntoIterator<Item = Assignment>,
    {
        let _gate = self.write_gate.lock();
        let mut cells = self.cells.write();
        for a in assignments.into_iter().filter(|a| !a.is_empty()) {
            cells.insert(a.key(), a);
        }
        cells.len()
    }

    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    pub fn get(&self, class_id: &str, day: Day, slot_id: &str) -> Option<Assignment> {
        self.cells
            .read()
            .get(&CellKey::new(class_id, day, slot_id))
            .cloned()
    }

    /// Ordered by class, day, slot.
    pub fn snapshot(&self) -> Vec<Assignment> {
        self.cells.read().values().cloned().collect()
    }

    /// Last write wins. Neither subject nor teacher clears the cell.
    pub fn upsert(
        &self,
        class_id: &str,
        day: Day,
        slot_id: &str,
        subject_id: Option<&str>,
        teacher_id: Option<&str>,
    ) -> GridResult<Assignment> {
        let assignment = CellEdit {
            class_id: class_id.to_string(),
            day,
            slot_id: slot_id.to_string(),
            subject_id: subject_id.map(str::to_string),
            teacher_id: teacher_id.map(str::to_string),
        }
        .into_assignment();
        let _gate = self.write_gate.lock();
        self.apply(assignment.clone(), ConflictPolicy::Flag)?;
        Ok(assignment)
    }

    /// Upsert that also reports teacher double-bookings, and refuses them
    /// under `ConflictPolicy::Block`.
    pub fn upsert_checked(
        &self,
        edit: CellEdit,
        policy: ConflictPolicy,
    ) -> GridResult<UpsertOutcome> {
        let _gate = self.write_gate.lock();
        self.apply(edit.into_assignment(), policy)
    }

    /// Returns whether a cell was removed. Clearing an empty cell is a no-op
    /// and never reaches the backend.
    pub fn clear(&self, class_id: &str, day: Day, slot_id: &str) -> GridResult<bool> {
        let _gate = self.write_gate.lock();
        self.clear_locked(&CellKey::new(class_id, day, slot_id))
    }

    pub fn conflicts_for(
        &self,
        day: Day,
        slot_id: &str,
        teacher_id: &str,
        class_id: &str,
    ) -> BTreeSet<String> {
        conflicts::conflicts_for(self.cells.read().values(), day, slot_id, teacher_id, class_id)
    }

    pub fn conflict_report(&self) -> Vec<ConflictRecord> {
        conflicts::conflict_report(self.cells.read().values())
    }

    pub fn class_view(&self, class_id: &str) -> ClassView {
        views::class_view(self.cells.read().values(), class_id)
    }

    pub fn teacher_view(&self, teacher_id: &str) -> TeacherView {
        views::teacher_view(self.cells.read().values(), teacher_id)
    }

    // Caller holds the write gate.
    fn apply(&self, assignment: Assignment, policy: ConflictPolicy) -> GridResult<UpsertOutcome> {
        if assignment.is_empty() {
            self.clear_locked(&assignment.key())?;
            return Ok(UpsertOutcome {
                assignment: None,
                conflicts: BTreeSet::new(),
            });
        }

        self.validate(&assignment)?;

        let conflicts = match assignment.teacher_id.as_deref() {
            Some(teacher_id) => self.conflicts_for(
                assignment.day,
                &assignment.slot_id,
                teacher_id,
                &assignment.class_id,
            ),
            None => BTreeSet::new(),
        };
        if !conflicts.is_empty() {
            if policy == ConflictPolicy::Block {
                warn!(
                    class_id = %assignment.class_id,
                    day = %assignment.day,
                    slot_id = %assignment.slot_id,
                    "rejected double-booking"
                );
                return Err(GridError::TeacherConflict {
                    teacher_id: assignment.teacher_id.clone().unwrap_or_default(),
                    day: assignment.day,
                    slot_id: assignment.slot_id.clone(),
                    classes: conflicts,
                });
            }
            debug!(count = conflicts.len(), "teacher double-booked, flagging");
        }

        self.backend
            .save(&assignment)
            .map_err(|e| GridError::persistence("save", e))?;
        self.cells.write().insert(assignment.key(), assignment.clone());
        info!(
            class_id = %assignment.class_id,
            day = %assignment.day,
            slot_id = %assignment.slot_id,
            "cell assigned"
        );

        Ok(UpsertOutcome {
            assignment: Some(assignment),
            conflicts,
        })
    }

    fn clear_locked(&self, key: &CellKey) -> GridResult<bool> {
        if !self.cells.read().contains_key(key) {
            return Ok(false);
        }
        self.backend
            .remove(&key.class_id, key.day, &key.slot_id)
            .map_err(|e| GridError::persistence("remove", e))?;
        self.cells.write().remove(key);
        info!(class_id = %key.class_id, day = %key.day, slot_id = %key.slot_id, "cell cleared");
        Ok(true)
    }

    fn validate(&self, a: &Assignment) -> GridResult<()> {
        check(ReferenceKind::Class, &a.class_id, self.backend.class_exists(&a.class_id))?;
        if let Some(id) = a.subject_id.as_deref() {
            check(ReferenceKind::Subject, id, self.backend.subject_exists(id))?;
        }
        if let Some(id) = a.teacher_id.as_deref() {
            check(ReferenceKind::Teacher, id, self.backend.teacher_exists(id))?;
        }
        Ok(())
    }
}

fn check(kind: ReferenceKind, id: &str, exists: anyhow::Result<bool>) -> GridResult<()> {
    match exists {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!(%kind, id, "unknown reference");
            Err(GridError::InvalidReference {
                kind,
                id: id.to_string(),
            })
        }
        Err(e) => Err(GridError::persistence("lookup", e)),
    }
}
