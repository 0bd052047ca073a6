use std::collections::BTreeMap;

use super::types::{Assignment, Day, TeacherCell};

pub type ClassView = BTreeMap<(Day, String), Assignment>;
pub type TeacherView = BTreeMap<(Day, String), Vec<TeacherCell>>;

pub fn class_view<'a, I>(assignments: I, class_id: &str) -> ClassView
where
    I: IntoIterator<Item = &'a Assignment>,
{
    assignments
        .into_iter()
        .filter(|a| a.class_id == class_id)
        .map(|a| ((a.day, a.slot_id.clone()), a.clone()))
        .collect()
}

/// Inverted index over the snapshot, rebuilt on each call.
pub fn teacher_view<'a, I>(assignments: I, teacher_id: &str) -> TeacherView
where
    I: IntoIterator<Item = &'a Assignment>,
{
    let mut view = TeacherView::new();
    for a in assignments {
        if a.teacher_id.as_deref() != Some(teacher_id) {
            continue;
        }
        view.entry((a.day, a.slot_id.clone()))
            .or_default()
            .push(TeacherCell {
                class_id: a.class_id.clone(),
                subject_id: a.subject_id.clone(),
            });
    }
    for cells in view.values_mut() {
        cells.sort_by(|x, y| x.class_id.cmp(&y.class_id));
    }
    view
}
