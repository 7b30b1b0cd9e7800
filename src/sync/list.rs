use std::collections::HashMap;

use crate::models::LessonView;

/// Whether `next` should replace `current` on screen.
///
/// Lists differ when their lengths or id sets differ, or when any lesson
/// present in both changed its time slot or subject. Order alone is not a
/// difference.
pub fn lessons_differ(current: &[LessonView], next: &[LessonView]) -> bool {
    if current.len() != next.len() {
        return true;
    }

    let mut current_ids: Vec<u64> = current.iter().map(|l| l.id).collect();
    let mut next_ids: Vec<u64> = next.iter().map(|l| l.id).collect();
    current_ids.sort_unstable();
    next_ids.sort_unstable();
    if current_ids != next_ids {
        return true;
    }

    let by_id: HashMap<u64, &LessonView> = current.iter().map(|l| (l.id, l)).collect();
    next.iter().any(|lesson| match by_id.get(&lesson.id) {
        Some(old) => old.start != lesson.start || old.subject != lesson.subject,
        None => true,
    })
}

/// Stable sort by time-slot label; "08:30-09:50" style labels sort
/// chronologically as plain strings.
pub fn sort_by_start(lessons: &mut [LessonView]) {
    lessons.sort_by(|a, b| a.start.cmp(&b.start));
}

/// Insert `created` (or replace the entry with the same id), keeping the
/// list sorted by start.
pub fn merge_created(current: &[LessonView], created: LessonView) -> Vec<LessonView> {
    let mut merged = current.to_vec();
    match merged.iter_mut().find(|l| l.id == created.id) {
        Some(existing) => *existing = created,
        None => merged.push(created),
    }
    sort_by_start(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u64, start: &str, subject: &str) -> LessonView {
        LessonView {
            id,
            subject: subject.to_string(),
            kind: "Ma'ruza".to_string(),
            start: start.to_string(),
            room: "A-204".to_string(),
            group: "221-21".to_string(),
            date: None,
        }
    }

    #[test]
    fn test_same_ids_and_fields_in_any_order_are_equal() {
        let a = vec![view(1, "08:30", "Fizika"), view(2, "10:00", "Kimyo")];
        let b = vec![view(2, "10:00", "Kimyo"), view(1, "08:30", "Fizika")];
        assert!(!lessons_differ(&a, &b));
    }

    #[test]
    fn test_room_change_alone_is_not_a_difference() {
        let a = vec![view(1, "08:30", "Fizika")];
        let mut moved = view(1, "08:30", "Fizika");
        moved.room = "B-101".to_string();
        assert!(!lessons_differ(&a, &[moved]));
    }

    #[test]
    fn test_detects_length_id_start_and_subject_changes() {
        let base = vec![view(1, "08:30", "Fizika"), view(2, "10:00", "Kimyo")];

        assert!(lessons_differ(&base, &base[..1]));
        assert!(lessons_differ(
            &base,
            &[view(1, "08:30", "Fizika"), view(3, "10:00", "Kimyo")]
        ));
        assert!(lessons_differ(
            &base,
            &[view(1, "08:30", "Fizika"), view(2, "11:30", "Kimyo")]
        ));
        assert!(lessons_differ(
            &base,
            &[view(1, "08:30", "Fizika"), view(2, "10:00", "Biologiya")]
        ));
        assert!(!lessons_differ(&[], &[]));
    }

    #[test]
    fn test_merge_inserts_sorted() {
        let current = vec![view(1, "10:00-11:20", "Fizika"), view(2, "13:30-14:50", "Kimyo")];
        let merged = merge_created(&current, view(31, "08:30-09:50", "Matematika"));

        let ids: Vec<u64> = merged.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![31, 1, 2]);
        assert_eq!(current.len(), 2);
    }

    #[test]
    fn test_merge_replaces_by_id() {
        let current = vec![view(1, "10:00-11:20", "Fizika"), view(2, "13:30-14:50", "Kimyo")];
        let merged = merge_created(&current, view(2, "08:30-09:50", "Kimyo amaliyot"));

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, 2);
        assert_eq!(merged[0].subject, "Kimyo amaliyot");
    }
}
