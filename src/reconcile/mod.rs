use crate::models::{NoteFields, NoteSnapshot};
use crate::session::SessionMarkers;
use std::collections::{HashMap, HashSet};

/// A remote note the local side hasn't rendered yet.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateInstruction {
    pub note_data: NoteSnapshot,

    /// True when the note was created locally and the server is only catching
    /// up: confirm the existing render instead of animating a new note in.
    pub is_new_note: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteDiff {
    pub to_create: Vec<CreateInstruction>,
    /// Carries the remote (authoritative) values.
    pub to_update: Vec<NoteSnapshot>,
    pub to_remove: Vec<String>,
}

impl NoteDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

/// Three-way diff between what is rendered and one remote snapshot.
///
/// The caller must hand over a single consistent snapshot and must not mutate
/// `current` during the call. Order within each list carries no meaning.
/// Duplicate ids in `remote` resolve to their first occurrence.
pub fn calculate_note_diff(
    current: &HashMap<String, NoteFields>,
    remote: &[NoteSnapshot],
    markers: &SessionMarkers,
) -> NoteDiff {
    let mut diff = NoteDiff::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(remote.len());

    for note in remote {
        if !seen.insert(note.id.as_str()) {
            continue;
        }

        match current.get(&note.id) {
            Some(local) => {
                if local.content != note.content || local.theme != note.theme {
                    diff.to_update.push(note.clone());
                }
            }
            None => diff.to_create.push(CreateInstruction {
                note_data: note.clone(),
                is_new_note: markers.contains(&note.id),
            }),
        }
    }

    // Locally created notes may be missing from a lagging snapshot.
    diff.to_remove = current
        .keys()
        .filter(|id| !seen.contains(id.as_str()) && !markers.contains(id))
        .cloned()
        .collect();

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(entries: &[(&str, &str, &str)]) -> HashMap<String, NoteFields> {
        entries
            .iter()
            .map(|(id, content, theme)| (id.to_string(), NoteFields::new(*content, *theme)))
            .collect()
    }

    #[test]
    fn test_missing_remote_note_is_removed() {
        let current = local(&[("id1", "a", "yellow"), ("id2", "b", "yellow")]);
        let remote = vec![NoteSnapshot::new("id1", "a", "yellow")];
        let diff = calculate_note_diff(&current, &remote, &SessionMarkers::new());
        assert_eq!(diff.to_remove, vec!["id2".to_string()]);
        assert!(diff.to_create.is_empty());
        assert!(diff.to_update.is_empty());
    }

    #[test]
    fn test_session_marker_suppresses_removal() {
        let current = local(&[("id1", "a", "yellow"), ("id2", "b", "yellow")]);
        let remote = vec![NoteSnapshot::new("id1", "a", "yellow")];
        let mut markers = SessionMarkers::new();
        markers.mark("id2", 1_000);

        let diff = calculate_note_diff(&current, &remote, &markers);
        assert!(diff.to_remove.is_empty());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_remote_only_note_is_created_as_foreign() {
        let remote = vec![NoteSnapshot::new("new", "hello", "blue")];
        let diff = calculate_note_diff(&HashMap::new(), &remote, &SessionMarkers::new());
        assert_eq!(
            diff.to_create,
            vec![CreateInstruction {
                note_data: NoteSnapshot::new("new", "hello", "blue"),
                is_new_note: false,
            }]
        );
    }

    #[test]
    fn test_marked_create_is_flagged_as_new_note() {
        let remote = vec![NoteSnapshot::new("new", "hello", "blue")];
        let mut markers = SessionMarkers::new();
        markers.mark("new", 5);

        let diff = calculate_note_diff(&HashMap::new(), &remote, &markers);
        assert_eq!(diff.to_create.len(), 1);
        assert!(diff.to_create[0].is_new_note);
    }

    #[test]
    fn test_changed_content_updates_with_remote_values() {
        let current = local(&[("id1", "old", "yellow")]);
        let remote = vec![NoteSnapshot::new("id1", "new", "yellow")];
        let diff = calculate_note_diff(&current, &remote, &SessionMarkers::new());
        assert_eq!(diff.to_update.len(), 1);
        assert_eq!(diff.to_update[0].content, "new");
        assert!(diff.to_create.is_empty());
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn test_theme_change_alone_triggers_update() {
        let current = local(&[("id1", "same", "yellow")]);
        let remote = vec![NoteSnapshot::new("id1", "same", "pink")];
        let diff = calculate_note_diff(&current, &remote, &SessionMarkers::new());
        assert_eq!(diff.to_update[0].theme, "pink");
    }

    #[test]
    fn test_unchanged_note_produces_no_work() {
        let current = local(&[("id1", "same", "yellow")]);
        let mut snap = NoteSnapshot::new("id1", "same", "yellow");
        snap.extra
            .insert("updatedAt".to_string(), serde_json::json!(12345));
        let diff = calculate_note_diff(&current, &[snap], &SessionMarkers::new());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_duplicate_remote_ids_do_not_panic() {
        let remote = vec![
            NoteSnapshot::new("dup", "first", "yellow"),
            NoteSnapshot::new("dup", "second", "yellow"),
        ];
        let diff = calculate_note_diff(&HashMap::new(), &remote, &SessionMarkers::new());
        assert_eq!(diff.to_create.len(), 1);
        assert_eq!(diff.to_create[0].note_data.content, "first");
    }
}
