//! Digest events: one record per tracked change to a task.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{DigestEventId, ProjectId, UserId};

/// Kind of task change recorded by a digest event.
///
/// Serialized with the names the application writes into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestEventType {
    #[serde(rename = "tasks.create")]
    Create,
    #[serde(rename = "tasks.complete")]
    Complete,
    #[serde(rename = "tasks.uncomplete")]
    Uncomplete,
    #[serde(rename = "tasks.update")]
    Update,
    #[serde(rename = "tasks.remove")]
    Remove,
    #[serde(rename = "tasks.deleteForever")]
    DeleteForever,
}

impl DigestEventType {
    pub const ALL: [DigestEventType; 6] = [
        DigestEventType::Create,
        DigestEventType::Complete,
        DigestEventType::Uncomplete,
        DigestEventType::Update,
        DigestEventType::Remove,
        DigestEventType::DeleteForever,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DigestEventType::Create => "tasks.create",
            DigestEventType::Complete => "tasks.complete",
            DigestEventType::Uncomplete => "tasks.uncomplete",
            DigestEventType::Update => "tasks.update",
            DigestEventType::Remove => "tasks.remove",
            DigestEventType::DeleteForever => "tasks.deleteForever",
        }
    }

    /// The email section this event type is reported under.
    pub fn bucket(self) -> DigestBucket {
        match self {
            DigestEventType::Complete => DigestBucket::Completed,
            DigestEventType::Create => DigestBucket::Created,
            DigestEventType::Update | DigestEventType::Uncomplete => DigestBucket::Updated,
            DigestEventType::Remove | DigestEventType::DeleteForever => DigestBucket::Removed,
        }
    }
}

impl fmt::Display for DigestEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four sections of a project digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestBucket {
    Completed,
    Created,
    /// Updates and un-completions.
    Updated,
    /// Removals and permanent deletions.
    Removed,
}

impl DigestBucket {
    pub const ALL: [DigestBucket; 4] = [
        DigestBucket::Completed,
        DigestBucket::Created,
        DigestBucket::Updated,
        DigestBucket::Removed,
    ];

    /// Event types that land in this bucket.
    pub fn event_types(self) -> &'static [DigestEventType] {
        match self {
            DigestBucket::Completed => &[DigestEventType::Complete],
            DigestBucket::Created => &[DigestEventType::Create],
            DigestBucket::Updated => &[DigestEventType::Update, DigestEventType::Uncomplete],
            DigestBucket::Removed => &[DigestEventType::Remove, DigestEventType::DeleteForever],
        }
    }
}

/// A single tracked change to a task. Immutable once written.
///
/// `when` is the calendar day the change belongs to; the writer normalizes
/// timestamps to their day before storing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestEvent {
    #[serde(rename = "_id")]
    pub id: DigestEventId,
    pub project_id: ProjectId,
    #[serde(rename = "type")]
    pub event_type: DigestEventType,
    pub when: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<UserId>,
}

impl DigestEvent {
    pub fn new(
        id: impl Into<String>,
        project_id: ProjectId,
        event_type: DigestEventType,
        when: NaiveDate,
    ) -> Self {
        Self {
            id: DigestEventId::new(id),
            project_id,
            event_type,
            when,
            task_id: None,
            task_name: None,
            author: None,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>, task_name: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self.task_name = Some(task_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::create(DigestEventType::Create, DigestBucket::Created)]
    #[case::complete(DigestEventType::Complete, DigestBucket::Completed)]
    #[case::uncomplete(DigestEventType::Uncomplete, DigestBucket::Updated)]
    #[case::update(DigestEventType::Update, DigestBucket::Updated)]
    #[case::remove(DigestEventType::Remove, DigestBucket::Removed)]
    #[case::delete_forever(DigestEventType::DeleteForever, DigestBucket::Removed)]
    fn event_type_maps_to_bucket(#[case] event_type: DigestEventType, #[case] bucket: DigestBucket) {
        assert_eq!(event_type.bucket(), bucket);
        assert!(bucket.event_types().contains(&event_type));
    }

    #[test]
    fn every_event_type_lands_in_exactly_one_bucket() {
        for event_type in DigestEventType::ALL {
            let hits = DigestBucket::ALL
                .iter()
                .filter(|b| b.event_types().contains(&event_type))
                .count();
            assert_eq!(hits, 1, "{event_type}");
        }
    }

    #[test]
    fn event_type_uses_stored_names() {
        let json = serde_json::to_string(&DigestEventType::DeleteForever).unwrap();
        assert_eq!(json, "\"tasks.deleteForever\"");

        let parsed: DigestEventType = serde_json::from_str("\"tasks.uncomplete\"").unwrap();
        assert_eq!(parsed, DigestEventType::Uncomplete);
    }

    #[test]
    fn event_deserializes_from_document_shape() {
        let doc = serde_json::json!({
            "_id": "d1",
            "projectId": "p1",
            "type": "tasks.create",
            "when": "2024-03-09",
            "taskName": "Write report"
        });
        let event: DigestEvent = serde_json::from_value(doc).unwrap();
        assert_eq!(event.project_id, ProjectId::new("p1"));
        assert_eq!(event.event_type, DigestEventType::Create);
        assert_eq!(event.when, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(event.task_name.as_deref(), Some("Write report"));
        assert!(event.author.is_none());
    }
}
