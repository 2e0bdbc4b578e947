//! Digest bundles: what one user receives for one day.

use serde::Serialize;

use super::event::{DigestBucket, DigestEvent};
use super::project::Project;

/// One project's events for the target day, split into the four email sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDigest {
    pub project: Project,
    pub completed: Vec<DigestEvent>,
    pub created: Vec<DigestEvent>,
    pub updated: Vec<DigestEvent>,
    pub removed: Vec<DigestEvent>,
}

impl ProjectDigest {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            completed: Vec::new(),
            created: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn bucket(&self, bucket: DigestBucket) -> &[DigestEvent] {
        match bucket {
            DigestBucket::Completed => &self.completed,
            DigestBucket::Created => &self.created,
            DigestBucket::Updated => &self.updated,
            DigestBucket::Removed => &self.removed,
        }
    }

    pub fn bucket_mut(&mut self, bucket: DigestBucket) -> &mut Vec<DigestEvent> {
        match bucket {
            DigestBucket::Completed => &mut self.completed,
            DigestBucket::Created => &mut self.created,
            DigestBucket::Updated => &mut self.updated,
            DigestBucket::Removed => &mut self.removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        DigestBucket::ALL.iter().all(|b| self.bucket(*b).is_empty())
    }

    pub fn event_count(&self) -> usize {
        DigestBucket::ALL.iter().map(|b| self.bucket(*b).len()).sum()
    }
}

/// Per-user collection of non-empty project digests.
///
/// Empty project digests are rejected on `push`, so an empty bundle means
/// "nothing to send".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DigestBundle {
    digests: Vec<ProjectDigest>,
}

impl DigestBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the digest unless all of its buckets are empty. Returns whether it was kept.
    pub fn push(&mut self, digest: ProjectDigest) -> bool {
        if digest.is_empty() {
            return false;
        }
        self.digests.push(digest);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn digests(&self) -> &[ProjectDigest] {
        &self.digests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::DigestEventType;
    use crate::domain::ids::ProjectId;
    use chrono::NaiveDate;

    fn event(kind: DigestEventType) -> DigestEvent {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        DigestEvent::new("d", ProjectId::new("p1"), kind, day)
    }

    #[test]
    fn empty_project_digest_is_dropped() {
        let mut bundle = DigestBundle::new();
        assert!(!bundle.push(ProjectDigest::new(Project::new("p1", "One"))));
        assert!(bundle.is_empty());
    }

    #[test]
    fn any_non_empty_bucket_keeps_the_digest() {
        for bucket in DigestBucket::ALL {
            let mut digest = ProjectDigest::new(Project::new("p1", "One"));
            digest
                .bucket_mut(bucket)
                .push(event(bucket.event_types()[0]));

            let mut bundle = DigestBundle::new();
            assert!(bundle.push(digest));
            assert_eq!(bundle.len(), 1);
            assert_eq!(bundle.digests()[0].event_count(), 1);
        }
    }

    #[test]
    fn bundle_serializes_as_list_of_projects() {
        let mut digest = ProjectDigest::new(Project::new("p1", "One"));
        digest.created.push(event(DigestEventType::Create));
        let mut bundle = DigestBundle::new();
        bundle.push(digest);

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json[0]["project"]["name"], "One");
        assert_eq!(json[0]["created"].as_array().unwrap().len(), 1);
        assert_eq!(json[0]["removed"].as_array().unwrap().len(), 0);
    }
}
