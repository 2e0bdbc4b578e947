//! In-memory stores (development, tests, fixture-backed CLI runs).
//!
//! Each store is a read-only snapshot; queries scan vectors in insertion order,
//! which keeps results deterministic.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::domain::{DigestEvent, DigestEventType, Project, ProjectId, StoreError, User, UserId};
use crate::ports::{EventStore, PermissionService, ProjectStore, UserStore};

#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    events: Vec<DigestEvent>,
}

impl InMemoryEventStore {
    pub fn new(events: Vec<DigestEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn project_ids_on(&self, day: NaiveDate) -> Result<Vec<ProjectId>, StoreError> {
        let mut seen = HashSet::new();
        Ok(self
            .events
            .iter()
            .filter(|e| e.when == day)
            .filter(|e| seen.insert(e.project_id.clone()))
            .map(|e| e.project_id.clone())
            .collect())
    }

    async fn events_for(
        &self,
        project: &ProjectId,
        day: NaiveDate,
        types: &[DigestEventType],
    ) -> Result<Vec<DigestEvent>, StoreError> {
        Ok(self
            .events
            .iter()
            .filter(|e| &e.project_id == project && e.when == day && types.contains(&e.event_type))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectStore {
    projects: Vec<Project>,
}

impl InMemoryProjectStore {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn find_project(
        &self,
        id: &ProjectId,
        member: Option<&UserId>,
    ) -> Result<Option<Project>, StoreError> {
        Ok(self
            .projects
            .iter()
            .find(|p| &p.id == id && member.is_none_or(|m| p.has_member(m)))
            .cloned())
    }
}

/// Fixed set of administrators.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    admins: HashSet<UserId>,
}

impl StaticPermissions {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PermissionService for StaticPermissions {
    async fn is_admin(&self, user: &UserId) -> Result<bool, StoreError> {
        Ok(self.admins.contains(user))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Vec<User>,
}

impl InMemoryUserStore {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_digest_recipients(&self, projects: &[ProjectId]) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.wants_daily_digest())
            .filter(|u| u.subscriptions().iter().any(|p| projects.contains(p)))
            .cloned()
            .collect())
    }
}

/// Snapshot of the application database, as stored in a JSON fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub admins: Vec<UserId>,
    #[serde(default)]
    pub events: Vec<DigestEvent>,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Query(format!("fixtures: {e}")))
    }

    pub fn event_store(&self) -> InMemoryEventStore {
        InMemoryEventStore::new(self.events.clone())
    }

    pub fn project_store(&self) -> InMemoryProjectStore {
        InMemoryProjectStore::new(self.projects.clone())
    }

    pub fn user_store(&self) -> InMemoryUserStore {
        InMemoryUserStore::new(self.users.clone())
    }

    pub fn permissions(&self) -> StaticPermissions {
        StaticPermissions::new(self.admins.iter().cloned())
    }
}
