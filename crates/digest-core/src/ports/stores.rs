//! Store ports - read side of the application database.
//!
//! The dispatcher only reads. Events, projects and users are written by other
//! parts of the application.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{DigestEvent, DigestEventType, Project, ProjectId, StoreError, User, UserId};

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Distinct project ids referenced by at least one event of `day`.
    async fn project_ids_on(&self, day: NaiveDate) -> Result<Vec<ProjectId>, StoreError>;

    /// Events of `project` on `day` whose type is one of `types`, in store order.
    async fn events_for(
        &self,
        project: &ProjectId,
        day: NaiveDate,
        types: &[DigestEventType],
    ) -> Result<Vec<DigestEvent>, StoreError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Looks a project up by id.
    ///
    /// With `member = Some(user)` the project must also list `user` among its
    /// members; otherwise the lookup yields `None`, the same as a missing project.
    async fn find_project(
        &self,
        id: &ProjectId,
        member: Option<&UserId>,
    ) -> Result<Option<Project>, StoreError>;
}

#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn is_admin(&self, user: &UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Users subscribed to at least one of `projects` who did not opt out of
    /// the daily digest.
    async fn find_digest_recipients(&self, projects: &[ProjectId]) -> Result<Vec<User>, StoreError>;
}
