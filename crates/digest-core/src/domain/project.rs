use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, UserId};

/// A project whose task activity is reported in digests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<UserId>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(id),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(UserId::new).collect();
        self
    }

    pub fn has_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }
}
