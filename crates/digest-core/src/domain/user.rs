//! User documents, as far as digests are concerned.
//!
//! Field names serialize in camelCase so the email template sees the same shape
//! as the stored document (`profile.digests`, `emailSettings.digests.daily`).

use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Projects the user subscribed to, in subscription order.
    #[serde(default)]
    pub digests: Vec<ProjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestEmailSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digests: Option<DigestEmailSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub emails: Vec<EmailAddress>,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_settings: Option<EmailSettings>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            emails: Vec::new(),
            profile: None,
            email_settings: None,
        }
    }

    pub fn with_email(mut self, address: impl Into<String>) -> Self {
        self.emails.push(EmailAddress {
            address: address.into(),
            verified: true,
        });
        self
    }

    /// Sets the profile subscription list, creating the profile if needed.
    pub fn subscribed_to<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let profile = self.profile.get_or_insert_with(Profile::default);
        profile.digests = projects.into_iter().map(ProjectId::new).collect();
        self
    }

    pub fn with_daily_digest(mut self, enabled: bool) -> Self {
        self.email_settings = Some(EmailSettings {
            digests: Some(DigestEmailSettings {
                daily: Some(enabled),
            }),
        });
        self
    }

    /// First registered address; digests are sent there.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(|e| e.address.as_str())
    }

    pub fn subscriptions(&self) -> &[ProjectId] {
        self.profile
            .as_ref()
            .map(|p| p.digests.as_slice())
            .unwrap_or_default()
    }

    /// Opted in unless the daily flag is explicitly `false`.
    pub fn wants_daily_digest(&self) -> bool {
        self.email_settings
            .as_ref()
            .and_then(|s| s.digests.as_ref())
            .and_then(|d| d.daily)
            != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_digest_defaults_to_opted_in() {
        let user = User::new("u1");
        assert!(user.wants_daily_digest());

        let user = User::new("u1").with_daily_digest(true);
        assert!(user.wants_daily_digest());

        let user = User::new("u1").with_daily_digest(false);
        assert!(!user.wants_daily_digest());
    }

    #[test]
    fn empty_settings_keep_user_opted_in() {
        let mut user = User::new("u1");
        user.email_settings = Some(EmailSettings { digests: None });
        assert!(user.wants_daily_digest());
    }

    #[test]
    fn user_deserializes_from_document_shape() {
        let doc = serde_json::json!({
            "_id": "u1",
            "emails": [{ "address": "a@example.com", "verified": true }],
            "profile": { "firstName": "Ada", "digests": ["p1", "p2"] },
            "emailSettings": { "digests": { "daily": false } }
        });
        let user: User = serde_json::from_value(doc).unwrap();
        assert_eq!(user.primary_email(), Some("a@example.com"));
        assert_eq!(user.subscriptions(), &[ProjectId::new("p1"), ProjectId::new("p2")]);
        assert!(!user.wants_daily_digest());
    }

    #[test]
    fn user_without_profile_has_no_subscriptions() {
        let user = User::new("u1");
        assert!(user.subscriptions().is_empty());
        assert!(user.primary_email().is_none());
    }
}
