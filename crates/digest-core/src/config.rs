//! Configuration for the digest job, read from environment variables.

use chrono_tz::Tz;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Paris;

/// Local hour of the daily run.
pub const DEFAULT_SEND_HOUR: u32 = 7;

pub const DEFAULT_ROOT_URL: &str = "http://localhost:3000";

/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Path of the email settings page, relative to the root URL.
pub const EMAIL_SETTINGS_PATH: &str = "/settings/mail";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set together with SMTP_HOST")]
    Missing(&'static str),
}

/// Settings the dispatcher needs at run time.
#[derive(Debug, Clone)]
pub struct DigestSettings {
    /// Zone that defines "yesterday" and "07:00 tomorrow".
    pub timezone: Tz,
    pub send_hour: u32,
    /// Absolute URL of the application, without trailing slash.
    pub root_url: String,
}

impl DigestSettings {
    pub fn email_settings_url(&self) -> String {
        format!("{}{}", self.root_url.trim_end_matches('/'), EMAIL_SETTINGS_PATH)
    }
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            send_hour: DEFAULT_SEND_HOUR,
            root_url: DEFAULT_ROOT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub digest: DigestSettings,
    /// Replaces the built-in `digest` template when set.
    pub template_path: Option<PathBuf>,
    /// `None` when SMTP_HOST is unset; only dry runs are possible then.
    pub smtp: Option<SmtpSettings>,
}

impl DigestConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `DIGEST_TIMEZONE`: IANA zone (default: Europe/Paris)
    /// - `DIGEST_SEND_HOUR`: hour of the daily run, 0-23 (default: 7)
    /// - `ROOT_URL`: application URL used for the settings link
    /// - `DIGEST_TEMPLATE`: optional template file overriding the built-in one
    /// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `DIGEST_FROM_EMAIL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timezone = match lookup("DIGEST_TIMEZONE") {
            Some(raw) => raw.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                var: "DIGEST_TIMEZONE",
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let send_hour = match lookup("DIGEST_SEND_HOUR") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(hour) if hour < 24 => hour,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DIGEST_SEND_HOUR",
                        reason: format!("expected an hour between 0 and 23, got {raw:?}"),
                    });
                }
            },
            None => DEFAULT_SEND_HOUR,
        };

        let root_url = lookup("ROOT_URL").unwrap_or_else(|| DEFAULT_ROOT_URL.to_string());
        let template_path = lookup("DIGEST_TEMPLATE").map(PathBuf::from);

        let smtp = match lookup("SMTP_HOST") {
            Some(host) => {
                let port = match lookup("SMTP_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        var: "SMTP_PORT",
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_SMTP_PORT,
                };
                let username = lookup("SMTP_USERNAME").ok_or(ConfigError::Missing("SMTP_USERNAME"))?;
                let password = lookup("SMTP_PASSWORD").ok_or(ConfigError::Missing("SMTP_PASSWORD"))?;
                let from_email = lookup("DIGEST_FROM_EMAIL").unwrap_or_else(|| username.clone());
                Some(SmtpSettings {
                    host,
                    port,
                    username,
                    password,
                    from_email,
                })
            }
            None => None,
        };

        Ok(Self {
            digest: DigestSettings {
                timezone,
                send_hour,
                root_url,
            },
            template_path,
            smtp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = DigestConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.digest.timezone, chrono_tz::Europe::Paris);
        assert_eq!(config.digest.send_hour, 7);
        assert_eq!(
            config.digest.email_settings_url(),
            "http://localhost:3000/settings/mail"
        );
        assert!(config.smtp.is_none());
        assert!(config.template_path.is_none());
    }

    #[test]
    fn settings_url_ignores_trailing_slash() {
        let config = DigestConfig::from_lookup(lookup(&[("ROOT_URL", "https://app.example.com/")])).unwrap();
        assert_eq!(
            config.digest.email_settings_url(),
            "https://app.example.com/settings/mail"
        );
    }

    #[test]
    fn smtp_requires_credentials() {
        let err = DigestConfig::from_lookup(lookup(&[("SMTP_HOST", "smtp.example.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SMTP_USERNAME")));

        let config = DigestConfig::from_lookup(lookup(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "bot@example.com"),
            ("SMTP_PASSWORD", "secret"),
        ]))
        .unwrap();
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_email, "bot@example.com");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(DigestConfig::from_lookup(lookup(&[("DIGEST_TIMEZONE", "Mars/Olympus")])).is_err());
        assert!(DigestConfig::from_lookup(lookup(&[("DIGEST_SEND_HOUR", "24")])).is_err());
        assert!(DigestConfig::from_lookup(lookup(&[("DIGEST_SEND_HOUR", "seven")])).is_err());
    }

    #[test]
    fn timezone_and_hour_are_read() {
        let config = DigestConfig::from_lookup(lookup(&[
            ("DIGEST_TIMEZONE", "America/New_York"),
            ("DIGEST_SEND_HOUR", "9"),
        ]))
        .unwrap();
        assert_eq!(config.digest.timezone, chrono_tz::America::New_York);
        assert_eq!(config.digest.send_hour, 9);
    }
}
