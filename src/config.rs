//! Configuration types.
//!
//! Everything here is read once at process start and is read-only afterwards.

use std::time::Duration;

use lettre::message::Mailbox;
use secrecy::SecretString;

use crate::error::ConfigError;

/// Default SMTP relay (in-cluster mailpit).
pub const DEFAULT_SMTP_HOST: &str = "mailpit.event-discovery.svc";
pub const DEFAULT_SMTP_PORT: u16 = 1025;
pub const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAIL_FROM: &str = "\"Website Order\" <shop-notifications@shop.com>";
pub const DEFAULT_MAIL_TO: &str = "shop-notifications@example.com";
pub const DEFAULT_PORT: u16 = 8080;

/// Selects ingestion strictness and rendering behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Reject payloads missing customer name/email, items or total.
    pub require_fields: bool,
    /// Render the full order summary instead of a placeholder body.
    pub render_template: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            require_fields: true,
            render_template: true,
        }
    }
}

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (SMTPS). Plain connection when false.
    pub secure: bool,
    pub credentials: Option<SmtpCredentials>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: SecretString,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
            secure: false,
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_SMTP_TIMEOUT_SECS),
        }
    }
}

/// Fixed sender and recipient of every notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailIdentity {
    pub from: Mailbox,
    pub to: Mailbox,
}

impl MailIdentity {
    pub fn new(from: &str, to: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            from: parse_mailbox("MAIL_FROM", from)?,
            to: parse_mailbox("MAIL_TO", to)?,
        })
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub pipeline: PipelineConfig,
    pub smtp: SmtpConfig,
    pub identity: MailIdentity,
    /// HTTP listen port.
    pub port: u16,
}

impl NotifierConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pipeline = PipelineConfig {
            require_fields: parse_bool(&lookup, "NOTIFIER_REQUIRE_FIELDS", true)?,
            render_template: parse_bool(&lookup, "NOTIFIER_RENDER_TEMPLATE", true)?,
        };

        let credentials = match (lookup("SMTP_USERNAME"), lookup("SMTP_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpCredentials {
                username,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::IncompleteCredentials("SMTP_USERNAME")),
            (None, Some(_)) => return Err(ConfigError::IncompleteCredentials("SMTP_PASSWORD")),
        };

        let smtp = SmtpConfig {
            host: lookup("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            port: parse_number(&lookup, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
            secure: parse_bool(&lookup, "SMTP_SECURE", false)?,
            credentials,
            timeout: Duration::from_secs(parse_number(
                &lookup,
                "SMTP_TIMEOUT_SECS",
                DEFAULT_SMTP_TIMEOUT_SECS,
            )?),
        };

        let identity = MailIdentity {
            from: parse_mailbox(
                "MAIL_FROM",
                &lookup("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            )?,
            to: parse_mailbox(
                "MAIL_TO",
                &lookup("MAIL_TO").unwrap_or_else(|| DEFAULT_MAIL_TO.to_string()),
            )?,
        };

        Ok(Self {
            pipeline,
            smtp,
            identity,
            port: parse_number(&lookup, "PORT", DEFAULT_PORT)?,
        })
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{e}"),
        }),
        None => Ok(default),
    }
}

fn parse_mailbox(key: &str, raw: &str) -> Result<Mailbox, ConfigError> {
    raw.parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("invalid mailbox {raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = NotifierConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.smtp.host, DEFAULT_SMTP_HOST);
        assert_eq!(config.smtp.port, 1025);
        assert!(!config.smtp.secure);
        assert!(config.smtp.credentials.is_none());
        assert_eq!(config.smtp.timeout, Duration::from_secs(30));
        assert_eq!(config.identity.from.email.to_string(), "shop-notifications@shop.com");
        assert_eq!(config.identity.from.name.as_deref(), Some("Website Order"));
        assert_eq!(config.identity.to.email.to_string(), "shop-notifications@example.com");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn overrides_are_applied() {
        let config = NotifierConfig::from_lookup(lookup_from(&[
            ("SMTP_HOST", "smtp.example.org"),
            ("SMTP_PORT", "465"),
            ("SMTP_SECURE", "true"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "hunter2"),
            ("NOTIFIER_REQUIRE_FIELDS", "false"),
            ("NOTIFIER_RENDER_TEMPLATE", "off"),
            ("MAIL_TO", "Ops <ops@example.org>"),
        ]))
        .unwrap();

        assert_eq!(config.smtp.host, "smtp.example.org");
        assert_eq!(config.smtp.port, 465);
        assert!(config.smtp.secure);
        let creds = config.smtp.credentials.unwrap();
        assert_eq!(creds.username, "mailer");
        assert_eq!(creds.password.expose_secret(), "hunter2");
        assert!(!config.pipeline.require_fields);
        assert!(!config.pipeline.render_template);
        assert_eq!(config.identity.to.email.to_string(), "ops@example.org");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = NotifierConfig::from_lookup(lookup_from(&[("SMTP_PORT", "smtp")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SMTP_PORT"));
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let err = NotifierConfig::from_lookup(lookup_from(&[("SMTP_SECURE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SMTP_SECURE"));
    }

    #[test]
    fn invalid_mailbox_is_rejected() {
        let err = NotifierConfig::from_lookup(lookup_from(&[("MAIL_FROM", "not an address")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MAIL_FROM"));
    }

    #[test]
    fn username_without_password_is_rejected() {
        let err = NotifierConfig::from_lookup(lookup_from(&[("SMTP_USERNAME", "mailer")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteCredentials("SMTP_USERNAME")));
    }
}
