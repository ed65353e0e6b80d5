//! Transport settings from the environment and an optional `.env` file
//!
//! The process environment always wins over the file. Resolution happens once
//! at startup; the resulting [`TransportConfig`] is immutable afterwards.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::transport::TransportKind;

const DEFAULT_DOTENV_PATH: &str = ".env";
const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_RESEND_FROM: &str = "onboarding@resend.dev";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("You have to set RESEND_API_KEY in ENV or .env file")]
    MissingApiKey,

    #[error("Failed to read {path}: {source}")]
    DotEnv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Snapshot of configuration key/values, environment layered over `.env`.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: HashMap<String, String>,
}

impl Vars {
    /// Load `SENDMAIL_DOTENV` (or `./.env`) and overlay the process environment.
    pub fn from_process() -> Result<Self, ConfigError> {
        let path = std::env::var("SENDMAIL_DOTENV")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOTENV_PATH));
        Self::load(&path, unicode_only(std::env::vars_os()))
    }

    /// Read `dotenv_path` if it exists, then apply `env` on top of it.
    pub fn load(
        dotenv_path: &Path,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();

        match dotenvy::from_path_iter(dotenv_path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::DotEnv {
                        path: dotenv_path.to_path_buf(),
                        source,
                    })?;
                    values.insert(key, value);
                }
                debug!(path = %dotenv_path.display(), "Loaded .env file");
            }
            Err(e) if e.not_found() => {
                debug!(path = %dotenv_path.display(), "No .env file, using process environment only");
            }
            Err(source) => {
                return Err(ConfigError::DotEnv {
                    path: dotenv_path.to_path_buf(),
                    source,
                })
            }
        }

        values.extend(env);
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Like [`Vars::get`] but blank values count as unset
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Settings for the Resend HTTP API
#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub from_address: String,
    pub base_url: String,
    /// Escape the body before wrapping it in `<p>`
    pub escape_html: bool,
}

impl ResendConfig {
    /// Resolve from `RESEND_API_KEY`, `FROM_EMAIL`, `RESEND_BASE_URL`, `MAIL_HTML_ESCAPE`.
    ///
    /// A missing API key is the one unrecoverable error: the plugin cannot
    /// serve anything without it.
    pub fn resolve(vars: &Vars) -> Result<Self, ConfigError> {
        let api_key = vars
            .non_empty("RESEND_API_KEY")
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        let from_address = vars
            .non_empty("FROM_EMAIL")
            .unwrap_or(DEFAULT_RESEND_FROM)
            .to_string();

        let base_url = vars
            .non_empty("RESEND_BASE_URL")
            .unwrap_or(DEFAULT_RESEND_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let escape_html = match vars.non_empty("MAIL_HTML_ESCAPE") {
            Some(v) => parse_bool(v),
            None => true,
        };
        if !escape_html {
            warn!("MAIL_HTML_ESCAPE is off: email bodies are embedded in HTML unescaped");
        }

        info!(from = %from_address, base_url = %base_url, "Resend transport configured");
        Ok(Self {
            api_key,
            from_address,
            base_url,
            escape_html,
        })
    }
}

/// Settings for direct SMTP submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    /// `None` when `SMTP_PORT` is missing or not a port number
    pub port: Option<u16>,
    pub from_address: String,
}

impl SmtpConfig {
    /// Resolve from `SMTP_HOST`, `SMTP_PORT`, `FROM_EMAIL`.
    ///
    /// Never fails. Missing values are kept and only show up when a send is
    /// attempted.
    pub fn resolve(vars: &Vars) -> Self {
        let host = vars.get("SMTP_HOST").unwrap_or_default().trim().to_string();
        let port = vars.get("SMTP_PORT").and_then(|p| p.trim().parse::<u16>().ok());
        let from_address = vars.get("FROM_EMAIL").unwrap_or_default().trim().to_string();

        if host.is_empty() || port.is_none() {
            warn!(host = %host, "SMTP_HOST or SMTP_PORT not set; sends will fail");
        } else {
            info!(host = %host, port = ?port, from = %from_address, "SMTP transport configured");
        }

        Self {
            host,
            port,
            from_address,
        }
    }

    /// `host:port`, or `None` if either half is missing
    pub fn address(&self) -> Option<String> {
        match self.port {
            Some(port) if !self.host.is_empty() => Some(format!("{}:{}", self.host, port)),
            _ => None,
        }
    }
}

/// Transport settings chosen at startup
#[derive(Debug, Clone)]
pub enum TransportConfig {
    Resend(ResendConfig),
    Smtp(SmtpConfig),
}

impl TransportConfig {
    pub fn resolve(kind: TransportKind, vars: &Vars) -> Result<Self, ConfigError> {
        Ok(match kind {
            TransportKind::Resend => Self::Resend(ResendConfig::resolve(vars)?),
            TransportKind::Smtp => Self::Smtp(SmtpConfig::resolve(vars)),
        })
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Resend(_) => TransportKind::Resend,
            Self::Smtp(_) => TransportKind::Smtp,
        }
    }
}

/// Drop environment entries whose key or value is not valid Unicode
fn unicode_only(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resend_requires_api_key() {
        let vars = Vars::from_iter([("FROM_EMAIL", "me@x.com")]);
        let err = ResendConfig::resolve(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_resend_blank_api_key_is_missing() {
        let vars = Vars::from_iter([("RESEND_API_KEY", "  ")]);
        assert!(matches!(
            ResendConfig::resolve(&vars),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_resend_defaults() {
        let vars = Vars::from_iter([("RESEND_API_KEY", "re_123")]);
        let config = ResendConfig::resolve(&vars).unwrap();
        assert_eq!(config.api_key, "re_123");
        assert_eq!(config.from_address, "onboarding@resend.dev");
        assert_eq!(config.base_url, "https://api.resend.com");
        assert!(config.escape_html);
    }

    #[test]
    fn test_resend_overrides() {
        let vars = Vars::from_iter([
            ("RESEND_API_KEY", "re_123"),
            ("FROM_EMAIL", "bot@example.com"),
            ("RESEND_BASE_URL", "http://127.0.0.1:9000/"),
            ("MAIL_HTML_ESCAPE", "off"),
        ]);
        let config = ResendConfig::resolve(&vars).unwrap();
        assert_eq!(config.from_address, "bot@example.com");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert!(!config.escape_html);
    }

    #[test]
    fn test_smtp_resolves_without_values() {
        let config = SmtpConfig::resolve(&Vars::default());
        assert!(config.host.is_empty());
        assert_eq!(config.port, None);
        assert_eq!(config.address(), None);
    }

    #[test]
    fn test_smtp_full() {
        let vars = Vars::from_iter([
            ("SMTP_HOST", "localhost"),
            ("SMTP_PORT", "2525"),
            ("FROM_EMAIL", "me@x.com"),
        ]);
        let config = SmtpConfig::resolve(&vars);
        assert_eq!(config.port, Some(2525));
        assert_eq!(config.address().as_deref(), Some("localhost:2525"));
        assert_eq!(config.from_address, "me@x.com");
    }

    #[test]
    fn test_smtp_bad_port_kept_as_none() {
        let vars = Vars::from_iter([("SMTP_HOST", "localhost"), ("SMTP_PORT", "smtp")]);
        let config = SmtpConfig::resolve(&vars);
        assert_eq!(config.port, None);
        assert_eq!(config.address(), None);
    }

    #[test]
    fn test_environment_wins_over_dotenv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "RESEND_API_KEY=from_file").unwrap();
        writeln!(file, "FROM_EMAIL=file@example.com").unwrap();

        let env = vec![("RESEND_API_KEY".to_string(), "from_env".to_string())];
        let vars = Vars::load(file.path(), env).unwrap();

        assert_eq!(vars.get("RESEND_API_KEY"), Some("from_env"));
        assert_eq!(vars.get("FROM_EMAIL"), Some("file@example.com"));
    }

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let vars = Vars::load(&dir.path().join(".env"), Vec::new()).unwrap();
        assert_eq!(vars.get("RESEND_API_KEY"), None);
    }

    #[test]
    fn test_transport_config_kind() {
        let vars = Vars::from_iter([("RESEND_API_KEY", "k"), ("FROM_EMAIL", "a@b.c")]);
        let config = TransportConfig::resolve(TransportKind::Resend, &vars).unwrap();
        assert_eq!(config.kind(), TransportKind::Resend);
        match config {
            TransportConfig::Resend(c) => assert_eq!(c.from_address, "a@b.c"),
            other => panic!("expected Resend, got {other:?}"),
        }

        let config = TransportConfig::resolve(TransportKind::Smtp, &Vars::default()).unwrap();
        assert_eq!(config.kind(), TransportKind::Smtp);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_env_entries_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let env = vec![
            (OsString::from("RESEND_API_KEY"), OsString::from("k")),
            (OsString::from("FROM_EMAIL"), OsString::from_vec(vec![0x66, 0xff])),
            (OsString::from_vec(vec![0xfe]), OsString::from("x")),
        ];
        let dir = tempfile::tempdir().unwrap();
        let vars = Vars::load(&dir.path().join(".env"), unicode_only(env)).unwrap();
        assert_eq!(vars.get("RESEND_API_KEY"), Some("k"));
        assert_eq!(vars.get("FROM_EMAIL"), None);
    }
}
