//! Process configuration, read once at start-up.
//!
//! Sources are layered: built-in defaults, then an optional `forms.toml` next to the
//! binary, then environment variables prefixed with `FORMS_` (for example
//! `FORMS_PORT=8080` or `FORMS_MODE=encrypted`).

use common::envelope::EnvelopeKey;
use config::{ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "forms";
const ENV_PREFIX: &str = "FORMS";

/// Request encoding accepted by the submission endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Multipart bodies in, plain JSON out.
    Plain,
    /// `{ "envelope": "v:1,..." }` bodies in both directions.
    Encrypted,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub mode: Mode,
    /// Ceiling for a single uploaded file part in plain mode.
    pub max_upload_bytes: usize,
    /// Ceiling for file parts in one plain-mode request.
    pub max_files: usize,
    /// Ceiling for text parts in one plain-mode request.
    pub max_fields: usize,
    /// Ceiling for the whole JSON body in encrypted mode.
    pub max_envelope_bytes: usize,
    pub envelope_key: Option<String>,
    pub envelope_iv: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5057,
            database_path: "forms.sqlite".to_string(),
            mode: Mode::Plain,
            max_upload_bytes: 5 * 1024 * 1024,
            max_files: 10,
            max_fields: 50,
            max_envelope_bytes: 50 * 1024 * 1024,
            envelope_key: None,
            envelope_iv: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("mode", "plain")?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
            .set_default("max_files", defaults.max_files as i64)?
            .set_default("max_fields", defaults.max_fields as i64)?
            .set_default("max_envelope_bytes", defaults.max_envelope_bytes as i64)
    }

    /// Builds the envelope key pair. Encrypted mode refuses to run without one;
    /// plain mode ignores whatever is configured.
    pub fn envelope_key(&self) -> Result<Option<EnvelopeKey>, ConfigError> {
        if self.mode == Mode::Plain {
            return Ok(None);
        }
        let (Some(key), Some(iv)) = (&self.envelope_key, &self.envelope_iv) else {
            return Err(ConfigError::Message(
                "FORMS_ENVELOPE_KEY and FORMS_ENVELOPE_IV must be set in encrypted mode".into(),
            ));
        };
        EnvelopeKey::from_secrets(key, iv)
            .map(Some)
            .map_err(|e| ConfigError::Message(e.to_string()))
    }
}
