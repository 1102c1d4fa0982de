use crate::error::SubmissionError;
use crate::forms::variant::{StaffRule, Variant};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Where the bytes of one media item come from.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// A multipart file part, already read into memory.
    Upload {
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
    /// A base64 string, optionally carrying a `data:image/...;base64,` prefix.
    Base64(String),
}

impl MediaSource {
    pub fn is_empty(&self) -> bool {
        match self {
            MediaSource::Upload { bytes, .. } => bytes.is_empty(),
            MediaSource::Base64(data) => data.trim().is_empty(),
        }
    }
}

/// A submission as received, before any check has run.
#[derive(Debug, Default, Clone)]
pub struct RawSubmission {
    fields: HashMap<String, String>,
    media: HashMap<String, Vec<MediaSource>>,
}

impl RawSubmission {
    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn push_media(&mut self, slot: impl Into<String>, source: MediaSource) {
        self.media.entry(slot.into()).or_default().push(source);
    }

    /// The raw value of a text field, if one was sent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The value of a text field when it is non-blank.
    pub fn present(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|v| !v.trim().is_empty())
    }

    pub fn media(&self, slot: &str) -> &[MediaSource] {
        self.media.get(slot).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn media_count(&self, slot: &str) -> usize {
        self.media(slot).len()
    }

    /// Number of multipart file parts received for `slot`.
    pub fn upload_count(&self, slot: &str) -> usize {
        self.media(slot)
            .iter()
            .filter(|source| matches!(source, MediaSource::Upload { .. }))
            .count()
    }

    /// Drops the base64 sources of `slot`, keeping uploaded files.
    pub fn retain_uploads(&mut self, slot: &str) {
        if let Some(sources) = self.media.get_mut(slot) {
            sources.retain(|source| matches!(source, MediaSource::Upload { .. }));
        }
    }

    /// Whether `rule` applies. The role value must equal the sentinel exactly.
    pub fn is_staff(&self, rule: &StaffRule) -> bool {
        self.field(rule.role_field) == Some(rule.sentinel)
    }

    /// A slot counts as filled when it holds at least one non-empty source.
    pub fn has_media(&self, slot: &str) -> bool {
        self.media(slot).iter().any(|source| !source.is_empty())
    }

    /// Builds a submission from the decrypted JSON object of an envelope.
    ///
    /// Keys naming a media slot of `variant` are read as base64 strings (a single
    /// string or an array of strings); every other key becomes a text field.
    pub fn from_json(
        variant: &Variant,
        payload: Map<String, Value>,
    ) -> Result<Self, SubmissionError> {
        let mut raw = RawSubmission::default();
        for (key, value) in payload {
            if variant.media_slot(&key).is_some() {
                match value {
                    Value::Null => {}
                    Value::String(data) => raw.push_media(key, MediaSource::Base64(data)),
                    Value::Array(items) => {
                        for item in items {
                            let Value::String(data) = item else {
                                return Err(SubmissionError::DecodeFailure {
                                    slot: key,
                                    cause: "expected a base64 string".to_string(),
                                });
                            };
                            raw.push_media(key.clone(), MediaSource::Base64(data));
                        }
                    }
                    _ => {
                        return Err(SubmissionError::DecodeFailure {
                            slot: key,
                            cause: "expected a base64 string".to_string(),
                        })
                    }
                }
                continue;
            }
            match value {
                Value::Null => {}
                Value::String(text) => raw.insert_field(key, text),
                other => raw.insert_field(key, other.to_string()),
            }
        }
        Ok(raw)
    }
}

/// A submission that passed every check of its variant.
#[derive(Debug)]
pub struct ValidSubmission {
    pub variant: &'static Variant,
    pub raw: RawSubmission,
}

impl ValidSubmission {
    /// Text value to store for `field`: the submitted string, or `None` when blank.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.raw.present(field)
    }

    /// Whether the variant's staff rule is triggered by this submission.
    pub fn is_staff(&self) -> bool {
        self.variant
            .staff_rule
            .as_ref()
            .is_some_and(|rule| self.raw.is_staff(rule))
    }
}
