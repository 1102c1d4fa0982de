//! Turns media sources into the raw bytes that get stored.

use crate::error::SubmissionError;
use crate::forms::submission::{MediaSource, ValidSubmission};
use crate::forms::variant::MediaSlot;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static DATA_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,").expect("data uri pattern"));

/// Browsers and canvas exports are inconsistent about trailing `=`.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decoded bytes per media slot, in submission order.
pub type DecodedMedia = HashMap<&'static str, Vec<Vec<u8>>>;

/// Decodes one media item for `slot`.
///
/// Uploads must declare a content type the slot accepts; base64 strings may carry a
/// `data:image/<subtype>;base64,` prefix, which is dropped before decoding.
pub fn decode(slot: &MediaSlot, source: &MediaSource) -> Result<Vec<u8>, SubmissionError> {
    match source {
        MediaSource::Upload {
            content_type,
            bytes,
        } => {
            let content_type = content_type.as_deref().unwrap_or_default();
            if !slot.accept.allows(content_type) {
                return Err(SubmissionError::UnsupportedMediaType {
                    slot: slot.name.to_string(),
                    content_type: content_type.to_string(),
                });
            }
            Ok(bytes.clone())
        }
        MediaSource::Base64(data) => {
            let data = data.trim();
            let payload = DATA_URI_RE
                .find(data)
                .map_or(data, |prefix| &data[prefix.end()..]);
            LENIENT
                .decode(payload)
                .map_err(|e| SubmissionError::DecodeFailure {
                    slot: slot.name.to_string(),
                    cause: e.to_string(),
                })
        }
    }
}

/// Decodes every media slot of a validated submission, preserving the order of
/// multi-item slots. Blank sources are skipped.
pub fn decode_all(submission: &ValidSubmission) -> Result<DecodedMedia, SubmissionError> {
    let mut decoded = DecodedMedia::new();
    for slot in submission.variant.media {
        let mut items = Vec::new();
        for source in submission.raw.media(slot.name) {
            if source.is_empty() {
                continue;
            }
            items.push(decode(slot, source)?);
        }
        if !items.is_empty() {
            decoded.insert(slot.name, items);
        }
    }
    Ok(decoded)
}
