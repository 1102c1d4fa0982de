use serde::{Deserialize, Serialize};

/// Request and response body used by every endpoint in encrypted mode.
/// The envelope is optional on the way in so that a missing field can be
/// answered with a sealed error instead of an extractor failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<String>,
}

impl EnvelopeBody {
    pub fn new(envelope: String) -> Self {
        Self {
            envelope: Some(envelope),
        }
    }
}
