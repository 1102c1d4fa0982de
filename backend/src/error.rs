use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::envelope::EnvelopeError;
use common::model::failure::ErrorBody;
use thiserror::Error;

/// Reason a submission was turned away by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: String,
    /// Fields that would have satisfied a presence check.
    pub required: Option<Vec<&'static str>>,
    /// Allow-list of a rejected enum value.
    pub valid_types: Option<Vec<&'static str>>,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            required: None,
            valid_types: None,
        }
    }

    pub fn missing(reason: impl Into<String>, required: &[&'static str]) -> Self {
        Self {
            required: Some(required.to_vec()),
            ..Self::new(reason)
        }
    }

    pub fn not_in(reason: impl Into<String>, valid_types: &[&'static str]) -> Self {
        Self {
            valid_types: Some(valid_types.to_vec()),
            ..Self::new(reason)
        }
    }
}

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Missing encrypted envelope")]
    MissingEnvelope,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("{0}")]
    Envelope(#[from] EnvelopeError),
    #[error("{}", .0.reason)]
    Rejected(Rejection),
    #[error("Unsupported media type `{content_type}` for `{slot}`")]
    UnsupportedMediaType { slot: String, content_type: String },
    #[error("Could not decode `{slot}`: {cause}")]
    DecodeFailure { slot: String, cause: String },
    #[error("Upload error: LIMIT_FILE_SIZE")]
    PayloadTooLarge,
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("{0}")]
    PersistenceFailure(String),
}

impl From<Rejection> for SubmissionError {
    fn from(rejection: Rejection) -> Self {
        SubmissionError::Rejected(rejection)
    }
}

impl From<rusqlite::Error> for SubmissionError {
    fn from(e: rusqlite::Error) -> Self {
        SubmissionError::PersistenceFailure(e.to_string())
    }
}

impl From<actix_multipart::MultipartError> for SubmissionError {
    fn from(e: actix_multipart::MultipartError) -> Self {
        SubmissionError::Upload(e.to_string())
    }
}

impl SubmissionError {
    pub fn status(&self) -> StatusCode {
        match self {
            SubmissionError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            SubmissionError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing body. Persistence failures carry the underlying message
    /// unredacted, matching what existing clients already display.
    pub fn body(&self) -> ErrorBody {
        match self {
            SubmissionError::MissingEnvelope => {
                ErrorBody::new(self.to_string()).with_required(["envelope"])
            }
            SubmissionError::InvalidBody(cause) => {
                ErrorBody::new("Invalid request body").with_message(cause.clone())
            }
            SubmissionError::Envelope(e) => {
                ErrorBody::new("Failed to decrypt request data").with_message(e.to_string())
            }
            SubmissionError::Rejected(rejection) => {
                let mut body = ErrorBody::new(rejection.reason.clone());
                if let Some(required) = &rejection.required {
                    body = body.with_required(required.iter().copied());
                }
                if let Some(valid_types) = &rejection.valid_types {
                    body = body.with_valid_types(valid_types.iter().copied());
                }
                body
            }
            SubmissionError::UnsupportedMediaType { .. }
            | SubmissionError::DecodeFailure { .. } => {
                ErrorBody::new("Invalid media").with_message(self.to_string())
            }
            SubmissionError::PayloadTooLarge | SubmissionError::Upload(_) => {
                ErrorBody::new(self.to_string())
            }
            SubmissionError::PersistenceFailure(cause) => {
                ErrorBody::new("Internal server error").with_message(cause.clone())
            }
        }
    }
}

impl ResponseError for SubmissionError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status()).json(self.body())
    }
}
