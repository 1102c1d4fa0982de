//! The submission domain: per-form descriptors, the raw input model, validation and
//! media decoding.

pub mod media;
pub mod submission;
pub mod validator;
pub mod variant;
