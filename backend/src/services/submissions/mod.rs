//! # Submission Service Module
//!
//! Registers the `add-info` endpoint of every form under its own scope:
//!
//! - `POST /api/campus-form/add-info`
//! - `POST /api/form-submission/add-info`
//! - `POST /api/security-form/add-info`
//!
//! All three share one pipeline (`pipeline::submit`). Which handler is mounted
//! depends on the deployment's protocol mode:
//!
//! - `plain`: multipart form bodies, handled by `plain::process`.
//! - `encrypted`: sealed JSON envelopes in both directions, handled by
//!   `encrypted::process`.

mod encrypted;
mod pipeline;
mod plain;

use crate::config::Mode;
use crate::forms::variant::Variant;
use actix_web::web::{post, scope, Data, PayloadConfig};
use actix_web::Scope;

/// Configures and returns the Actix `Scope` for one form.
pub fn configure_routes(variant: &'static Variant, mode: Mode, max_envelope_bytes: usize) -> Scope {
    let routes = scope(variant.scope).app_data(Data::new(variant));
    match mode {
        Mode::Plain => routes.route("/add-info", post().to(plain::process)),
        Mode::Encrypted => routes
            .app_data(PayloadConfig::new(max_envelope_bytes))
            .route("/add-info", post().to(encrypted::process)),
    }
}
