pub mod submissions;

use crate::config::Settings;
use crate::db::Database;
use crate::forms::variant;
use actix_web::web;
use common::envelope::EnvelopeKey;

/// Registers shared state and every form scope on `cfg`.
///
/// `key` is only consulted in encrypted mode.
pub fn configure(
    cfg: &mut web::ServiceConfig,
    settings: &Settings,
    db: &Database,
    key: Option<&EnvelopeKey>,
) {
    cfg.app_data(web::Data::new(settings.clone()))
        .app_data(web::Data::new(db.clone()));
    if let Some(key) = key {
        cfg.app_data(web::Data::new(key.clone()));
    }
    for form in variant::ALL.iter().copied() {
        cfg.service(submissions::configure_routes(
            form,
            settings.mode,
            settings.max_envelope_bytes,
        ));
    }
}
