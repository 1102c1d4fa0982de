use crate::db::row::InsertRow;
use crate::db::Database;
use crate::error::SubmissionError;
use crate::forms::submission::RawSubmission;
use crate::forms::variant::Variant;
use crate::forms::{media, validator};
use actix_web::web;
use chrono::Local;
use common::model::receipt::SubmissionReceipt;
use log::{error, info, warn};

/// Validates, decodes and stores one submission.
///
/// The date window is evaluated against the server's local calendar day at the
/// time the request is processed.
pub async fn submit(
    variant: &'static Variant,
    raw: RawSubmission,
    db: &Database,
) -> Result<SubmissionReceipt, SubmissionError> {
    let today = Local::now().date_naive();
    let submission = validator::validate(variant, raw, today).map_err(|rejection| {
        warn!("{:?} submission rejected: {}", variant.kind, rejection.reason);
        SubmissionError::from(rejection)
    })?;

    let decoded = media::decode_all(&submission)?;
    let row = InsertRow::from_submission(&submission, decoded);

    let db = db.clone();
    let receipt = web::block(move || db.persist(&row))
        .await
        .map_err(|e| SubmissionError::PersistenceFailure(e.to_string()))
        .and_then(|persisted| persisted)
        .map_err(|e| {
            error!("Error saving {} row: {}", variant.table, e);
            e
        })?;

    info!("{} row {} created", variant.table, receipt.id);
    Ok(SubmissionReceipt {
        message: variant.success_message.to_string(),
        id: receipt.id,
        timestamp: receipt.created_at,
    })
}
