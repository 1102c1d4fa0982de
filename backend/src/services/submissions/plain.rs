use crate::config::Settings;
use crate::db::Database;
use crate::error::SubmissionError;
use crate::forms::submission::{MediaSource, RawSubmission};
use crate::forms::variant::Variant;
use crate::services::submissions::pipeline;
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;

/// Handler for `POST <scope>/add-info` in plain mode.
///
/// - `201 Created` with `{message, id, timestamp}` once the row is committed.
/// - `400 Bad Request` for validation, upload and decode errors.
/// - `413 Payload Too Large` when a part exceeds `max_upload_bytes`.
/// - `500 Internal Server Error` when the insert fails.
pub async fn process(
    variant: web::Data<&'static Variant>,
    payload: Multipart,
    db: web::Data<Database>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, SubmissionError> {
    let variant: &'static Variant = *variant.get_ref();
    let raw = read_submission(variant, payload, &settings).await?;
    let receipt = pipeline::submit(variant, raw, &db).await?;
    Ok(HttpResponse::Created().json(receipt))
}

/// Reads every multipart field into a `RawSubmission`.
///
/// File parts must target one of the variant's media slots; single-blob slots take
/// at most one file. Text fields named after a media slot are treated as base64,
/// unless the slot is single-blob and also receives a file, in which case the file
/// wins whatever the part order. At most `max_files` file parts and `max_fields`
/// text parts are read, each capped at `max_upload_bytes`.
async fn read_submission(
    variant: &Variant,
    mut payload: Multipart,
    settings: &Settings,
) -> Result<RawSubmission, SubmissionError> {
    let mut raw = RawSubmission::default();
    let (mut files, mut fields) = (0usize, 0usize);

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()))
            .unwrap_or_default();
        let is_file = field
            .content_disposition()
            .is_some_and(|cd| cd.get_filename().is_some());

        if is_file {
            files += 1;
            if files > settings.max_files {
                return Err(SubmissionError::Upload("LIMIT_FILE_COUNT".to_string()));
            }
            let slot = variant
                .media_slot(&name)
                .ok_or_else(|| SubmissionError::Upload("LIMIT_UNEXPECTED_FILE".to_string()))?;
            if !slot.multiple {
                if raw.upload_count(&name) > 0 {
                    return Err(SubmissionError::Upload("LIMIT_UNEXPECTED_FILE".to_string()));
                }
                raw.retain_uploads(&name);
            }
            let content_type = field.content_type().map(|m| m.essence_str().to_string());
            let bytes = read_part(&mut field, settings.max_upload_bytes).await?;
            raw.push_media(name, MediaSource::Upload {
                content_type,
                bytes,
            });
        } else {
            fields += 1;
            if fields > settings.max_fields {
                return Err(SubmissionError::Upload("LIMIT_FIELD_COUNT".to_string()));
            }
            let bytes = read_part(&mut field, settings.max_upload_bytes).await?;
            let text = String::from_utf8(bytes).map_err(|_| {
                SubmissionError::Upload(format!("field `{}` is not valid UTF-8", name))
            })?;

            match variant.media_slot(&name) {
                Some(slot) if !slot.multiple && raw.upload_count(&name) > 0 => {}
                Some(_) => raw.push_media(name, MediaSource::Base64(text)),
                None => raw.insert_field(name, text),
            }
        }
    }

    Ok(raw)
}

/// Buffers one part, failing as soon as it grows past `max_bytes`.
async fn read_part(field: &mut Field, max_bytes: usize) -> Result<Vec<u8>, SubmissionError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > max_bytes {
            return Err(SubmissionError::PayloadTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
