use crate::db::Database;
use crate::error::SubmissionError;
use crate::forms::submission::RawSubmission;
use crate::forms::variant::Variant;
use crate::services::submissions::pipeline;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use common::envelope::EnvelopeKey;
use common::model::receipt::SubmissionReceipt;
use common::requests::EnvelopeBody;
use log::error;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Handler for `POST <scope>/add-info` in encrypted mode.
///
/// The body is `{ "envelope": "v:1,..." }` whose plaintext is a JSON object with the
/// same fields as the multipart form, media as base64 strings. Every answer, error
/// or not, is sealed the same way, so clients open the body regardless of status.
pub async fn process(
    variant: web::Data<&'static Variant>,
    body: web::Bytes,
    db: web::Data<Database>,
    key: web::Data<EnvelopeKey>,
) -> HttpResponse {
    let variant: &'static Variant = *variant.get_ref();
    match handle(variant, &body, &db, &key).await {
        Ok(receipt) => sealed(&key, StatusCode::CREATED, &receipt),
        Err(e) => {
            if let SubmissionError::Envelope(cause) = &e {
                error!("Decryption error on {}: {}", variant.scope, cause);
            }
            sealed(&key, e.status(), &e.body())
        }
    }
}

async fn handle(
    variant: &'static Variant,
    body: &[u8],
    db: &Database,
    key: &EnvelopeKey,
) -> Result<SubmissionReceipt, SubmissionError> {
    let request: EnvelopeBody = if body.trim_ascii().is_empty() {
        EnvelopeBody::default()
    } else {
        serde_json::from_slice(body).map_err(|e| SubmissionError::InvalidBody(e.to_string()))?
    };
    let envelope = request
        .envelope
        .filter(|e| !e.is_empty())
        .ok_or(SubmissionError::MissingEnvelope)?;

    let payload: Map<String, Value> = key.open_json(&envelope)?;
    let raw = RawSubmission::from_json(variant, payload)?;
    pipeline::submit(variant, raw, db).await
}

/// Seals `body` into an envelope response. If sealing itself fails the client gets
/// a plaintext 500, since there is no sealed way left to report it.
fn sealed<T: Serialize>(key: &EnvelopeKey, status: StatusCode, body: &T) -> HttpResponse {
    match key.seal_json(body) {
        Ok(envelope) => HttpResponse::build(status).json(EnvelopeBody::new(envelope)),
        Err(e) => {
            error!("Failed to seal response: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "error": "Failed to encrypt response" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mode, Settings};
    use crate::db::tests::count;
    use crate::services;
    use actix_web::{test, App};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use chrono::{Days, Local};
    use common::model::failure::ErrorBody;
    use rusqlite::params;
    use serde::de::DeserializeOwned;

    fn key() -> EnvelopeKey {
        EnvelopeKey::from_secrets("aBfGhIjKlMnOpQrStUvWxYz012345678", "1234567890123456").unwrap()
    }

    fn settings() -> Settings {
        Settings {
            mode: Mode::Encrypted,
            ..Settings::default()
        }
    }

    fn days_ago(days: u64) -> String {
        (Local::now().date_naive() - Days::new(days))
            .format("%d/%m/%Y")
            .to_string()
    }

    fn data_uri(bytes: &[u8]) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
    }

    fn incident(images: Vec<String>) -> Value {
        json!({
            "firstName": "Rosa",
            "contact": "0917 555 0199",
            "selectionType": "campus",
            "eventName": "Night patrol",
            "eventDate": days_ago(2),
            "name": "Rosa Diaz",
            "mobileNumber": "0917 555 0199",
            "staffId": "S-001",
            "verification": "verified",
            "incidentReport": "Broken lock at gate 3",
            "images": images
        })
    }

    macro_rules! app {
        ($db:expr) => {
            test::init_service(App::new().configure(|cfg| {
                services::configure(cfg, &settings(), &$db, Some(&key()))
            }))
            .await
        };
    }

    fn post(path: &str, body: Value) -> actix_web::test::TestRequest {
        test::TestRequest::post().uri(path).set_json(body)
    }

    async fn open<T: DeserializeOwned>(resp: actix_web::dev::ServiceResponse) -> T {
        let body: EnvelopeBody = test::read_body_json(resp).await;
        key().open_json(&body.envelope.unwrap()).unwrap()
    }

    #[actix_web::test]
    async fn stores_incident_with_ordered_images() {
        let db = Database::open_in_memory().unwrap();
        let app = app!(db);

        let images = vec![data_uri(b"A"), data_uri(b"B"), data_uri(b"C")];
        let envelope = key().seal_json(&incident(images)).unwrap();
        let resp = test::call_service(
            &app,
            post("/api/security-form/add-info", json!({ "envelope": envelope })).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let receipt: SubmissionReceipt = open(resp).await;
        assert_eq!(receipt.message, "Security incident report submitted successfully!");

        let stored: Vec<Vec<u8>> = db
            .with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT image FROM security_incident_images
                     WHERE incident_id = ?1 ORDER BY position",
                )?;
                let rows = stmt.query_map(params![receipt.id], |r| r.get(0))?;
                rows.collect()
            })
            .unwrap();
        assert_eq!(stored, vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()]);
    }

    #[actix_web::test]
    async fn missing_envelope_gets_sealed_400() {
        let db = Database::open_in_memory().unwrap();
        let app = app!(db);

        for request in [json!({}), json!({ "envelope": null }), json!({ "envelope": "" })] {
            let req = post("/api/security-form/add-info", request).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: ErrorBody = open(resp).await;
            assert_eq!(body.error, "Missing encrypted envelope");
            assert_eq!(body.required, Some(vec!["envelope".to_string()]));
        }
    }

    #[actix_web::test]
    async fn unreadable_body_gets_sealed_400() {
        let db = Database::open_in_memory().unwrap();
        let app = app!(db);

        let req = post("/api/security-form/add-info", json!({ "envelope": 123 })).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = open(resp).await;
        assert_eq!(body.error, "Invalid request body");
        assert!(body.required.is_none());

        let req = test::TestRequest::post()
            .uri("/api/security-form/add-info")
            .insert_header(("content-type", "application/json"))
            .set_payload("envelope=v:1,AAAA")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = open(resp).await;
        assert_eq!(body.error, "Invalid request body");
        assert!(body.message.is_some());
    }

    #[actix_web::test]
    async fn undecryptable_envelope_gets_sealed_400() {
        let db = Database::open_in_memory().unwrap();
        let app = app!(db);

        for envelope in ["no-header", "v:1,AAAA"] {
            let resp = test::call_service(
                &app,
                post("/api/campus-form/add-info", json!({ "envelope": envelope })).to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: ErrorBody = open(resp).await;
            assert_eq!(body.error, "Failed to decrypt request data");
            assert!(body.message.is_some());
        }
    }

    #[actix_web::test]
    async fn invalid_selection_echoes_allow_list() {
        let db = Database::open_in_memory().unwrap();
        let app = app!(db);

        let mut payload = incident(vec![data_uri(b"A")]);
        payload["selectionType"] = json!("parking");
        let envelope = key().seal_json(&payload).unwrap();
        let resp = test::call_service(
            &app,
            post("/api/security-form/add-info", json!({ "envelope": envelope })).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = open(resp).await;
        assert_eq!(body.error, "Invalid selection type");
        assert_eq!(
            body.valid_types.unwrap(),
            vec!["event", "students", "employees", "campus", "others-suggestions"]
        );
        assert_eq!(count(&db, "security_incidents"), 0);
    }

    #[actix_web::test]
    async fn out_of_range_date_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let app = app!(db);

        let mut payload = incident(vec![data_uri(b"A")]);
        payload["eventDate"] = json!("01/01/2030");
        let envelope = key().seal_json(&payload).unwrap();
        let resp = test::call_service(
            &app,
            post("/api/security-form/add-info", json!({ "envelope": envelope })).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = open(resp).await;
        assert_eq!(body.error, "eventDate must be within the past 7 days including today");
    }

    #[actix_web::test]
    async fn persistence_failure_is_sealed_500() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER refuse_incidents BEFORE INSERT ON security_incidents
                 BEGIN SELECT RAISE(ABORT, 'storage offline'); END;",
            )
        })
        .unwrap();
        let app = app!(db);

        let envelope = key().seal_json(&incident(vec![data_uri(b"A")])).unwrap();
        let resp = test::call_service(
            &app,
            post("/api/security-form/add-info", json!({ "envelope": envelope })).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = open(resp).await;
        assert_eq!(body.error, "Internal server error");
        assert!(body.message.unwrap().contains("storage offline"));
        assert_eq!(count(&db, "security_incidents"), 0);
    }

    #[actix_web::test]
    async fn campus_feedback_from_base64_media() {
        let db = Database::open_in_memory().unwrap();
        let app = app!(db);

        let payload = json!({
            "contact": "0917",
            "eventName": "Open Day",
            "name": "Ana Cruz",
            "mobileNumber": "0917",
            "userType": "Student",
            "staffId": "ignored",
            "feedback": "Loved the library",
            "visitDate": days_ago(0),
            "signature": data_uri(b"sig"),
            "selfieImage": data_uri(b"selfie")
        });
        let envelope = key().seal_json(&payload).unwrap();
        let resp = test::call_service(
            &app,
            post("/api/campus-form/add-info", json!({ "envelope": envelope })).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let receipt: SubmissionReceipt = open(resp).await;

        let (staff_id, selfie): (Option<String>, Vec<u8>) = db
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT staff_id, selfie_image FROM campus_feedback WHERE id = ?1",
                    params![receipt.id],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
            })
            .unwrap();
        assert_eq!(staff_id, None);
        assert_eq!(selfie, b"selfie");
    }
}
