use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateHospitalPayload, Hospital, UpdateHospitalPayload};
use super::service::{
    create_hospital, delete_hospital, get_hospital, load_hospitals, update_hospital,
};
use crate::respond::{self, ListResponse};
use crate::store::DocumentStore;

/// HTTP Handler: GET /hospitals
pub async fn list_hospitals_handler(
    documents: &dyn DocumentStore,
) -> Result<Response<Body>, Error> {
    match load_hospitals(documents).await {
        Ok(hospitals) => respond::json(StatusCode::OK, &ListResponse::ok(hospitals)),
        Err(e) => {
            tracing::error!("❌ list_hospitals_handler failed: {}", e);
            respond::json(
                StatusCode::OK,
                &ListResponse::<Hospital>::degraded("Failed to fetch hospitals"),
            )
        }
    }
}

/// HTTP Handler: POST /hospitals
pub async fn create_hospital_handler(
    documents: &dyn DocumentStore,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateHospitalPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            let msg = format!("Invalid request body: {}", e);
            return respond::error(StatusCode::BAD_REQUEST, msg);
        }
    };
    if let Err(message) = payload.validate() {
        return respond::error(StatusCode::BAD_REQUEST, message);
    }

    match create_hospital(documents, payload).await {
        Ok(hospital) => respond::json(StatusCode::CREATED, &hospital),
        Err(e) => {
            tracing::error!("❌ create_hospital_handler failed: {}", e);
            respond::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add hospital")
        }
    }
}

/// HTTP Handler: GET /hospitals/{id}
pub async fn get_hospital_handler(
    documents: &dyn DocumentStore,
    hospital_id: &str,
) -> Result<Response<Body>, Error> {
    match get_hospital(documents, hospital_id).await {
        Ok(hospital) => respond::json(StatusCode::OK, &hospital),
        Err(e) => respond::store_error(&e),
    }
}

/// HTTP Handler: PATCH /hospitals/{id}
pub async fn update_hospital_handler(
    documents: &dyn DocumentStore,
    hospital_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateHospitalPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            let msg = format!("Invalid request body: {}", e);
            return respond::error(StatusCode::BAD_REQUEST, msg);
        }
    };

    match update_hospital(documents, hospital_id, payload).await {
        Ok(hospital) => respond::json(StatusCode::OK, &hospital),
        Err(e) => {
            tracing::error!(
                "❌ update_hospital_handler failed: hospital_id={}, error={}",
                hospital_id,
                e
            );
            respond::store_error(&e)
        }
    }
}

/// HTTP Handler: DELETE /hospitals/{id}
pub async fn delete_hospital_handler(
    documents: &dyn DocumentStore,
    hospital_id: &str,
) -> Result<Response<Body>, Error> {
    match delete_hospital(documents, hospital_id).await {
        Ok(()) => respond::no_content(),
        Err(e) => respond::store_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[tokio::test]
    async fn create_requires_cmo_number() {
        let store = MemoryDocumentStore::new();
        let body = br#"{"name": "City Care", "cmoNumber": " ", "ownershipType": "Society"}"#;
        let resp = create_hospital_handler(&store, body).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.len(super::super::HOSPITALS), 0);
    }

    #[tokio::test]
    async fn create_rejects_unknown_ownership() {
        let store = MemoryDocumentStore::new();
        let body = br#"{"name": "City Care", "cmoNumber": "C1", "ownershipType": "Government"}"#;
        let resp = create_hospital_handler(&store, body).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_then_delete() {
        let store = MemoryDocumentStore::new();
        let body = br#"{
            "name": "City Care",
            "cmoNumber": "C1",
            "ownershipType": "Individual",
            "cghs": true
        }"#;
        let resp = create_hospital_handler(&store, body).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: serde_json::Value = serde_json::from_slice(resp.body().as_ref()).unwrap();
        let id = created["id"].as_str().unwrap();

        let resp = delete_hospital_handler(&store, id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = get_hospital_handler(&store, id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
