use lambda_http::{http::StatusCode, Body, Error, Response};

use super::service::{delete_doctor, get_doctor, load_doctors, search_doctors};
use crate::respond::{self, ListResponse};
use crate::store::{DocumentStore, ObjectStore};

/// HTTP Handler: GET /doctors?search=
///
/// A failed listing still answers 200 with an empty list and a notice.
pub async fn list_doctors_handler(
    documents: &dyn DocumentStore,
    search: Option<&str>,
) -> Result<Response<Body>, Error> {
    match load_doctors(documents).await {
        Ok(doctors) => {
            let doctors = match search {
                Some(term) => search_doctors(doctors, term),
                None => doctors,
            };
            respond::json(StatusCode::OK, &ListResponse::ok(doctors))
        }
        Err(e) => {
            tracing::error!("❌ list_doctors_handler failed: {}", e);
            respond::json(
                StatusCode::OK,
                &ListResponse::<super::Doctor>::degraded("Failed to fetch doctors"),
            )
        }
    }
}

/// HTTP Handler: GET /doctors/{id}
pub async fn get_doctor_handler(
    documents: &dyn DocumentStore,
    doctor_id: &str,
) -> Result<Response<Body>, Error> {
    match get_doctor(documents, doctor_id).await {
        Ok(doctor) => respond::json(StatusCode::OK, &doctor),
        Err(e) => respond::store_error(&e),
    }
}

/// HTTP Handler: DELETE /doctors/{id}
pub async fn delete_doctor_handler(
    documents: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    doctor_id: &str,
) -> Result<Response<Body>, Error> {
    match delete_doctor(documents, objects, doctor_id).await {
        Ok(()) => respond::no_content(),
        Err(e) => {
            tracing::error!(
                "❌ delete_doctor_handler failed: doctor_id={}, error={}",
                doctor_id,
                e
            );
            respond::store_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctors::{insert_doctor, Doctor, DOCTORS};
    use crate::store::MemoryDocumentStore;

    fn body_json(resp: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(resp.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn list_filters_by_search_term() {
        let store = MemoryDocumentStore::new();
        for (name, reg) in [("Anita", "R1"), ("Vikram", "R2")] {
            let doctor = Doctor {
                name: name.into(),
                registration_number: reg.into(),
                ..Default::default()
            };
            insert_doctor(&store, doctor).await.unwrap();
        }

        let resp = list_doctors_handler(&store, Some("vik")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(&resp);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["name"], "Vikram");
        assert!(body.get("notice").is_none());
    }

    #[tokio::test]
    async fn list_degrades_to_empty_with_notice() {
        let store = MemoryDocumentStore::new();
        store.fail_collection(DOCTORS);
        let resp = list_doctors_handler(&store, None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(&resp);
        assert_eq!(body["items"], serde_json::json!([]));
        assert_eq!(body["notice"], "Failed to fetch doctors");
    }

    #[tokio::test]
    async fn get_missing_doctor_is_404() {
        let store = MemoryDocumentStore::new();
        let resp = get_doctor_handler(&store, "missing").await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
