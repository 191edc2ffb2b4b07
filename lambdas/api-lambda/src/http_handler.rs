use std::sync::Arc;

use docdir_atoms::{doctors, hospitals, respond, users};
use docdir_shared::AppState;
use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use onboarding_block::{create_doctor_handler, stats_handler, update_doctor_handler};

fn with_cors_headers(mut resp: Response<Body>, cors_origin: &str) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(cors_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    if cors_origin != "*" {
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    cors_origin: &str,
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, cors_origin))
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    respond::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Main Lambda handler: routes each request to its collection.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let cors_origin = state.config.cors_origin.as_str();
    tracing::info!("🚀 API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, cors_origin));
    }

    let objects = state.objects.as_ref();
    let documents = state.documents.as_ref();
    let identity = state.identity.as_ref();
    let max_upload_bytes = state.config.max_upload_bytes;
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        (&Method::GET, ["stats"]) => stats_handler(documents).await,
        (_, ["stats"]) => method_not_allowed(),

        (&Method::GET, ["doctors"]) => {
            let params = event.query_string_parameters_ref();
            let search = params.and_then(|q| q.first("search"));
            doctors::list_doctors_handler(documents, search).await
        }
        (&Method::POST, ["doctors"]) => {
            create_doctor_handler(objects, documents, max_upload_bytes, body).await
        }
        (_, ["doctors"]) => method_not_allowed(),
        (&Method::GET, ["doctors", id]) => doctors::get_doctor_handler(documents, id).await,
        (&Method::PATCH, ["doctors", id]) => {
            update_doctor_handler(objects, documents, max_upload_bytes, id, body).await
        }
        (&Method::DELETE, ["doctors", id]) => {
            doctors::delete_doctor_handler(documents, objects, id).await
        }
        (_, ["doctors", _]) => method_not_allowed(),

        (&Method::GET, ["hospitals"]) => hospitals::list_hospitals_handler(documents).await,
        (&Method::POST, ["hospitals"]) => hospitals::create_hospital_handler(documents, body).await,
        (_, ["hospitals"]) => method_not_allowed(),
        (&Method::GET, ["hospitals", id]) => hospitals::get_hospital_handler(documents, id).await,
        (&Method::PATCH, ["hospitals", id]) => {
            hospitals::update_hospital_handler(documents, id, body).await
        }
        (&Method::DELETE, ["hospitals", id]) => {
            hospitals::delete_hospital_handler(documents, id).await
        }
        (_, ["hospitals", _]) => method_not_allowed(),

        (&Method::GET, ["users"]) => users::list_users_handler(documents).await,
        (&Method::POST, ["users"]) => users::create_user_handler(identity, documents, body).await,
        (_, ["users"]) => method_not_allowed(),
        (&Method::GET, ["users", id]) => users::get_user_handler(documents, id).await,
        (&Method::PATCH, ["users", id]) => users::update_user_handler(documents, id, body).await,
        (&Method::DELETE, ["users", id]) => {
            users::delete_user_handler(identity, documents, id).await
        }
        (_, ["users", _]) => method_not_allowed(),

        _ => respond::not_found(),
    };

    finalize_response(resp, cors_origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdir_atoms::store::{MemoryDocumentStore, MemoryIdentityProvider, MemoryObjectStore};
    use docdir_shared::Config;
    use std::collections::HashMap;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::with_stores(
            Config::default(),
            Arc::new(MemoryObjectStore::new()),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryIdentityProvider::new()),
        ))
    }

    fn request(method: &str, uri: &str, body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    fn body_json(resp: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(resp.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn preflight_carries_cors_headers() {
        let resp = function_handler(request("OPTIONS", "/doctors", ""), state()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn doctor_lifecycle_through_the_router() {
        let state = state();
        let create = serde_json::json!({
            "name": "Dr. Rao",
            "registrationNumber": "REG123",
            "email": "rao@example.com"
        });
        let resp = function_handler(request("POST", "/doctors", &create.to_string()), state.clone())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        let id = body_json(&resp)["id"].as_str().unwrap().to_string();

        let search: HashMap<String, Vec<String>> =
            [("search".to_string(), vec!["rao".to_string()])].into();
        let list = request("GET", "/doctors", "").with_query_string_parameters(search);
        let resp = function_handler(list, state.clone()).await.unwrap();
        assert_eq!(body_json(&resp)["items"][0]["id"], id.as_str());

        let delete = request("DELETE", &format!("/doctors/{}", id), "");
        let resp = function_handler(delete, state.clone()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = function_handler(request("GET", &format!("/doctors/{}", id), ""), state)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_and_unknown_routes() {
        let resp = function_handler(request("GET", "/stats", ""), state()).await.unwrap();
        assert_eq!(body_json(&resp)["doctors"], 0);

        let resp = function_handler(request("GET", "/nowhere", ""), state()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = function_handler(request("PUT", "/hospitals", ""), state()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
