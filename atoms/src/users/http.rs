use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateUserPayload, UpdateUserPayload, User};
use super::service::{create_user, delete_user, get_user, load_users, update_user};
use crate::error::StoreError;
use crate::respond::{self, ListResponse};
use crate::store::{DocumentStore, IdentityProvider};

/// HTTP Handler: GET /users
pub async fn list_users_handler(documents: &dyn DocumentStore) -> Result<Response<Body>, Error> {
    match load_users(documents).await {
        Ok(users) => respond::json(StatusCode::OK, &ListResponse::ok(users)),
        Err(e) => {
            tracing::error!("❌ list_users_handler failed: {}", e);
            respond::json(StatusCode::OK, &ListResponse::<User>::degraded("Failed to fetch users"))
        }
    }
}

/// HTTP Handler: POST /users
pub async fn create_user_handler(
    identity: &dyn IdentityProvider,
    documents: &dyn DocumentStore,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            let msg = format!("Invalid request body: {}", e);
            return respond::error(StatusCode::BAD_REQUEST, msg);
        }
    };
    if let Err(message) = payload.validate() {
        return respond::error(StatusCode::BAD_REQUEST, message);
    }

    match create_user(identity, documents, payload).await {
        Ok(user) => respond::json(StatusCode::CREATED, &user),
        Err(StoreError::Conflict(_)) => {
            respond::error(StatusCode::CONFLICT, "Email already in use")
        }
        Err(e) => {
            tracing::error!("❌ create_user_handler failed: {}", e);
            respond::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add user")
        }
    }
}

/// HTTP Handler: GET /users/{id}
pub async fn get_user_handler(
    documents: &dyn DocumentStore,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    match get_user(documents, user_id).await {
        Ok(user) => respond::json(StatusCode::OK, &user),
        Err(e) => respond::store_error(&e),
    }
}

/// HTTP Handler: PATCH /users/{id}
pub async fn update_user_handler(
    documents: &dyn DocumentStore,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            let msg = format!("Invalid request body: {}", e);
            return respond::error(StatusCode::BAD_REQUEST, msg);
        }
    };

    match update_user(documents, user_id, payload).await {
        Ok(user) => respond::json(StatusCode::OK, &user),
        Err(e) => respond::store_error(&e),
    }
}

/// HTTP Handler: DELETE /users/{id}
pub async fn delete_user_handler(
    identity: &dyn IdentityProvider,
    documents: &dyn DocumentStore,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    match delete_user(identity, documents, user_id).await {
        Ok(()) => respond::no_content(),
        Err(e) => respond::store_error(&e),
    }
}
