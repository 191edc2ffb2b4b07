use serde_json::Value;

use super::model::{CreateUserPayload, UpdateUserPayload, User};
use crate::error::StoreError;
use crate::store::{from_record, to_document, Document, DocumentStore, IdentityProvider};

pub const USERS: &str = "users";

/// Create the login identity first, then the user document.
///
/// If the document write fails the fresh identity is removed again so the
/// email can be reused on retry.
pub async fn create_user(
    identity: &dyn IdentityProvider,
    documents: &dyn DocumentStore,
    payload: CreateUserPayload,
) -> Result<User, StoreError> {
    let email = payload.email.trim().to_lowercase();
    let uid = identity.create_identity(&email, &payload.password).await?;

    let mut user = User {
        id: String::new(),
        uid,
        name: payload.name.trim().to_string(),
        email,
        role: payload.role,
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: None,
    };

    let mut document = to_document(&user)?;
    document.remove("id");

    match documents.write(USERS, None, document).await {
        Ok(id) => {
            tracing::info!(user_id = %id, uid = %user.uid, "user created");
            user.id = id;
            Ok(user)
        }
        Err(e) => {
            if let Err(cleanup) = identity.delete_identity(&user.uid).await {
                tracing::error!(
                    uid = %user.uid,
                    error = %cleanup,
                    "failed to remove identity after user write failed"
                );
            }
            Err(e)
        }
    }
}

pub async fn get_user(documents: &dyn DocumentStore, user_id: &str) -> Result<User, StoreError> {
    let document = documents
        .get(USERS, user_id)
        .await?
        .ok_or_else(|| StoreError::not_found(USERS, user_id))?;
    from_record(user_id, document)
}

pub async fn load_users(documents: &dyn DocumentStore) -> Result<Vec<User>, StoreError> {
    let mut users = Vec::new();
    for record in documents.query_all(USERS).await? {
        match from_record::<User>(&record.id, record.document) {
            Ok(u) => users.push(u),
            Err(e) => {
                tracing::warn!(user_id = %record.id, error = %e, "skipping unreadable user record")
            }
        }
    }
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(users)
}

pub async fn update_user(
    documents: &dyn DocumentStore,
    user_id: &str,
    payload: UpdateUserPayload,
) -> Result<User, StoreError> {
    let mut partial = Document::new();

    if let Some(name) = payload.name {
        partial.insert("name".into(), Value::String(name.trim().to_string()));
    }
    if let Some(role) = payload.role {
        partial.insert("role".into(), serde_json::to_value(role)?);
    }

    if !partial.is_empty() {
        partial.insert("updatedAt".into(), Value::String(chrono::Utc::now().to_rfc3339()));
        documents.update(USERS, user_id, partial).await?;
    }

    get_user(documents, user_id).await
}

/// Delete the user document and, best effort, its login identity.
pub async fn delete_user(
    identity: &dyn IdentityProvider,
    documents: &dyn DocumentStore,
    user_id: &str,
) -> Result<(), StoreError> {
    let user = get_user(documents, user_id).await?;
    documents.delete(USERS, user_id).await?;

    if !user.uid.is_empty() {
        if let Err(e) = identity.delete_identity(&user.uid).await {
            tracing::warn!(user_id, uid = %user.uid, error = %e, "failed to delete identity");
        }
    }
    Ok(())
}
