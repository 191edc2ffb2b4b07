use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::DisplayErrorContext;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, MessageActionType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use docdir_atoms::store::IdentityProvider;
use docdir_atoms::StoreError;

/// Dashboard logins in a Cognito user pool, keyed by email.
#[derive(Debug, Clone)]
pub struct CognitoIdentityProvider {
    client: CognitoClient,
    user_pool_id: Option<String>,
}

impl CognitoIdentityProvider {
    pub fn new(client: CognitoClient, user_pool_id: Option<String>) -> Self {
        Self { client, user_pool_id }
    }

    fn pool(&self) -> Result<&str, StoreError> {
        self.user_pool_id
            .as_deref()
            .ok_or_else(|| StoreError::backend("Cognito", "COGNITO_USER_POOL_ID is not set"))
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> Result<String, StoreError> {
        let pool = self.pool()?;

        let email_attr = AttributeType::builder()
            .name("email")
            .value(email)
            .build()
            .map_err(|e| StoreError::backend("Cognito attribute", e))?;
        let verified_attr = AttributeType::builder()
            .name("email_verified")
            .value("true")
            .build()
            .map_err(|e| StoreError::backend("Cognito attribute", e))?;

        let created = self
            .client
            .admin_create_user()
            .user_pool_id(pool)
            .username(email)
            .user_attributes(email_attr)
            .user_attributes(verified_attr)
            .message_action(MessageActionType::Suppress)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_username_exists_exception()) == Some(true) {
                    StoreError::Conflict(email.to_string())
                } else {
                    let ctx = DisplayErrorContext(&e);
                    tracing::error!("Cognito admin_create_user failed: {}", ctx);
                    StoreError::backend("Cognito admin_create_user", ctx)
                }
            })?;

        let set_password = self
            .client
            .admin_set_user_password()
            .user_pool_id(pool)
            .username(email)
            .password(password)
            .permanent(true)
            .send()
            .await;

        if let Err(e) = set_password {
            let err =
                StoreError::backend("Cognito admin_set_user_password", DisplayErrorContext(&e));
            tracing::error!("Cognito admin_set_user_password failed, removing {}: {}", email, err);
            // no usable password: free the email again
            if let Err(cleanup) = self.delete_identity(email).await {
                tracing::error!("failed to remove half-created identity {}: {}", email, cleanup);
            }
            return Err(err);
        }

        // the `sub` attribute is the stable id; fall back to the username
        let uid = created
            .user()
            .and_then(|u| {
                u.attributes()
                    .iter()
                    .find(|a| a.name() == "sub")
                    .and_then(|a| a.value())
                    .map(|s| s.to_string())
                    .or_else(|| u.username().map(|s| s.to_string()))
            })
            .unwrap_or_else(|| email.to_string());

        tracing::info!(uid = %uid, "identity created");
        Ok(uid)
    }

    async fn delete_identity(&self, uid: &str) -> Result<(), StoreError> {
        let pool = self.pool()?;
        self.client
            .admin_delete_user()
            .user_pool_id(pool)
            .username(uid)
            .send()
            .await
            .map_err(|e| {
                StoreError::backend("Cognito admin_delete_user", DisplayErrorContext(&e))
            })?;
        Ok(())
    }
}
