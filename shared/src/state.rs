use std::sync::Arc;

use docdir_atoms::store::{DocumentStore, IdentityProvider, ObjectStore};

use crate::cognito::CognitoIdentityProvider;
use crate::config::Config;
use crate::dynamo::DynamoDocumentStore;
use crate::s3::S3ObjectStore;

/// Everything a request handler needs, built once per cold start.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub objects: Arc<dyn ObjectStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// AWS-backed state from the Lambda environment.
    pub async fn from_env() -> Self {
        let config = Config::from_env();
        let aws = aws_config::load_from_env().await;

        let objects = S3ObjectStore::new(
            aws_sdk_s3::Client::new(&aws),
            config.bucket_name.clone(),
            config.asset_base_url.clone(),
        );
        let documents = DynamoDocumentStore::new(
            aws_sdk_dynamodb::Client::new(&aws),
            config.table_name.clone(),
        );
        let identity = CognitoIdentityProvider::new(
            aws_sdk_cognitoidentityprovider::Client::new(&aws),
            config.user_pool_id.clone(),
        );

        tracing::info!(
            table = %config.table_name,
            bucket = %config.bucket_name,
            "app state initialised"
        );

        Self {
            config,
            objects: Arc::new(objects),
            documents: Arc::new(documents),
            identity: Arc::new(identity),
        }
    }

    /// State over caller-supplied stores.
    pub fn with_stores(
        config: Config,
        objects: Arc<dyn ObjectStore>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config,
            objects,
            documents,
            identity,
        }
    }
}
