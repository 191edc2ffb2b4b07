//! AWS plumbing: configuration, the S3/DynamoDB/Cognito store
//! implementations and the per-process [`AppState`].

pub mod cognito;
pub mod config;
pub mod dynamo;
pub mod s3;
pub mod state;

pub use config::Config;
pub use state::AppState;
