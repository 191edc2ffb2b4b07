use std::env;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Settings read from the Lambda environment at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    /// Public base URL objects are served from, without a trailing '/'.
    pub asset_base_url: String,
    /// Unset means user creation answers 500.
    pub user_pool_id: Option<String>,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bucket_name = get("S3_BUCKET_NAME").unwrap_or_else(|| "docdir-uploads".to_string());
        let asset_base_url = get("ASSET_BASE_URL")
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", bucket_name))
            .trim_end_matches('/')
            .to_string();
        let max_upload_bytes = match get("MAX_UPLOAD_BYTES").map(|v| v.parse::<usize>()) {
            Some(Ok(n)) if n > 0 => n,
            Some(_) => {
                tracing::warn!("MAX_UPLOAD_BYTES is not a positive integer, using the default");
                DEFAULT_MAX_UPLOAD_BYTES
            }
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Self {
            table_name: get("TABLE_NAME").unwrap_or_else(|| "docdir".to_string()),
            bucket_name,
            asset_base_url,
            user_pool_id: get("COGNITO_USER_POOL_ID"),
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
            max_upload_bytes,
        }
    }
}
