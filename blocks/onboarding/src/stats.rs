use docdir_atoms::doctors::DOCTORS;
use docdir_atoms::hospitals::HOSPITALS;
use docdir_atoms::respond;
use docdir_atoms::store::DocumentStore;
use docdir_atoms::users::USERS;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

/// Dashboard counters. A collection that could not be read counts as 0 and
/// leaves a notice.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: usize,
    pub doctors: usize,
    pub hospitals: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

pub async fn load_stats(documents: &dyn DocumentStore) -> DashboardStats {
    let (users, doctors, hospitals) = tokio::join!(
        documents.query_all(USERS),
        documents.query_all(DOCTORS),
        documents.query_all(HOSPITALS),
    );

    let mut stats = DashboardStats::default();
    for (collection, result, count) in [
        (USERS, users, &mut stats.users),
        (DOCTORS, doctors, &mut stats.doctors),
        (HOSPITALS, hospitals, &mut stats.hospitals),
    ] {
        match result {
            Ok(records) => *count = records.len(),
            Err(e) => {
                tracing::warn!(collection, error = %e, "stats count degraded");
                stats.notices.push(format!("Failed to count {}", collection));
            }
        }
    }
    stats
}

/// HTTP Handler: GET /stats
pub async fn stats_handler(documents: &dyn DocumentStore) -> Result<Response<Body>, Error> {
    let stats = load_stats(documents).await;
    respond::json(StatusCode::OK, &stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdir_atoms::store::{Document, MemoryDocumentStore};

    #[tokio::test]
    async fn counts_each_collection() {
        let documents = MemoryDocumentStore::new();
        documents.write(DOCTORS, None, Document::new()).await.unwrap();
        documents.write(DOCTORS, None, Document::new()).await.unwrap();
        documents.write(HOSPITALS, None, Document::new()).await.unwrap();

        let stats = load_stats(&documents).await;
        assert_eq!(
            stats,
            DashboardStats {
                users: 0,
                doctors: 2,
                hospitals: 1,
                notices: vec![],
            }
        );
    }

    #[tokio::test]
    async fn failing_collection_degrades_to_zero() {
        let documents = MemoryDocumentStore::new();
        documents.write(USERS, None, Document::new()).await.unwrap();
        documents.write(HOSPITALS, None, Document::new()).await.unwrap();
        documents.fail_collection(HOSPITALS);

        let resp = stats_handler(&documents).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body().as_ref()).unwrap();
        assert_eq!(body["users"], 1);
        assert_eq!(body["hospitals"], 0);
        assert_eq!(body["notices"], serde_json::json!(["Failed to count hospitals"]));
    }
}
