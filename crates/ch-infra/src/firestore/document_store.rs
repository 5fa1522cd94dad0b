use std::time::Duration;

use async_trait::async_trait;
use ch_core::ports::{DocumentStoreError, DocumentStorePort, Record};
use ch_core::SecretString;
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

use super::value::encode_fields;

pub struct FirestoreDocumentStore {
    client: reqwest::Client,
    documents_url: String,
    api_key: SecretString,
}

impl FirestoreDocumentStore {
    pub fn new(
        base_url: &str,
        project_id: &str,
        api_key: impl Into<String>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!project_id.trim().is_empty(), "firestore project id is empty");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self::with_client(client, base_url, project_id, api_key))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        project_id: &str,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                project_id
            ),
            api_key: SecretString::new(api_key),
        }
    }

    fn document_url(&self, collection: &str, key: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, key)
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            return request;
        }
        request.query(&[("key", self.api_key.expose())])
    }
}

fn transport_error(err: reqwest::Error) -> DocumentStoreError {
    DocumentStoreError::Unavailable(err.to_string())
}

fn status_error(status: StatusCode) -> DocumentStoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DocumentStoreError::PermissionDenied(status.to_string())
        }
        StatusCode::BAD_REQUEST => DocumentStoreError::InvalidRecord(status.to_string()),
        _ => DocumentStoreError::Unavailable(status.to_string()),
    }
}

#[async_trait]
impl DocumentStorePort for FirestoreDocumentStore {
    async fn write(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<(), DocumentStoreError> {
        let url = self.document_url(collection, key);
        let body = json!({ "fields": encode_fields(record) });
        let response = self
            .with_key(self.client.patch(&url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, collection, "firestore write rejected");
            return Err(status_error(status));
        }
        Ok(())
    }

    async fn exists(&self, collection: &str, key: &str) -> Result<bool, DocumentStoreError> {
        let url = self.document_url(collection, key);
        let response = self
            .with_key(self.client.get(&url))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const DOC_PATH: &str = "/projects/clubhouse/databases/(default)/documents/users/U1";

    fn store(server: &Server) -> FirestoreDocumentStore {
        FirestoreDocumentStore::new(&server.url(), "clubhouse", "test-key").unwrap()
    }

    #[tokio::test]
    async fn write_patches_typed_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", DOC_PATH)
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::Json(json!({
                "fields": {
                    "name": { "stringValue": "Asha" },
                    "verified": { "booleanValue": true }
                }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut record = Record::new();
        record.insert("name".into(), json!("Asha"));
        record.insert("verified".into(), json!(true));
        store(&server).write("users", "U1", &record).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn write_maps_forbidden_to_permission_denied() {
        let mut server = Server::new_async().await;
        server
            .mock("PATCH", DOC_PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let err = store(&server)
            .write("users", "U1", &Record::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn exists_distinguishes_found_and_missing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", DOC_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"name":"doc","fields":{}}"#)
            .create_async()
            .await;
        server
            .mock(
                "GET",
                "/projects/clubhouse/databases/(default)/documents/users/U2",
            )
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let store = store(&server);
        assert!(store.exists("users", "U1").await.unwrap());
        assert!(!store.exists("users", "U2").await.unwrap());
    }

    #[test]
    fn blank_project_is_rejected() {
        assert!(FirestoreDocumentStore::new("http://localhost", " ", "").is_err());
    }
}
