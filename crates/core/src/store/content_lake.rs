//! HTTP client for a Sanity-compatible content lake.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DocumentStore, StoreError, StoreResult};
use crate::document::model::Document;
use crate::mutation::types::{Mutation, MutationRequest, MutationResponse, PatchMutation};

pub const DEFAULT_API_VERSION: &str = "2023-05-03";

#[derive(Debug, Clone)]
pub struct ContentLakeClient {
    http: reqwest::Client,
    base_url: String,
    dataset: String,
    api_version: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ContentLakeClient {
    pub fn new(base_url: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dataset: dataset.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/v{}/data/{endpoint}/{}",
            self.base_url, self.api_version, self.dataset
        )
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let request = self.http.post(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn mutate(&self, mutation: Mutation) -> StoreResult<MutationResponse> {
        let body = MutationRequest {
            mutations: vec![mutation],
        };
        let response = self
            .post(self.url("mutate"))
            .query(&[("returnDocuments", "true"), ("visibility", "sync")])
            .json(&body)
            .send()
            .await?;
        let bytes = check(response).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a non-success response into a [`StoreError`], returning the body otherwise.
async fn check(response: reqwest::Response) -> StoreResult<Vec<u8>> {
    let status = response.status();
    let bytes = response.bytes().await?.to_vec();
    if status.is_success() {
        return Ok(bytes);
    }

    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.error.description.or(body.error.message))
        .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());

    if status == StatusCode::CONFLICT {
        return Err(StoreError::Conflict(message));
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(message));
    }
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for ContentLakeClient {
    async fn fetch(&self, query: &str, params: Value) -> StoreResult<Value> {
        tracing::debug!(query, dataset = %self.dataset, "content lake query");
        let response = self
            .post(self.url("query"))
            .json(&QueryRequest { query, params })
            .send()
            .await?;
        let bytes = check(response).await?;
        let body: QueryResponse = serde_json::from_slice(&bytes)?;
        Ok(body.result)
    }

    async fn create(&self, document: Document) -> StoreResult<Document> {
        let id = document.id().unwrap_or_default().to_string();
        let response = self.mutate(Mutation::Create(document)).await?;
        response
            .results
            .into_iter()
            .find_map(|result| result.document)
            .ok_or_else(|| StoreError::Status {
                status: 200,
                message: format!("create of `{id}` returned no document"),
            })
    }

    async fn patch(&self, patch: PatchMutation) -> StoreResult<()> {
        self.mutate(Mutation::Patch(patch)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ContentLakeClient {
        ContentLakeClient::new(server.uri(), "production").with_token("secret")
    }

    #[tokio::test]
    async fn fetch_posts_query_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2023-05-03/data/query/production"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({
                "query": "count(*[translationId == $translationId])",
                "params": {"translationId": "t1"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ms": 2, "result": 3})))
            .mount(&server)
            .await;

        let result = client(&server)
            .fetch(
                "count(*[translationId == $translationId])",
                json!({"translationId": "t1"}),
            )
            .await
            .unwrap();
        assert_eq!(result, json!(3));
    }

    #[tokio::test]
    async fn create_returns_stored_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2023-05-03/data/mutate/production"))
            .and(query_param("returnDocuments", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transactionId": "tx",
                "results": [{
                    "id": "drafts.x",
                    "operation": "create",
                    "document": {"_id": "drafts.x", "_type": "page", "_rev": "r1"},
                }],
            })))
            .mount(&server)
            .await;

        let doc = Document::from_value(json!({"_id": "drafts.x", "_type": "page"})).unwrap();
        let created = client(&server).create(doc).await.unwrap();
        assert_eq!(created.get("_rev"), Some(&json!("r1")));
    }

    #[tokio::test]
    async fn conflict_status_maps_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2023-05-03/data/mutate/production"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"type": "mutationError", "description": "Document by ID \"drafts.x\" already exists"},
            })))
            .mount(&server)
            .await;

        let doc = Document::from_value(json!({"_id": "drafts.x", "_type": "page"})).unwrap();
        let err = client(&server).create(doc).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg.contains("already exists")));
    }

    #[tokio::test]
    async fn server_errors_keep_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client(&server).fetch("*", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Status { status: 503, ref message } if message == "upstream down"
        ));
    }
}
