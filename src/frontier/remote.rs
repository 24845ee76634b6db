//! Client for the remote key-value frontier service
//!
//! The service speaks JSON over HTTP. Every database lives under
//! `{endpoint}/v1/db/{database}`:
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | create partitions | `POST /buckets` with `["todo", ...]` | any 2xx |
//! | list keys | `GET /bucket/{p}/keys` | `["url", ...]` |
//! | list entries | `GET /bucket/{p}/all` | `{"url": "tries"}` |
//! | membership | `POST /haskeys` with `{"buckets": [...], "keys": [...]}` | `{"url": bool}` |
//! | upsert | `POST /bucket/{p}/update` with `{"url": "tries"}` | any 2xx |
//! | pop | `POST /bucket/{p}/pop?n={max}` | `{"url": "tries"}` |
//!
//! Values travel as decimal strings.

use crate::frontier::traits::{Entries, Frontier, FrontierError, FrontierResult};
use crate::frontier::Partition;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client bound to one database of the frontier service
pub struct RemoteFrontier {
    client: Client,
    db_url: String,
}

#[derive(Serialize)]
struct HasKeysRequest<'a> {
    buckets: Vec<&'static str>,
    keys: &'a [String],
}

impl RemoteFrontier {
    /// Creates a client for `database` on the service at `endpoint`
    pub fn new(endpoint: &str, database: &str) -> FrontierResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            db_url: format!("{}/v1/db/{}", endpoint.trim_end_matches('/'), database),
        })
    }

    fn bucket_url(&self, partition: Partition, action: &str) -> String {
        format!("{}/bucket/{}/{}", self.db_url, partition.as_str(), action)
    }

    /// Turns non-2xx responses into `FrontierError::Remote`
    async fn check(response: Response) -> FrontierResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(FrontierError::Remote {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_entries(&self, response: Response) -> FrontierResult<Entries> {
        let raw: HashMap<String, String> = Self::check(response).await?.json().await?;
        decode_entries(raw)
    }
}

fn encode_entries(entries: &Entries) -> HashMap<&str, String> {
    entries
        .iter()
        .map(|(url, tries)| (url.as_str(), tries.to_string()))
        .collect()
}

fn decode_entries(raw: HashMap<String, String>) -> FrontierResult<Entries> {
    raw.into_iter()
        .map(|(key, value)| match value.trim().parse::<u32>() {
            Ok(tries) => Ok((key, tries)),
            Err(_) => Err(FrontierError::CorruptValue { key, value }),
        })
        .collect()
}

#[async_trait]
impl Frontier for RemoteFrontier {
    async fn create_partitions(&self, partitions: &[Partition]) -> FrontierResult<()> {
        let names: Vec<&str> = partitions.iter().map(|p| p.as_str()).collect();
        let response = self
            .client
            .post(format!("{}/buckets", self.db_url))
            .json(&names)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_keys(&self, partition: Partition) -> FrontierResult<Vec<String>> {
        let response = self
            .client
            .get(self.bucket_url(partition, "keys"))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_entries(&self, partition: Partition) -> FrontierResult<Entries> {
        let response = self
            .client
            .get(self.bucket_url(partition, "all"))
            .send()
            .await?;
        self.fetch_entries(response).await
    }

    async fn has_keys(
        &self,
        partitions: &[Partition],
        keys: &[String],
    ) -> FrontierResult<HashMap<String, bool>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let request = HasKeysRequest {
            buckets: partitions.iter().map(|p| p.as_str()).collect(),
            keys,
        };
        let response = self
            .client
            .post(format!("{}/haskeys", self.db_url))
            .json(&request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn upsert(&self, partition: Partition, entries: &Entries) -> FrontierResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(self.bucket_url(partition, "update"))
            .json(&encode_entries(entries))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn pop(&self, partition: Partition, max: usize) -> FrontierResult<Entries> {
        let response = self
            .client
            .post(self.bucket_url(partition, "pop"))
            .query(&[("n", max)])
            .send()
            .await?;
        self.fetch_entries(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DB: &str = "aHR0cDovL2V4YW1wbGUuY29t";

    async fn frontier(server: &MockServer) -> RemoteFrontier {
        RemoteFrontier::new(&format!("{}/", server.uri()), DB).unwrap()
    }

    #[tokio::test]
    async fn test_create_partitions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/db/{}/buckets", DB)))
            .and(body_json(serde_json::json!(["todo", "done", "trash"])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        frontier(&server)
            .await
            .create_partitions(&Partition::ALL)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/db/{}/bucket/done/keys", DB)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!(["http://a.com/1", "http://a.com/2"])),
            )
            .mount(&server)
            .await;

        let keys = frontier(&server)
            .await
            .list_keys(Partition::Done)
            .await
            .unwrap();
        assert_eq!(keys, vec!["http://a.com/1", "http://a.com/2"]);
    }

    #[tokio::test]
    async fn test_list_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/db/{}/bucket/done/all", DB)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"http://a.com/1": "1", "http://a.com/2": "2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let done = frontier(&server)
            .await
            .list_entries(Partition::Done)
            .await
            .unwrap();
        assert_eq!(done.len(), 2);
        assert_eq!(done["http://a.com/2"], 2);
    }

    #[tokio::test]
    async fn test_pop_parses_tries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/db/{}/bucket/todo/pop", DB)))
            .and(query_param("n", "25"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"http://a.com/1": "0", "http://a.com/2": "3"})),
            )
            .mount(&server)
            .await;

        let popped = frontier(&server)
            .await
            .pop(Partition::Todo, 25)
            .await
            .unwrap();
        assert_eq!(popped.len(), 2);
        assert_eq!(popped["http://a.com/2"], 3);
    }

    #[tokio::test]
    async fn test_pop_corrupt_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/db/{}/bucket/todo/pop", DB)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"http://a.com/1": "many"})),
            )
            .mount(&server)
            .await;

        let result = frontier(&server).await.pop(Partition::Todo, 1).await;
        assert!(matches!(result, Err(FrontierError::CorruptValue { .. })));
    }

    #[tokio::test]
    async fn test_upsert_sends_string_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/db/{}/bucket/trash/update", DB)))
            .and(body_json(serde_json::json!({"http://a.com/1": "4"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut entries = Entries::new();
        entries.insert("http://a.com/1".to_string(), 4);
        frontier(&server)
            .await
            .upsert(Partition::Trash, &entries)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_upsert_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        frontier(&server)
            .await
            .upsert(Partition::Todo, &Entries::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_has_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/db/{}/haskeys", DB)))
            .and(body_json(serde_json::json!({
                "buckets": ["todo", "done", "trash"],
                "keys": ["http://a.com/1", "http://a.com/2"]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"http://a.com/1": true, "http://a.com/2": false})),
            )
            .mount(&server)
            .await;

        let keys = vec!["http://a.com/1".to_string(), "http://a.com/2".to_string()];
        let found = frontier(&server)
            .await
            .has_keys(&Partition::ALL, &keys)
            .await
            .unwrap();
        assert!(found["http://a.com/1"]);
        assert!(!found["http://a.com/2"]);
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("bucket missing"))
            .mount(&server)
            .await;

        let result = frontier(&server).await.list_entries(Partition::Todo).await;
        match result {
            Err(FrontierError::Remote { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "bucket missing");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }
}
