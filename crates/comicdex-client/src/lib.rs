//! HTTP client for the upstream comic source, implementing
//! [`comicdex_core::interfaces::ComicProvider`] over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use comicdex_core::domain::Comic;
use comicdex_core::error::{Error, Result};
use comicdex_core::interfaces::ComicProvider;

/// Fetches one comic at a time from `{base}/{id}/info.0.json`.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, req_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(req_timeout)
            .build()
            .map_err(Error::internal)?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn comic_url(&self, id: i64) -> String {
        format!("{}/{}/info.0.json", self.base_url.trim_end_matches('/'), id)
    }
}

#[async_trait]
impl ComicProvider for UpstreamClient {
    async fn get_by_id(&self, id: i64) -> Result<Comic> {
        let url = self.comic_url(id);

        let response = self
            .http
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|err| {
                log::error!("[ upstream.get_by_id ] request failed for id {id}: {err}");
                Error::transient(err)
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }

        if !response.status().is_success() {
            log::error!("[ upstream.get_by_id ] unexpected status {} for id {id}", response.status());
            return Err(Error::Transient(format!("unexpected status {}", response.status())));
        }

        response.json::<Comic>().await.map_err(|err| {
            log::error!("[ upstream.get_by_id ] failed to decode body for id {id}: {err}");
            Error::transient(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn decodes_a_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/info.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "num": 1,
                "title": "Barrel - Part 1",
                "alt": "Don't we all.",
                "transcript": "",
                "img": "https://example.com/1.png",
            })))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(server.uri(), Duration::from_secs(1)).unwrap();
        let comic = client.get_by_id(1).await.unwrap();
        assert_eq!(comic.num, 1);
        assert_eq!(comic.title, "Barrel - Part 1");
    }

    #[tokio::test]
    async fn maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/999/info.0.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(server.uri(), Duration::from_secs(1)).unwrap();
        let err = client.get_by_id(999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[tokio::test]
    async fn maps_server_error_to_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/info.0.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(server.uri(), Duration::from_secs(1)).unwrap();
        let err = client.get_by_id(2).await.unwrap_err();
        assert!(matches!(err, Error::Transient(_)));
    }

    #[tokio::test]
    async fn maps_malformed_body_to_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/info.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(server.uri(), Duration::from_secs(1)).unwrap();
        let err = client.get_by_id(3).await.unwrap_err();
        assert!(matches!(err, Error::Transient(_)));
    }
}
