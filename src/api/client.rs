use crate::api::logging::{debug_payload_enabled, emit_debug_payload};
use crate::auth::BearerToken;
use crate::config::Config;
use crate::types::HistoryResponse;
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, bail, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

const ASK_PATH: &str = "/chat/ask";
const HISTORY_PATH: &str = "/chat/history";
const CLEAR_PATH: &str = "/chat/clear";
const ADD_FEED_PATH: &str = "/upload/add-feed";

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, question: &str) -> Result<ByteStream>;
}

/// Wire shape of the feed ingestion response. The server reports logical
/// failures through `error` even under a 2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
struct FeedIngestBody {
    #[serde(rename = "totalArticles")]
    total_articles: Option<u64>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    server_url: String,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url: config.server_url.trim_end_matches('/').to_string(),
            #[cfg(test)]
            mock_stream_producer: None,
        }
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url: "http://localhost:3000".to_string(),
            mock_stream_producer: Some(mock_producer),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    /// POST the question and hand back the raw streaming body. Frame parsing
    /// is the caller's concern (`api::stream::FrameParser`).
    pub async fn ask(&self, question: &str, token: &BearerToken) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(question);
            }
        }

        let request_url = self.endpoint(ASK_PATH);
        let payload = json!({ "question": question });
        if debug_payload_enabled() {
            emit_debug_payload(&request_url, &payload);
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("authorization", token.header_value())
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    pub async fn history(&self, token: &BearerToken) -> Result<HistoryResponse> {
        let request_url = self.endpoint(HISTORY_PATH);
        let response = self
            .http
            .get(&request_url)
            .header("content-type", "application/json")
            .header("authorization", token.header_value())
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        response
            .json::<HistoryResponse>()
            .await
            .map_err(|error| anyhow!("invalid history response from '{request_url}': {error}"))
    }

    pub async fn clear(&self, token: &BearerToken) -> Result<()> {
        let request_url = self.endpoint(CLEAR_PATH);
        self.http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("authorization", token.header_value())
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;
        Ok(())
    }

    /// Single blocking round trip; the server fetches and embeds the whole
    /// feed before answering, so this can take a while.
    pub async fn add_feed(&self, rss_url: &str, token: &BearerToken) -> Result<u64> {
        let request_url = self.endpoint(ADD_FEED_PATH);
        let payload = json!({ "rssUrl": rss_url });
        if debug_payload_enabled() {
            emit_debug_payload(&request_url, &payload);
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("authorization", token.header_value())
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;

        // The body is parsed even on failure statuses: a reported `error`
        // field beats the generic HTTP-status message.
        let status = response.status();
        let body = response.json::<FeedIngestBody>().await;

        if !status.is_success() {
            match body.ok().and_then(|b| b.error) {
                Some(reported) => bail!("{reported}"),
                None => bail!("feed endpoint '{request_url}' returned HTTP {status}"),
            }
        }

        let body = body
            .map_err(|error| anyhow!("invalid feed response from '{request_url}': {error}"))?;
        if let Some(reported) = body.error {
            bail!("{reported}");
        }
        Ok(body.total_articles.unwrap_or(0))
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local news server '{}': {}. Start the backend or update NEWSDESK_SERVER_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach news server '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "news server '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("request to '{}' failed: {}", request_url, error)
}
