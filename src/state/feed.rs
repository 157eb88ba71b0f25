use crate::api::ApiClient;
use crate::auth::TokenProvider;
use anyhow::{anyhow, bail, Result};
use std::sync::Arc;

/// Transient state for RSS feed submissions, mirroring the chat session's
/// single-flight discipline: one ingestion at a time, processing flag cleared
/// on every exit path.
pub struct FeedTracker {
    client: Arc<ApiClient>,
    auth: Arc<dyn TokenProvider>,
    processing: bool,
    total_articles: Option<u64>,
}

impl FeedTracker {
    pub fn new(client: Arc<ApiClient>, auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            auth,
            processing: false,
            total_articles: None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Article count reported by the most recent successful ingestion.
    pub fn total_articles(&self) -> Option<u64> {
        self.total_articles
    }

    /// Submit a feed URL for remote ingestion and wait for the result.
    /// Blank input is a no-op; `Ok(None)` means nothing was submitted.
    pub async fn submit(&mut self, rss_url: &str) -> Result<Option<u64>> {
        if rss_url.trim().is_empty() {
            return Ok(None);
        }
        if self.processing {
            bail!("a feed is already being ingested");
        }

        self.processing = true;
        self.total_articles = None;
        let result = self.ingest(rss_url).await;
        self.processing = false;

        let count = result?;
        self.total_articles = Some(count);
        Ok(Some(count))
    }

    async fn ingest(&self, rss_url: &str) -> Result<u64> {
        let token = self
            .auth
            .current_token()
            .ok_or_else(|| anyhow!("not signed in: a bearer token is required"))?;
        self.client.add_feed(rss_url, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::EnvSession;
    use crate::config::Config;

    fn tracker() -> FeedTracker {
        // Any network call in these tests would hang or fail loudly; the
        // discard port guarantees a fast refusal if one slips through.
        let client = ApiClient::new(&Config {
            server_url: "http://127.0.0.1:9".to_string(),
            api_token: None,
        });
        FeedTracker::new(Arc::new(client), Arc::new(EnvSession::signed_out()))
    }

    #[tokio::test]
    async fn test_blank_url_is_a_noop() {
        let mut feed = tracker();
        let outcome = feed.submit("   ").await.expect("no-op");
        assert_eq!(outcome, None);
        assert!(!feed.is_processing());
        assert_eq!(feed.total_articles(), None);
    }

    #[tokio::test]
    async fn test_signed_out_submission_fails_without_network() {
        let mut feed = tracker();
        let error = feed
            .submit("https://news.example.com/rss.xml")
            .await
            .expect_err("signed-out submit must fail");
        assert!(error.to_string().contains("not signed in"));
        assert!(!feed.is_processing());
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_refused() {
        let mut feed = tracker();
        feed.processing = true;
        let error = feed
            .submit("https://news.example.com/rss.xml")
            .await
            .expect_err("busy tracker must refuse");
        assert!(error.to_string().contains("already being ingested"));
    }
}
