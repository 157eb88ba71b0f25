use crate::api::client::{ByteStream, MockStreamProducer};
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// Scripted ask streams for tests. Each configured response is a list of raw
/// transport chunks delivered verbatim, one per read, so tests control exactly
/// where chunk boundaries fall. A response may end with a transport error.
#[derive(Clone)]
pub struct MockApiClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
}

pub struct MockResponse {
    pub chunks: Vec<Vec<u8>>,
    pub trailing_error: Option<String>,
}

impl MockResponse {
    pub fn from_chunks(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
            trailing_error: None,
        }
    }

    pub fn failing_after(chunks: &[&str], error: &str) -> Self {
        Self {
            trailing_error: Some(error.to_string()),
            ..Self::from_chunks(chunks)
        }
    }
}

impl MockApiClient {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
        }
    }

    pub fn single(chunks: &[&str]) -> Self {
        Self::new(vec![MockResponse::from_chunks(chunks)])
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, _question: &str) -> Result<ByteStream> {
        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!(
                "MockApiClient: no more responses configured"
            ));
        }
        let response = responses_guard.remove(0);

        let mut items: Vec<Result<Bytes>> = response
            .chunks
            .into_iter()
            .map(|chunk| Ok(Bytes::from(chunk)))
            .collect();
        if let Some(error) = response.trailing_error {
            items.push(Err(anyhow::anyhow!(error)));
        }

        Ok(Box::pin(stream::iter(items)))
    }
}
