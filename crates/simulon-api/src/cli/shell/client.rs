//! HTTP client for `POST /api/think`.
//!
//! One method per delivery mode. Incremental modes hand each pair to a
//! callback as soon as it is decoded; batch returns the whole list.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use serde_json::{Value, json};

use simulon_core::delivery::progressive::{ProgressiveDecodeError, ProgressiveJsonDecoder};
use simulon_types::session::SessionId;
use simulon_types::think::{QaPair, ThinkBatch, ThinkFrame, ThinkMode, TurnReply};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },

    /// The server reported a failure inside an otherwise successful response.
    #[error("server reported: {0}")]
    Remote(String),

    #[error("malformed response: {0}")]
    Protocol(String),
}

impl From<ProgressiveDecodeError> for ClientError {
    fn from(e: ProgressiveDecodeError) -> Self {
        match e {
            ProgressiveDecodeError::Remote(reason) => ClientError::Remote(reason),
            other => ClientError::Protocol(other.to_string()),
        }
    }
}

pub struct ThinkClient {
    http: reqwest::Client,
    base_url: String,
}

impl ThinkClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, mode: ThinkMode, body: Value) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}/api/think?mode={mode}", self.base_url);
        tracing::debug!(%url, "posting think request");
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn seed_body(seed: &str, session: &SessionId) -> Value {
        json!({ "sessionId": session, "query": seed })
    }

    pub async fn batch(&self, seed: &str, session: &SessionId) -> Result<Vec<QaPair>, ClientError> {
        let response = self.post(ThinkMode::Batch, Self::seed_body(seed, session)).await?;
        let batch: ThinkBatch = response.json().await?;
        Ok(batch.results)
    }

    pub async fn progressive(
        &self,
        seed: &str,
        session: &SessionId,
        mut on_pair: impl FnMut(QaPair),
    ) -> Result<(), ClientError> {
        let response = self
            .post(ThinkMode::Progressive, Self::seed_body(seed, session))
            .await?;

        let mut decoder = ProgressiveJsonDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            for pair in decoder.feed(&chunk?)? {
                on_pair(pair);
            }
        }
        decoder.finish()?;
        Ok(())
    }

    pub async fn stream(
        &self,
        seed: &str,
        session: &SessionId,
        mut on_pair: impl FnMut(QaPair),
    ) -> Result<(), ClientError> {
        let response = self.post(ThinkMode::Stream, Self::seed_body(seed, session)).await?;

        let mut events = response.bytes_stream().eventsource();
        let mut failure: Option<String> = None;
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| ClientError::Protocol(e.to_string()))?;
            if event.data.trim().is_empty() {
                continue;
            }
            let frame = ThinkFrame::from_sse_data(&event.data)
                .map_err(|e| ClientError::Protocol(format!("bad frame: {e}")))?;
            match frame {
                ThinkFrame::Data(pair) => on_pair(pair),
                ThinkFrame::Error { reason } => failure = Some(reason),
                ThinkFrame::Done => {
                    return match failure {
                        Some(reason) => Err(ClientError::Remote(reason)),
                        None => Ok(()),
                    };
                }
            }
        }
        Err(ClientError::Protocol("stream ended before [DONE]".to_string()))
    }

    pub async fn single(&self, query: &str, session: &SessionId) -> Result<String, ClientError> {
        let response = self.post(ThinkMode::Single, Self::seed_body(query, session)).await?;
        let reply: TurnReply = response.json().await?;
        Ok(reply.result)
    }
}
