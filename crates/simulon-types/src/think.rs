//! Types produced by the conversation loop and carried by the delivery channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire form of [`ThinkFrame::Done`] in an event stream.
pub const SSE_DONE: &str = "[DONE]";

/// The only failure text a client ever sees for a server-side error.
pub const GENERIC_FAILURE: &str = "Internal server error";

/// One follow-up question and its answer. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub q: String,
    pub a: String,
}

impl QaPair {
    pub fn new(q: impl Into<String>, a: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            a: a.into(),
        }
    }

    /// Entry shown by a client shell when a request fails outright.
    pub fn failure_placeholder() -> Self {
        Self::new("(Failed to fetch response)", "(Failed to fetch response)")
    }
}

/// A unit the loop hands to a delivery strategy.
///
/// Every run emits zero or more `Data` frames followed by exactly one
/// terminal frame: `Done`, or `Error` when a remote call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThinkFrame {
    Data(QaPair),
    Done,
    Error { reason: String },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireFrame {
    Pair(QaPair),
    Error { error: String },
}

impl ThinkFrame {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ThinkFrame::Data(_))
    }

    /// The `data:` payload of this frame in an event stream.
    pub fn to_sse_data(&self) -> String {
        let wire = match self {
            ThinkFrame::Data(pair) => WireFrame::Pair(pair.clone()),
            ThinkFrame::Done => return SSE_DONE.to_string(),
            ThinkFrame::Error { reason } => WireFrame::Error {
                error: reason.clone(),
            },
        };
        serde_json::to_string(&wire)
            .unwrap_or_else(|_| r#"{"error":"serialization failure"}"#.to_string())
    }

    /// Parse the `data:` payload of an event-stream frame.
    pub fn from_sse_data(data: &str) -> Result<Self, serde_json::Error> {
        if data.trim() == SSE_DONE {
            return Ok(ThinkFrame::Done);
        }
        Ok(match serde_json::from_str::<WireFrame>(data)? {
            WireFrame::Pair(pair) => ThinkFrame::Data(pair),
            WireFrame::Error { error } => ThinkFrame::Error { reason: error },
        })
    }
}

/// How results of `POST /api/think` are delivered to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkMode {
    /// All pairs in one JSON document once the loop finishes.
    Batch,
    /// One chunked JSON document, flushed pair by pair.
    Progressive,
    /// Server-Sent Events terminated by the `[DONE]` sentinel.
    #[default]
    Stream,
    /// A single model call on the session context, no loop.
    Single,
}

impl ThinkMode {
    /// Whether the loop paces its iterations for this mode.
    pub fn is_incremental(self) -> bool {
        matches!(self, ThinkMode::Progressive | ThinkMode::Stream)
    }
}

impl fmt::Display for ThinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThinkMode::Batch => write!(f, "batch"),
            ThinkMode::Progressive => write!(f, "progressive"),
            ThinkMode::Stream => write!(f, "stream"),
            ThinkMode::Single => write!(f, "single"),
        }
    }
}

impl FromStr for ThinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "batch" => Ok(ThinkMode::Batch),
            "progressive" => Ok(ThinkMode::Progressive),
            "stream" => Ok(ThinkMode::Stream),
            "single" => Ok(ThinkMode::Single),
            other => Err(format!("invalid think mode: '{other}'")),
        }
    }
}

/// Body of a successful batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkBatch {
    pub results: Vec<QaPair>,
}

/// Body of a successful single-turn response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    pub result: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_frame_is_bare_pair() {
        let frame = ThinkFrame::Data(QaPair::new("Why?", "Because."));
        assert_eq!(frame.to_sse_data(), r#"{"q":"Why?","a":"Because."}"#);
    }

    #[test]
    fn test_done_frame_uses_sentinel() {
        assert_eq!(ThinkFrame::Done.to_sse_data(), "[DONE]");
        assert_eq!(ThinkFrame::from_sse_data("[DONE]").unwrap(), ThinkFrame::Done);
    }

    #[test]
    fn test_error_frame_parses_back() {
        let frame = ThinkFrame::Error {
            reason: "Internal server error".to_string(),
        };
        let data = frame.to_sse_data();
        assert_eq!(data, r#"{"error":"Internal server error"}"#);
        assert_eq!(ThinkFrame::from_sse_data(&data).unwrap(), frame);
    }

    #[test]
    fn test_garbage_frame_is_rejected() {
        assert!(ThinkFrame::from_sse_data("not json").is_err());
        assert!(ThinkFrame::from_sse_data(r#"{"q":"only a question"}"#).is_err());
    }

    #[test]
    fn test_terminal_frames() {
        assert!(!ThinkFrame::Data(QaPair::new("q", "a")).is_terminal());
        assert!(ThinkFrame::Done.is_terminal());
        assert!(ThinkFrame::Error { reason: String::new() }.is_terminal());
    }

    #[test]
    fn test_think_mode_parse() {
        assert_eq!("Batch".parse::<ThinkMode>().unwrap(), ThinkMode::Batch);
        assert_eq!(ThinkMode::default(), ThinkMode::Stream);
        assert!("carrier-pigeon".parse::<ThinkMode>().is_err());
        assert!(ThinkMode::Progressive.is_incremental());
        assert!(!ThinkMode::Batch.is_incremental());
    }
}
