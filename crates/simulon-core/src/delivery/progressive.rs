//! Progressive JSON delivery.
//!
//! The response body is one JSON document written in pieces while the loop
//! runs. Concatenating every chunk yields
//!
//! ```text
//! {"results":[{"q":"..","a":".."},{"q":"..","a":".."}]}
//! ```
//!
//! A failed run still produces a valid document, with an extra `error`
//! member after the array: `{"results":[...],"error":"..."}`.

use serde::Deserialize;
use simulon_types::think::{QaPair, ThinkFrame};

/// First chunk of every progressive body.
pub const OPENING: &str = "{\"results\":[";

/// Turns loop frames into body chunks.
#[derive(Debug, Default)]
pub struct ProgressiveJsonEncoder {
    written: usize,
    closed: bool,
}

impl ProgressiveJsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opening(&self) -> &'static str {
        OPENING
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Chunk for one frame. Frames after the terminal one encode to nothing.
    pub fn encode(&mut self, frame: &ThinkFrame) -> String {
        if self.closed {
            return String::new();
        }
        match frame {
            ThinkFrame::Data(pair) => {
                let json = serde_json::to_string(pair).unwrap_or_else(|_| "{}".to_string());
                let chunk = if self.written == 0 { json } else { format!(",{json}") };
                self.written += 1;
                chunk
            }
            ThinkFrame::Done => {
                self.closed = true;
                "]}".to_string()
            }
            ThinkFrame::Error { reason } => {
                self.closed = true;
                let reason = serde_json::to_string(reason).unwrap_or_else(|_| "\"\"".to_string());
                format!("],\"error\":{reason}}}")
            }
        }
    }
}

/// Errors from reading a progressive body.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressiveDecodeError {
    #[error("body does not start with {OPENING}")]
    BadOpening,

    #[error("malformed pair: {0}")]
    MalformedPair(String),

    #[error("body ended before the document was closed")]
    Truncated,

    #[error("server reported: {0}")]
    Remote(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opening,
    Items,
    Tail,
}

#[derive(Deserialize)]
struct Tail {
    error: String,
}

/// Incremental reader for a progressive body.
///
/// Feed chunks as they arrive in any split; each call returns the pairs that
/// became complete. Call [`finish`](Self::finish) once the body ends.
#[derive(Debug)]
pub struct ProgressiveJsonDecoder {
    buf: Vec<u8>,
    phase: Phase,
}

impl Default for ProgressiveJsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressiveJsonDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            phase: Phase::Opening,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<QaPair>, ProgressiveDecodeError> {
        self.buf.extend_from_slice(chunk);
        let mut pairs = Vec::new();

        if self.phase == Phase::Opening {
            let start = skip_ws(&self.buf, 0);
            let have = &self.buf[start..];
            let want = OPENING.as_bytes();
            if have.len() < want.len() {
                if !want.starts_with(have) {
                    return Err(ProgressiveDecodeError::BadOpening);
                }
                return Ok(pairs);
            }
            if !have.starts_with(want) {
                return Err(ProgressiveDecodeError::BadOpening);
            }
            self.buf.drain(..start + want.len());
            self.phase = Phase::Items;
        }

        while self.phase == Phase::Items {
            let mut pos = skip_ws(&self.buf, 0);
            if self.buf.get(pos) == Some(&b',') {
                pos = skip_ws(&self.buf, pos + 1);
            }
            match self.buf.get(pos) {
                None => {
                    self.buf.drain(..pos);
                    break;
                }
                Some(b']') => {
                    self.buf.drain(..=pos);
                    self.phase = Phase::Tail;
                }
                Some(b'{') => {
                    let Some(end) = object_end(&self.buf, pos) else {
                        self.buf.drain(..pos);
                        break;
                    };
                    let pair: QaPair = serde_json::from_slice(&self.buf[pos..=end])
                        .map_err(|e| ProgressiveDecodeError::MalformedPair(e.to_string()))?;
                    pairs.push(pair);
                    self.buf.drain(..=end);
                }
                Some(other) => {
                    return Err(ProgressiveDecodeError::MalformedPair(format!(
                        "unexpected byte '{}'",
                        char::from(*other)
                    )));
                }
            }
        }

        Ok(pairs)
    }

    /// Validate the end of the document.
    ///
    /// Returns `Err(Remote)` when the server closed the array with an error
    /// member, `Err(Truncated)` when the body stopped early.
    pub fn finish(self) -> Result<(), ProgressiveDecodeError> {
        if self.phase != Phase::Tail {
            return Err(ProgressiveDecodeError::Truncated);
        }
        let tail = String::from_utf8_lossy(&self.buf);
        let tail = tail.trim();
        if tail == "}" {
            return Ok(());
        }
        let Some(members) = tail.strip_prefix(',') else {
            return Err(ProgressiveDecodeError::Truncated);
        };
        match serde_json::from_str::<Tail>(&format!("{{{members}")) {
            Ok(tail) => Err(ProgressiveDecodeError::Remote(tail.error)),
            Err(_) => Err(ProgressiveDecodeError::Truncated),
        }
    }
}

fn skip_ws(buf: &[u8], mut pos: usize) -> usize {
    while buf.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

/// Index of the brace closing the object that starts at `start`, if the
/// buffer already holds all of it.
fn object_end(buf: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in buf.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
