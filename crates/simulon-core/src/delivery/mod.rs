//! Delivery strategies for loop output.
//!
//! The loop only knows [`FrameSink`]: it emits `Data` frames and one
//! terminal frame. How those frames reach a caller is up to the strategy:
//!
//! - batch: [`batch::collect_batch`] buffers everything into one document
//! - progressive JSON: [`progressive::ProgressiveJsonEncoder`] writes one
//!   chunk per frame of a single `{"results":[...]}` document
//! - event stream: [`ThinkFrame::to_sse_data`](simulon_types::think::ThinkFrame::to_sse_data)
//!   gives the `data:` payload of each Server-Sent Event

pub mod batch;
pub mod progressive;
pub mod sink;

pub use sink::{FrameSink, frame_channel};
