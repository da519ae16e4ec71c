//! The loop-facing side of the delivery channel.

use simulon_types::think::ThinkFrame;
use tokio::sync::mpsc;

/// Receiver of loop frames.
///
/// `emit` returns `false` once nobody is listening anymore. The loop keeps
/// running regardless; a detached client does not cancel model calls.
pub trait FrameSink: Send {
    fn emit(&mut self, frame: ThinkFrame) -> impl std::future::Future<Output = bool> + Send;
}

impl FrameSink for mpsc::Sender<ThinkFrame> {
    async fn emit(&mut self, frame: ThinkFrame) -> bool {
        self.send(frame).await.is_ok()
    }
}

impl FrameSink for Vec<ThinkFrame> {
    async fn emit(&mut self, frame: ThinkFrame) -> bool {
        self.push(frame);
        true
    }
}

/// A channel large enough that a loop of `max_rounds` never waits on it.
pub fn frame_channel(max_rounds: u32) -> (mpsc::Sender<ThinkFrame>, mpsc::Receiver<ThinkFrame>) {
    mpsc::channel(max_rounds as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulon_types::think::QaPair;

    #[tokio::test]
    async fn channel_sink_reports_detached_receiver() {
        let (mut tx, rx) = frame_channel(2);
        assert!(tx.emit(ThinkFrame::Data(QaPair::new("q", "a"))).await);
        drop(rx);
        assert!(!tx.emit(ThinkFrame::Done).await);
    }

    #[tokio::test]
    async fn channel_holds_a_full_run_without_a_reader() {
        let (mut tx, mut rx) = frame_channel(3);
        for i in 0..3 {
            assert!(tx.emit(ThinkFrame::Data(QaPair::new(format!("Q{i}"), "a"))).await);
        }
        assert!(tx.emit(ThinkFrame::Done).await);
        drop(tx);

        let mut received = Vec::new();
        while let Some(frame) = rx.recv().await {
            received.push(frame);
        }
        assert_eq!(received.len(), 4);
        assert_eq!(received.last(), Some(&ThinkFrame::Done));
    }
}
