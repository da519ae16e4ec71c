//! Batch delivery: the whole run as one document.

use simulon_types::think::{GENERIC_FAILURE, QaPair, ThinkBatch, ThinkFrame};
use tokio::sync::mpsc;

/// Assemble a batch body from a run's frames.
///
/// A run that ends in an error frame yields the error reason and no partial
/// result. A run that ends without any terminal frame counts as failed.
pub fn assemble_batch(frames: impl IntoIterator<Item = ThinkFrame>) -> Result<ThinkBatch, String> {
    let mut results: Vec<QaPair> = Vec::new();
    for frame in frames {
        match frame {
            ThinkFrame::Data(pair) => results.push(pair),
            ThinkFrame::Done => return Ok(ThinkBatch { results }),
            ThinkFrame::Error { reason } => return Err(reason),
        }
    }
    Err(GENERIC_FAILURE.to_string())
}

/// Drain a run's frame channel into a batch body.
pub async fn collect_batch(rx: &mut mpsc::Receiver<ThinkFrame>) -> Result<ThinkBatch, String> {
    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        let terminal = frame.is_terminal();
        frames.push(frame);
        if terminal {
            break;
        }
    }
    assemble_batch(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_yields_all_pairs_in_order() {
        let frames = vec![
            ThinkFrame::Data(QaPair::new("Q1", "A1")),
            ThinkFrame::Data(QaPair::new("Q2", "A2")),
            ThinkFrame::Done,
        ];
        let batch = assemble_batch(frames).unwrap();
        assert_eq!(batch.results, vec![QaPair::new("Q1", "A1"), QaPair::new("Q2", "A2")]);
    }

    #[test]
    fn error_discards_partial_results() {
        let frames = vec![
            ThinkFrame::Data(QaPair::new("Q1", "A1")),
            ThinkFrame::Error {
                reason: "Internal server error".to_string(),
            },
        ];
        assert_eq!(assemble_batch(frames).unwrap_err(), "Internal server error");
    }

    #[test]
    fn missing_terminal_frame_is_a_failure() {
        let frames = vec![ThinkFrame::Data(QaPair::new("Q1", "A1"))];
        assert!(assemble_batch(frames).is_err());
    }

    #[tokio::test]
    async fn collect_stops_at_terminal_frame() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(ThinkFrame::Data(QaPair::new("Q1", "A1"))).await.unwrap();
        tx.send(ThinkFrame::Done).await.unwrap();
        // Anything after the terminal frame is ignored; the sender stays open.
        tx.send(ThinkFrame::Data(QaPair::new("late", "late"))).await.unwrap();

        let batch = collect_batch(&mut rx).await.unwrap();
        assert_eq!(batch.results.len(), 1);
    }
}
