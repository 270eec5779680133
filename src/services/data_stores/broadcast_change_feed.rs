use tokio::sync::{broadcast, mpsc};

use crate::domain::{
    ChangeFeed, ChangeFeedError, ChangeFilter, ChangeSubscription, RowChange,
};

const EVENT_BUFFER: usize = 32;

// In-process change channel backing the in-memory stores. Stands in for
// the backend's push subscription in tests and offline use.
#[derive(Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<RowChange>,
}

impl BroadcastChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, change: RowChange) {
        // A send with no live subscribers is not an error.
        let _ = self.sender.send(change);
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait::async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    #[tracing::instrument(name = "Subscribing to broadcast feed", skip_all)]
    async fn subscribe(
        &self,
        filter: ChangeFilter,
    ) -> Result<ChangeSubscription, ChangeFeedError> {
        let mut source = self.sender.subscribe();
        let (tx, events) = mpsc::channel(EVENT_BUFFER);

        let pump = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(change) if filter.matches(&change) => {
                        if tx.send(change).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "change feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(ChangeSubscription::new(events, pump))
    }
}
