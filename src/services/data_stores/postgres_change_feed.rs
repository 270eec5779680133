use color_eyre::eyre::eyre;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::domain::{
    ChangeFeed, ChangeFeedError, ChangeFilter, ChangeSubscription, RowChange,
};
use crate::utils::constants::NOTIFY_CHANNEL;

const EVENT_BUFFER: usize = 32;

// Change feed backed by the notify triggers in the backend schema. Each
// subscription holds its own LISTEN connection and forwards matching
// payloads until it is dropped or the connection dies.
#[derive(Clone)]
pub struct PostgresChangeFeed {
    pool: PgPool,
}

impl PostgresChangeFeed {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChangeFeed for PostgresChangeFeed {
    #[tracing::instrument(name = "Subscribing to PostgreSQL feed", skip_all)]
    async fn subscribe(
        &self,
        filter: ChangeFilter,
    ) -> Result<ChangeSubscription, ChangeFeedError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| ChangeFeedError::UnexpectedError(eyre!(e)))?;
        listener
            .listen(NOTIFY_CHANNEL)
            .await
            .map_err(|e| ChangeFeedError::UnexpectedError(eyre!(e)))?;

        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let pump = tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(notification) => notification,
                    Err(e) => {
                        tracing::error!(error = %e, "change feed connection lost");
                        break;
                    }
                };

                match serde_json::from_str::<RowChange>(notification.payload())
                {
                    Ok(change) if filter.matches(&change) => {
                        if tx.send(change).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            payload = notification.payload(),
                            "unparseable change payload"
                        );
                    }
                }
            }
        });

        Ok(ChangeSubscription::new(events, pump))
    }
}
