use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::{GuestbookEntry, Prediction};
use crate::domain::errors::SubmissionError;
use crate::domain::ports::{Clock, GuestbookStore, PredictionBoard};

// Guestbook signing and reading. Listing returns newest entries first.
pub struct GuestbookUseCase<G, K> {
    pub store: G,
    pub clock: K,
}

impl<G, K> GuestbookUseCase<G, K>
where
    G: GuestbookStore,
    K: Clock,
{
    pub async fn sign(
        &self,
        message: &str,
        author: Option<&str>,
    ) -> Result<GuestbookEntry, SubmissionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SubmissionError::EmptyMessage);
        }

        let entry = GuestbookEntry {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            author: author
                .map(str::trim)
                .filter(|author| !author.is_empty())
                .map(str::to_string),
            created_at: self.clock.now_epoch_millis(),
        };
        self.store.add(entry.clone()).await.map_err(|err| {
            warn!(error = %err, "guestbook write failed");
            SubmissionError::StorageFailure
        })?;
        Ok(entry)
    }

    pub async fn list(&self) -> Result<Vec<GuestbookEntry>, SubmissionError> {
        let mut entries = self.store.list().await.map_err(|err| {
            warn!(error = %err, "guestbook read failed");
            SubmissionError::StorageFailure
        })?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

// Prediction submissions and likes. Listing orders by likes, then recency.
pub struct PredictionsUseCase<P, K> {
    pub board: P,
    pub clock: K,
}

impl<P, K> PredictionsUseCase<P, K>
where
    P: PredictionBoard,
    K: Clock,
{
    pub async fn submit(&self, text: &str) -> Result<Prediction, SubmissionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmissionError::EmptyMessage);
        }

        let prediction = Prediction {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            likes: 0,
            created_at: self.clock.now_epoch_millis(),
        };
        self.board.add(prediction.clone()).await.map_err(|err| {
            warn!(error = %err, "prediction write failed");
            SubmissionError::StorageFailure
        })?;
        Ok(prediction)
    }

    pub async fn list(&self) -> Result<Vec<Prediction>, SubmissionError> {
        let mut predictions = self.board.list().await.map_err(|err| {
            warn!(error = %err, "prediction read failed");
            SubmissionError::StorageFailure
        })?;
        predictions.sort_by(|a, b| {
            b.likes
                .cmp(&a.likes)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(predictions)
    }

    pub async fn like(&self, id: &str) -> Result<u32, SubmissionError> {
        match self.board.like(id).await {
            Ok(Some(likes)) => Ok(likes),
            Ok(None) => Err(SubmissionError::UnknownEntry),
            Err(err) => {
                warn!(error = %err, "prediction like failed");
                Err(SubmissionError::StorageFailure)
            }
        }
    }
}
