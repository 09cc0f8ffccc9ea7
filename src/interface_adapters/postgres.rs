use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::entities::{AuditEntry, GuestPatch, GuestRecord, GuestbookEntry, Prediction};
use crate::domain::ports::{AuditLog, GuestFeed, GuestStore, GuestbookStore, PredictionBoard};

// PostgreSQL-backed guest store. Documents are JSON text stored under the
// lowercase code; every change pushes a fresh snapshot to subscribers.
#[derive(Clone)]
pub struct PostgresGuestStore {
    pub db: PgPool,
    feed: broadcast::Sender<GuestFeed>,
}

impl PostgresGuestStore {
    pub fn new(db: PgPool) -> Self {
        let (feed, _) = broadcast::channel(32);
        Self { db, feed }
    }

    async fn publish_snapshot(&self) {
        let rows = match sqlx::query("SELECT code, data FROM guests")
            .fetch_all(&self.db)
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "guest snapshot query failed");
                let _ = self.feed.send(GuestFeed::Interrupted);
                return;
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let code: String = match row.try_get("code") {
                Ok(code) => code,
                Err(err) => {
                    warn!(error = %err, "guest snapshot row missing code");
                    continue;
                }
            };
            let data: String = match row.try_get("data") {
                Ok(data) => data,
                Err(err) => {
                    warn!(error = %err, code = %code, "guest snapshot row missing data");
                    continue;
                }
            };
            match serde_json::from_str::<GuestRecord>(&data) {
                Ok(record) => records.push(fill_code(record, &code)),
                Err(err) => {
                    warn!(error = %err, code = %code, "skipping unreadable guest document")
                }
            }
        }
        let _ = self.feed.send(GuestFeed::Snapshot(records));
    }
}

// Documents written by older tooling may miss their own code field.
fn fill_code(mut record: GuestRecord, key: &str) -> GuestRecord {
    if record.code.trim().is_empty() {
        record.code = key.to_uppercase();
    }
    record
}

#[async_trait]
impl GuestStore for PostgresGuestStore {
    async fn get(&self, code: &str) -> Result<Option<GuestRecord>, String> {
        let key = code.to_lowercase();
        let row = sqlx::query("SELECT data FROM guests WHERE code = $1")
            .bind(&key)
            .fetch_optional(&self.db)
            .await
            .map_err(|err| err.to_string())?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: String = row.try_get("data").map_err(|err| err.to_string())?;
        let record: GuestRecord =
            serde_json::from_str(&data).map_err(|err| err.to_string())?;
        Ok(Some(fill_code(record, &key)))
    }

    async fn set(&self, code: &str, record: GuestRecord) -> Result<(), String> {
        let blob = serde_json::to_string(&record).map_err(|err| err.to_string())?;
        sqlx::query(
            r#"
            INSERT INTO guests (code, data)
            VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(code.to_lowercase())
        .bind(&blob)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        self.publish_snapshot().await;
        Ok(())
    }

    async fn update(&self, code: &str, patch: GuestPatch) -> Result<(), String> {
        let key = code.to_lowercase();
        let mut tx = self.db.begin().await.map_err(|err| err.to_string())?;

        let row = sqlx::query("SELECT data FROM guests WHERE code = $1 FOR UPDATE")
            .bind(&key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| err.to_string())?;
        let Some(row) = row else {
            return Err("document missing".to_string());
        };
        let data: String = row.try_get("data").map_err(|err| err.to_string())?;
        let mut record: GuestRecord =
            serde_json::from_str(&data).map_err(|err| err.to_string())?;
        patch.apply(&mut record);
        let blob = serde_json::to_string(&record).map_err(|err| err.to_string())?;

        sqlx::query("UPDATE guests SET data = $2 WHERE code = $1")
            .bind(&key)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(|err| err.to_string())?;
        tx.commit().await.map_err(|err| err.to_string())?;

        self.publish_snapshot().await;
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<bool, String> {
        let result = sqlx::query("DELETE FROM guests WHERE code = $1")
            .bind(code.to_lowercase())
            .execute(&self.db)
            .await
            .map_err(|err| err.to_string())?;

        let removed = result.rows_affected() > 0;
        if removed {
            self.publish_snapshot().await;
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<GuestFeed> {
        self.feed.subscribe()
    }
}

// PostgreSQL-backed audit log.
#[derive(Clone)]
pub struct PostgresAuditLog {
    pub db: PgPool,
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, action, meta, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.action)
        .bind(entry.meta.to_string())
        .bind(entry.created_at as i64)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(())
    }
}

// PostgreSQL-backed guestbook.
#[derive(Clone)]
pub struct PostgresGuestbook {
    pub db: PgPool,
}

#[async_trait]
impl GuestbookStore for PostgresGuestbook {
    async fn add(&self, entry: GuestbookEntry) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO guestbook (id, message, author, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.message)
        .bind(&entry.author)
        .bind(entry.created_at as i64)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<GuestbookEntry>, String> {
        let rows = sqlx::query("SELECT id, message, author, created_at FROM guestbook")
            .fetch_all(&self.db)
            .await
            .map_err(|err| err.to_string())?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at: i64 = row.try_get("created_at").map_err(|err| err.to_string())?;
            entries.push(GuestbookEntry {
                id: row.try_get("id").map_err(|err| err.to_string())?,
                message: row.try_get("message").map_err(|err| err.to_string())?,
                author: row.try_get("author").map_err(|err| err.to_string())?,
                created_at: created_at.max(0) as u64,
            });
        }
        Ok(entries)
    }
}

// PostgreSQL-backed prediction board.
#[derive(Clone)]
pub struct PostgresPredictionBoard {
    pub db: PgPool,
}

#[async_trait]
impl PredictionBoard for PostgresPredictionBoard {
    async fn add(&self, prediction: Prediction) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO predictions (id, body, likes, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&prediction.id)
        .bind(&prediction.text)
        .bind(i64::from(prediction.likes))
        .bind(prediction.created_at as i64)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Prediction>, String> {
        let rows = sqlx::query("SELECT id, body, likes, created_at FROM predictions")
            .fetch_all(&self.db)
            .await
            .map_err(|err| err.to_string())?;

        let mut predictions = Vec::with_capacity(rows.len());
        for row in rows {
            let likes: i64 = row.try_get("likes").map_err(|err| err.to_string())?;
            let created_at: i64 = row.try_get("created_at").map_err(|err| err.to_string())?;
            predictions.push(Prediction {
                id: row.try_get("id").map_err(|err| err.to_string())?,
                text: row.try_get("body").map_err(|err| err.to_string())?,
                likes: likes.max(0) as u32,
                created_at: created_at.max(0) as u64,
            });
        }
        Ok(predictions)
    }

    async fn like(&self, id: &str) -> Result<Option<u32>, String> {
        let row = sqlx::query("UPDATE predictions SET likes = likes + 1 WHERE id = $1 RETURNING likes")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|err| err.to_string())?;

        match row {
            Some(row) => {
                let likes: i64 = row.try_get("likes").map_err(|err| err.to_string())?;
                Ok(Some(likes.max(0) as u32))
            }
            None => Ok(None),
        }
    }
}
