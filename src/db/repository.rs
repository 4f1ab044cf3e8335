//! SQLite implementation of the board store.
//!
//! Card replacement runs in a single transaction so a failed write leaves the
//! previous collection intact.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::errors::AppError;
use crate::models::{BoardId, Card, Stage, StageLabels};
use crate::store::BoardStore;

/// Database repository for board documents.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    labels: StageLabels,
}

impl Repository {
    pub fn new(pool: SqlitePool, labels: StageLabels) -> Self {
        Self { pool, labels }
    }

    async fn upsert_topic(
        tx: &mut Transaction<'_, Sqlite>,
        board_id: &BoardId,
        topic: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO boards (id, current_topic, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET current_topic = excluded.current_topic, updated_at = excluded.updated_at",
        )
        .bind(board_id.as_str())
        .bind(topic)
        .bind(&now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn write_cards(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        board_id: &BoardId,
        cards: &[Card],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM cards WHERE board_id = ?")
            .bind(board_id.as_str())
            .execute(&mut **tx)
            .await?;

        for (idx, card) in cards.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cards (board_id, idx, card_id, item, votes, status) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(board_id.as_str())
            .bind(idx as i64)
            .bind(card.id.to_string())
            .bind(&card.text)
            .bind(i64::from(card.votes))
            .bind(self.labels.label(card.status))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BoardStore for Repository {
    async fn load_topic(&self, board_id: &BoardId) -> Result<String, AppError> {
        let row = sqlx::query("SELECT current_topic FROM boards WHERE id = ?")
            .bind(board_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .map(|r| r.get::<String, _>("current_topic"))
            .unwrap_or_default())
    }

    async fn save_topic(&self, board_id: &BoardId, topic: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        Self::upsert_topic(&mut tx, board_id, topic).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_cards(&self, board_id: &BoardId) -> Result<Vec<Card>, AppError> {
        let rows = sqlx::query(
            "SELECT idx, card_id, item, votes, status FROM cards WHERE board_id = ? ORDER BY idx",
        )
        .bind(board_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| card_from_row(row, board_id, &self.labels))
            .collect())
    }

    async fn replace_cards(&self, board_id: &BoardId, cards: &[Card]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.write_cards(&mut tx, board_id, cards).await?;
        tx.commit().await?;
        tracing::debug!(board_id = %board_id, cards = cards.len(), "Replaced card collection");
        Ok(())
    }

    async fn start_topic(&self, board_id: &BoardId, topic: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        Self::upsert_topic(&mut tx, board_id, topic).await?;
        self.write_cards(&mut tx, board_id, &[]).await?;
        tx.commit().await?;
        Ok(())
    }
}

// Helper functions for row conversion

fn card_from_row(row: &sqlx::sqlite::SqliteRow, board_id: &BoardId, labels: &StageLabels) -> Card {
    let idx: i64 = row.get("idx");
    let card_id: String = row.get("card_id");
    let votes: i64 = row.get("votes");
    let status: String = row.get("status");

    // Derived from the slot so the id survives reloads until the next write repairs it
    let id = uuid::Uuid::parse_str(&card_id).unwrap_or_else(|_| {
        tracing::warn!("Card at position {} has malformed id {:?}", idx, card_id);
        uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_OID,
            format!("{}/{}", board_id, idx).as_bytes(),
        )
    });
    let status = labels.stage_for(&status).unwrap_or_else(|| {
        tracing::warn!("Card at position {} has unknown status {:?}", idx, status);
        Stage::ToDiscuss
    });

    Card {
        id,
        text: row.get("item"),
        votes: u32::try_from(votes).unwrap_or(0),
        status,
    }
}
