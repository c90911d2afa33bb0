//! Banned-word list with change notifications.
//!
//! Every add and remove publishes `{action, id, word, severity}` on
//! [`BANNED_WORDS_CHANNEL`] inside the writing transaction, so listeners see
//! the change exactly when it commits.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use tracing::info;

use super::postgres::{PostgresError, PostgresStore};

pub const BANNED_WORDS_CHANNEL: &str = "management_banned_words";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BannedWord {
    pub id: i32,
    pub word: String,
    pub severity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordChange {
    Added,
    Removed,
}

/// Notification body for one change.
pub fn word_change_payload(change: WordChange, word: &BannedWord) -> serde_json::Value {
    json!({
        "action": change,
        "id": word.id,
        "word": word.word,
        "severity": word.severity,
    })
}

/// Trimmed word, or the field error.
pub fn normalize_word(word: &str, severity: i32) -> Result<String, PostgresError> {
    let word = word.trim();
    if word.is_empty() {
        return Err(PostgresError::validation("word: must not be empty"));
    }
    if severity < 1 {
        return Err(PostgresError::validation(format!(
            "severity: must be at least 1 (got {})",
            severity
        )));
    }
    Ok(word.to_string())
}

impl PostgresStore {
    pub async fn list_banned_words(&self) -> Result<Vec<BannedWord>, PostgresError> {
        let rows = sqlx::query_as::<_, BannedWord>(
            "SELECT id, word, severity FROM management.banned_words ORDER BY word",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn add_banned_word(
        &self,
        word: &str,
        severity: i32,
    ) -> Result<BannedWord, PostgresError> {
        let word = normalize_word(word, severity)?;

        let mut tx = self.begin().await?;
        let inserted = sqlx::query_as::<_, BannedWord>(
            "INSERT INTO management.banned_words (word, severity)
             VALUES ($1, $2)
             RETURNING id, word, severity",
        )
        .bind(&word)
        .bind(severity)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PostgresError::validation(format!("word: `{}` is already banned", word))
            }
            other => PostgresError::Sqlx(other),
        })?;

        Self::notify(
            &mut tx,
            BANNED_WORDS_CHANNEL,
            &word_change_payload(WordChange::Added, &inserted),
        )
        .await;
        tx.commit().await?;

        info!("Banned word {} added (severity {})", inserted.id, inserted.severity);
        Ok(inserted)
    }

    pub async fn remove_banned_word(&self, id: i32) -> Result<BannedWord, PostgresError> {
        let mut tx = self.begin().await?;
        let removed = sqlx::query_as::<_, BannedWord>(
            "DELETE FROM management.banned_words WHERE id = $1 RETURNING id, word, severity",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| PostgresError::NotFound(format!("banned word {}", id)))?;

        Self::notify(
            &mut tx,
            BANNED_WORDS_CHANNEL,
            &word_change_payload(WordChange::Removed, &removed),
        )
        .await;
        tx.commit().await?;

        info!("Banned word {} removed", removed.id);
        Ok(removed)
    }
}
