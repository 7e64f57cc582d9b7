//! Evidence rows: chunks supporting a node or edge.
//!
//! Retention is bounded — pruning keeps the top-N rows per parent, ranked by
//! score descending (unscored rows last) with recency as the tiebreak.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A supporting chunk reference attached to a node or edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// The supporting chunk.
    pub chunk_id: Uuid,
    /// Short quote from the chunk, if extracted.
    pub quote: Option<String>,
    /// Support strength in [0, 1], if scored.
    pub score: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl Evidence {
    /// Evidence with the current timestamp.
    pub fn new(chunk_id: Uuid) -> Self {
        Self {
            chunk_id,
            quote: None,
            score: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = Some(quote.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Trim an evidence list in place to the `keep` best rows.
///
/// Ranking: score descending, rows without a score last, ties broken by
/// `created_at` descending. Returns the number of rows deleted.
pub fn retain_top(rows: &mut Vec<Evidence>, keep: usize) -> usize {
    if rows.len() <= keep {
        return 0;
    }
    rows.sort_by(|a, b| {
        let score_a = a.score.unwrap_or(f32::NEG_INFINITY);
        let score_b = b.score.unwrap_or(f32::NEG_INFINITY);
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    let deleted = rows.len() - keep;
    rows.truncate(keep);
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn scored(score: f32, age_minutes: i64) -> Evidence {
        Evidence {
            chunk_id: Uuid::new_v4(),
            quote: None,
            score: Some(score),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn keeps_highest_scored() {
        let mut rows = vec![scored(0.2, 0), scored(0.9, 0), scored(0.5, 0), scored(0.7, 0)];
        let deleted = retain_top(&mut rows, 2);
        assert_eq!(deleted, 2);
        let kept: Vec<f32> = rows.iter().filter_map(|e| e.score).collect();
        assert_eq!(kept, vec![0.9, 0.7]);
    }

    #[test]
    fn unscored_rows_are_dropped_first() {
        let mut rows = vec![Evidence::new(Uuid::new_v4()), scored(0.1, 0), scored(0.3, 0)];
        retain_top(&mut rows, 2);
        assert!(rows.iter().all(|e| e.score.is_some()));
    }

    #[test]
    fn recency_breaks_score_ties() {
        let mut rows = vec![scored(0.5, 60), scored(0.5, 1), scored(0.5, 30)];
        retain_top(&mut rows, 2);
        assert_eq!(rows.len(), 2);
        // Newest two survive.
        assert!(rows.iter().all(|e| e.created_at > Utc::now() - Duration::minutes(45)));
    }

    #[test]
    fn short_lists_untouched() {
        let mut rows = vec![scored(0.5, 0)];
        assert_eq!(retain_top(&mut rows, 5), 0);
        assert_eq!(rows.len(), 1);
    }
}
