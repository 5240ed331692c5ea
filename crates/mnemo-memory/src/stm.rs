// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-term memory: a bounded FIFO of recent turns with TTL expiry
//! and cosine search over stored embeddings.
//!
//! All operations are in-memory and never suspend; the engine guards
//! instances with a reader-writer lock.

use std::cmp::Ordering;
use std::collections::VecDeque;

use chrono::{Duration, Utc};
use tracing::debug;

use mnemo_core::types::{cosine_similarity, Turn};

/// A turn paired with its similarity to a query embedding.
///
/// Similarity is 0.0 when no query was supplied or the turn carries no
/// embedding.
#[derive(Debug, Clone)]
pub struct ScoredTurn {
    pub turn: Turn,
    pub similarity: f32,
}

/// Bounded FIFO of recent conversation turns.
#[derive(Debug)]
pub struct ShortTermMemory {
    max_turns: usize,
    /// Time-to-live in seconds; 0 disables expiry.
    ttl_seconds: u64,
    turns: VecDeque<Turn>,
}

impl ShortTermMemory {
    /// Creates an empty short-term memory.
    pub fn new(max_turns: usize, ttl_seconds: u64) -> Self {
        Self {
            max_turns,
            ttl_seconds,
            turns: VecDeque::new(),
        }
    }

    /// Append a turn, evicting the oldest when over capacity.
    /// Returns the evicted turn, if any.
    pub fn add(&mut self, turn: Turn) -> Option<Turn> {
        self.turns.push_back(turn);
        if self.turns.len() > self.max_turns {
            let evicted = self.turns.pop_front();
            if let Some(t) = &evicted {
                debug!(id = t.id.as_str(), "short-term turn evicted");
            }
            evicted
        } else {
            None
        }
    }

    /// Get the most recent `n` turns.
    ///
    /// Without a query embedding, returns the last `n` turns in insertion
    /// order. With one, returns the top `n` turns by cosine similarity,
    /// ties broken by more recent `created_at`; turns without embeddings
    /// score 0 and only pad the result up to `n`.
    pub fn get_recent(&mut self, n: usize, query: Option<&[f32]>) -> Vec<ScoredTurn> {
        self.expire();

        match query {
            None => self
                .turns
                .iter()
                .rev()
                .take(n)
                .rev()
                .map(|t| ScoredTurn {
                    turn: t.clone(),
                    similarity: 0.0,
                })
                .collect(),
            Some(q) => {
                let mut scored = self.rank_by_similarity(q);
                scored.truncate(n);
                scored
            }
        }
    }

    /// Cosine search over live turns. Expired turns are skipped (and
    /// purged) before scoring.
    pub fn search_by_embedding(&mut self, query: &[f32], top_k: usize) -> Vec<ScoredTurn> {
        self.expire();
        let mut scored = self.rank_by_similarity(query);
        scored.truncate(top_k);
        scored
    }

    /// Score every live turn against the query. Embedded turns are
    /// ordered by similarity descending with recency tie-break; turns
    /// without embeddings trail in recency order with similarity 0.
    fn rank_by_similarity(&self, query: &[f32]) -> Vec<ScoredTurn> {
        let mut embedded: Vec<ScoredTurn> = Vec::new();
        let mut unembedded: Vec<ScoredTurn> = Vec::new();

        for turn in self.turns.iter().rev() {
            match &turn.embedding {
                Some(e) => embedded.push(ScoredTurn {
                    similarity: cosine_similarity(query, e),
                    turn: turn.clone(),
                }),
                None => unembedded.push(ScoredTurn {
                    similarity: 0.0,
                    turn: turn.clone(),
                }),
            }
        }

        // Input iteration is newest-first, so a stable sort by score
        // keeps the more recent turn ahead on ties.
        embedded.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        embedded.extend(unembedded);
        embedded
    }

    /// Purge turns older than the TTL. Called at entry of every read
    /// operation; a TTL of 0 disables expiry.
    pub fn expire(&mut self) {
        if self.ttl_seconds == 0 {
            return;
        }
        let cutoff = Utc::now() - Duration::seconds(self.ttl_seconds as i64);
        let before = self.turns.len();
        self.turns.retain(|t| t.created_at > cutoff);
        let purged = before - self.turns.len();
        if purged > 0 {
            debug!(purged, "expired short-term turns purged");
        }
    }

    /// Remove all turns.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of live turns (without triggering expiry).
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// All turns in insertion order, for snapshots and promotion.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// The most recent `n` turns in insertion order, cloned.
    pub fn tail(&self, n: usize) -> Vec<Turn> {
        self.turns.iter().rev().take(n).rev().cloned().collect()
    }

    /// Replace contents from a snapshot, preserving order.
    pub fn restore(&mut self, turns: Vec<Turn>) {
        self.turns = turns.into();
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::types::Role;

    fn turn(content: &str, embedding: Option<Vec<f32>>) -> Turn {
        let mut t = Turn::new(Role::User, content);
        t.embedding = embedding;
        t
    }

    fn axis(dim: usize, index: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[index] = 1.0;
        v
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut stm = ShortTermMemory::new(3, 0);
        for i in 0..4 {
            stm.add(turn(&format!("t{i}"), None));
        }
        assert_eq!(stm.len(), 3);
        let contents: Vec<&str> = stm.turns().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn add_returns_evicted_turn() {
        let mut stm = ShortTermMemory::new(1, 0);
        stm.add(turn("first", None));
        let evicted = stm.add(turn("second", None)).unwrap();
        assert_eq!(evicted.content, "first");
        assert_eq!(stm.len(), 1);
    }

    #[test]
    fn max_one_always_holds_latest() {
        let mut stm = ShortTermMemory::new(1, 0);
        for i in 0..5 {
            stm.add(turn(&format!("t{i}"), None));
        }
        let recent = stm.get_recent(5, None);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].turn.content, "t4");
    }

    #[test]
    fn get_recent_without_query_is_insertion_order() {
        let mut stm = ShortTermMemory::new(10, 0);
        for i in 0..5 {
            stm.add(turn(&format!("t{i}"), None));
        }
        let recent = stm.get_recent(3, None);
        let contents: Vec<&str> = recent.iter().map(|s| s.turn.content.as_str()).collect();
        assert_eq!(contents, vec!["t2", "t3", "t4"]);
    }

    #[test]
    fn get_recent_with_query_ranks_by_similarity() {
        let mut stm = ShortTermMemory::new(10, 0);
        for i in 0..5 {
            stm.add(turn(&format!("t{i}"), Some(axis(5, i))));
        }
        let results = stm.get_recent(5, Some(&axis(5, 2)));
        assert_eq!(results[0].turn.content, "t2");
        assert!(results[0].similarity > 0.99);
    }

    #[test]
    fn unembedded_turns_only_pad_the_tail() {
        let mut stm = ShortTermMemory::new(10, 0);
        stm.add(turn("plain", None));
        stm.add(turn("scored", Some(axis(2, 0))));

        let results = stm.get_recent(2, Some(&axis(2, 0)));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].turn.content, "scored");
        assert_eq!(results[1].turn.content, "plain");
        assert_eq!(results[1].similarity, 0.0);

        // With n = 1 the unembedded turn is not returned at all.
        let only = stm.get_recent(1, Some(&axis(2, 0)));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].turn.content, "scored");
    }

    #[test]
    fn similarity_ties_break_by_recency() {
        let mut stm = ShortTermMemory::new(10, 0);
        stm.add(turn("older", Some(axis(2, 0))));
        stm.add(turn("newer", Some(axis(2, 0))));

        let results = stm.search_by_embedding(&axis(2, 0), 2);
        assert_eq!(results[0].turn.content, "newer");
        assert_eq!(results[1].turn.content, "older");
    }

    #[test]
    fn ttl_zero_disables_expiry() {
        let mut stm = ShortTermMemory::new(10, 0);
        let mut old = turn("ancient", None);
        old.created_at = Utc::now() - Duration::hours(48);
        stm.add(old);
        assert_eq!(stm.get_recent(5, None).len(), 1);
    }

    #[test]
    fn expired_turns_are_purged_on_read() {
        let mut stm = ShortTermMemory::new(10, 60);
        let mut old = turn("stale", None);
        old.created_at = Utc::now() - Duration::seconds(120);
        stm.add(old);
        stm.add(turn("fresh", None));

        let recent = stm.get_recent(5, None);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].turn.content, "fresh");
        assert_eq!(stm.len(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let mut stm = ShortTermMemory::new(10, 0);
        stm.add(turn("a", None));
        stm.clear();
        assert!(stm.is_empty());
    }

    #[test]
    fn tail_returns_most_recent_in_order() {
        let mut stm = ShortTermMemory::new(10, 0);
        for i in 0..4 {
            stm.add(turn(&format!("t{i}"), None));
        }
        let tail = stm.tail(2);
        let contents: Vec<&str> = tail.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["t2", "t3"]);
    }

    #[test]
    fn restore_preserves_order_and_enforces_capacity() {
        let mut stm = ShortTermMemory::new(2, 0);
        stm.restore(vec![turn("a", None), turn("b", None), turn("c", None)]);
        let contents: Vec<&str> = stm.turns().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c"]);
    }
}
