//! Run records
//!
//! Top finished rounds for the lifetime of one engine. The host decides
//! whether to persist them; the table serializes to JSON for that.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

/// Maximum number of rounds to keep
pub const MAX_RECORDS: usize = 10;

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Player stopped and kept the score
    Banked,
    /// A challenge failed and the score was lost
    Lost,
}

/// A single finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Score banked, or the score that was at stake when lost
    pub score: u64,
    pub outcome: RoundOutcome,
    /// Difficulty reached when the round ended
    pub difficulty: u32,
    /// Engine clock reading (ms) when the round ended
    pub timestamp_ms: u64,
}

/// Finished rounds, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunRecords {
    pub entries: Vec<RoundRecord>,
}

impl RunRecords {
    /// Empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a finished round; returns its 1-indexed rank, or None if it
    /// fell off the table
    ///
    /// Zero scores are never kept. A score ties below every equal entry, so
    /// equal scores keep arrival order.
    pub fn add_round(
        &mut self,
        score: u64,
        outcome: RoundOutcome,
        difficulty: u32,
        timestamp_ms: u64,
    ) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let index = self.entries.partition_point(|e| e.score >= score);
        if index >= MAX_RECORDS {
            return None;
        }
        self.entries.insert(
            index,
            RoundRecord {
                score,
                outcome,
                difficulty,
                timestamp_ms,
            },
        );
        self.entries.truncate(MAX_RECORDS);
        Some(index + 1)
    }

    /// True until the first round with a non-zero score finishes
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest score on the table, banked or lost
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Best score that was actually kept (ignores lost rounds)
    pub fn top_banked(&self) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.outcome == RoundOutcome::Banked)
            .map(|e| e.score)
    }

    /// Compact JSON for the host to store
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Restore a table produced by [`RunRecords::to_json`], re-sorting and trimming it
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut records: RunRecords = serde_json::from_str(json)?;
        records.entries.retain(|e| e.score > 0);
        records.entries.sort_by_key(|e| Reverse(e.score));
        records.entries.truncate(MAX_RECORDS);
        log::info!("Loaded {} round records", records.entries.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_recorded() {
        let mut records = RunRecords::new();
        assert_eq!(records.add_round(0, RoundOutcome::Lost, 1, 0), None);
        assert!(records.is_empty());
    }

    #[test]
    fn test_sorted_descending() {
        let mut records = RunRecords::new();
        assert_eq!(records.add_round(4, RoundOutcome::Banked, 3, 10), Some(1));
        assert_eq!(records.add_round(16, RoundOutcome::Lost, 5, 20), Some(1));
        assert_eq!(records.add_round(8, RoundOutcome::Banked, 4, 30), Some(2));
        assert_eq!(records.add_round(8, RoundOutcome::Banked, 4, 40), Some(3));

        let scores: Vec<u64> = records.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![16, 8, 8, 4]);
        assert_eq!(records.entries[1].timestamp_ms, 30);
        assert_eq!(records.top_score(), Some(16));
        assert_eq!(records.top_banked(), Some(8));
    }

    #[test]
    fn test_full_table_rejects_low_scores() {
        let mut records = RunRecords::new();
        for i in 0..MAX_RECORDS as u64 {
            records.add_round(2 + i, RoundOutcome::Banked, 1, i);
        }
        assert_eq!(records.entries.len(), MAX_RECORDS);
        // Ties with the last entry rank below it and fall off
        assert_eq!(records.add_round(2, RoundOutcome::Banked, 1, 50), None);
        assert_eq!(records.add_round(1, RoundOutcome::Lost, 1, 51), None);
        assert_eq!(records.entries.len(), MAX_RECORDS);

        assert_eq!(records.add_round(100, RoundOutcome::Banked, 9, 99), Some(1));
        assert_eq!(records.entries.len(), MAX_RECORDS);
        assert_eq!(records.entries.last().map(|e| e.score), Some(3));
    }

    #[test]
    fn test_from_json_normalizes() {
        let json = r#"{"entries":[
            {"score":2,"outcome":"Banked","difficulty":2,"timestamp_ms":1},
            {"score":32,"outcome":"Lost","difficulty":6,"timestamp_ms":2}
        ]}"#;
        let records = RunRecords::from_json(json).unwrap();
        assert_eq!(records.top_score(), Some(32));
        assert_eq!(records.top_banked(), Some(2));
    }

    #[test]
    fn test_from_json_drops_zero_and_keeps_tie_order() {
        let json = r#"{"entries":[
            {"score":0,"outcome":"Lost","difficulty":1,"timestamp_ms":1},
            {"score":4,"outcome":"Banked","difficulty":3,"timestamp_ms":2},
            {"score":8,"outcome":"Lost","difficulty":4,"timestamp_ms":3},
            {"score":4,"outcome":"Lost","difficulty":3,"timestamp_ms":4}
        ]}"#;
        let records = RunRecords::from_json(json).unwrap();
        let stamps: Vec<u64> = records.entries.iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(stamps, vec![3, 2, 4]);
    }
}
