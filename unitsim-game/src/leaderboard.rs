//! Leaderboard boundary: entry model, gateway trait, and a process-local board.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use thiserror::Error;

use crate::constants::NICKNAME_MAX_LEN;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u64,
    pub nickname: String,
    pub net_profit: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("nickname must be 1 to {max} characters after trimming")]
    InvalidNickname { max: usize },
    #[error("net profit must be finite")]
    InvalidScore,
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
}

/// Remote or local score storage.
///
/// Implementations return entries sorted by descending net profit. Callers
/// treat every error as non-fatal.
pub trait LeaderboardGateway {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch up to `limit` best entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be reached.
    fn fetch_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, Self::Error>;

    /// Record a finished game's net profit.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is rejected or the board cannot be
    /// reached.
    fn submit(&self, nickname: &str, net_profit: f64) -> Result<LeaderboardEntry, Self::Error>;
}

/// Trim and bound a nickname, or `None` when it cannot be submitted.
#[must_use]
pub fn normalize_nickname(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    (1..=NICKNAME_MAX_LEN)
        .contains(&len)
        .then(|| trimmed.to_string())
}

/// Whether `net_profit` earns a place on a board showing `limit` rows.
///
/// True when fewer than `limit` entries are listed or the score beats the
/// lowest listed entry.
#[must_use]
pub fn qualifies_for_board(net_profit: f64, entries: &[LeaderboardEntry], limit: usize) -> bool {
    if !net_profit.is_finite() || limit == 0 {
        return false;
    }
    if entries.len() < limit {
        return true;
    }
    entries
        .iter()
        .take(limit)
        .map(|entry| entry.net_profit)
        .fold(f64::INFINITY, f64::min)
        < net_profit
}

/// In-memory gateway for tests, offline play, and the tester binary.
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    entries: RefCell<Vec<LeaderboardEntry>>,
    offline: bool,
}

impl MemoryLeaderboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A board whose every call fails, for exercising failure handling.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            entries: RefCell::default(),
            offline: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn ensure_online(&self) -> Result<(), LeaderboardError> {
        if self.offline {
            return Err(LeaderboardError::Unavailable("offline".to_string()));
        }
        Ok(())
    }
}

impl LeaderboardGateway for MemoryLeaderboard {
    type Error = LeaderboardError;

    fn fetch_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, Self::Error> {
        self.ensure_online()?;
        let mut entries = self.entries.borrow().clone();
        entries.sort_by(|a, b| b.net_profit.total_cmp(&a.net_profit));
        entries.truncate(limit);
        Ok(entries)
    }

    fn submit(&self, nickname: &str, net_profit: f64) -> Result<LeaderboardEntry, Self::Error> {
        self.ensure_online()?;
        let nickname = normalize_nickname(nickname).ok_or(LeaderboardError::InvalidNickname {
            max: NICKNAME_MAX_LEN,
        })?;
        if !net_profit.is_finite() {
            return Err(LeaderboardError::InvalidScore);
        }
        let mut entries = self.entries.borrow_mut();
        let entry = LeaderboardEntry {
            id: u64::try_from(entries.len()).unwrap_or(u64::MAX).saturating_add(1),
            nickname,
            net_profit,
            timestamp: Utc::now(),
        };
        entries.push(entry.clone());
        Ok(entry)
    }
}
