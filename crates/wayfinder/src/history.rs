//! Recent-search and favorite records built from a selected candidate.
//!
//! Persistence belongs to the host; this only shapes the records and keeps the
//! recents list bounded.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use wayfinder_sources::LngLat;

use crate::candidate::{Candidate, SourceKind};

/// Number of recent searches kept.
pub const RECENT_SEARCHES_CAPACITY: usize = 5;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RecentSearch {
    /// Id of the candidate it was made from
    pub id: String,
    pub display_name: String,
    pub secondary_text: Option<String>,
    pub coordinates: Option<LngLat>,
    pub source_kind: SourceKind,
    pub category: Option<String>,
    pub searched_at: DateTime<Utc>,
}

impl RecentSearch {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self::from_candidate_at(candidate, Utc::now())
    }

    pub fn from_candidate_at(candidate: &Candidate, searched_at: DateTime<Utc>) -> Self {
        Self {
            id: candidate.id.clone(),
            display_name: candidate.display_name.clone(),
            secondary_text: candidate.secondary_text.clone(),
            coordinates: candidate.best_known_position(),
            source_kind: candidate.source_kind,
            category: candidate.category.clone(),
            searched_at,
        }
    }
}

/// Most recent first, at most [`RECENT_SEARCHES_CAPACITY`] entries, one per id.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecentSearches {
    entries: VecDeque<RecentSearch>,
}

impl RecentSearches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `search` to the front, replacing an older entry with the same id.
    pub fn record(&mut self, search: RecentSearch) {
        self.entries.retain(|e| e.id != search.id);
        self.entries.push_front(search);
        self.entries.truncate(RECENT_SEARCHES_CAPACITY);
    }

    pub fn remove(&mut self, id: &str) -> Option<RecentSearch> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecentSearch> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A saved place. Requires a position.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Favorite {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub coordinates: LngLat,
    pub category: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl Favorite {
    /// `None` for candidates with no known position (and for the category entry).
    pub fn from_candidate(candidate: &Candidate) -> Option<Self> {
        if candidate.is_synthetic() {
            return None;
        }
        Some(Self {
            id: candidate.id.clone(),
            name: candidate.display_name.clone(),
            address: candidate.secondary_text.clone(),
            coordinates: candidate.best_known_position()?,
            category: candidate.category.clone(),
            saved_at: Utc::now(),
        })
    }
}
