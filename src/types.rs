use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::FetchError;

/// MyAnimeList genre id
pub type GenreId = u32;

/// Active genre filter. Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSet(BTreeSet<GenreId>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: GenreId) -> bool {
        self.0.contains(&id)
    }

    /// Add the id if absent, remove it otherwise.
    pub fn toggle(&mut self, id: GenreId) {
        if !self.0.remove(&id) {
            self.0.insert(id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = GenreId> + '_ {
        self.0.iter().copied()
    }

    /// Comma-joined ids in ascending order, or None for "no filter".
    pub fn to_query(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let ids: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        Some(ids.join(","))
    }

    /// Parse a comma-separated id list such as `1,4, 10`.
    pub fn parse(s: &str) -> Result<Self, String> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<GenreId>()
                    .map_err(|_| format!("invalid genre id '{}'", part))
            })
            .collect()
    }
}

impl FromIterator<GenreId> for FilterSet {
    fn from_iter<I: IntoIterator<Item = GenreId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_query() {
            Some(q) => write!(f, "[{}]", q),
            None => write!(f, "[]"),
        }
    }
}

/// 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Page(u32);

impl Page {
    pub const FIRST: Page = Page(1);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Page(self.0.saturating_add(1))
    }

    /// Never goes below the first page.
    pub fn prev(self) -> Self {
        Page(self.0.saturating_sub(1).max(1))
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::FIRST
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    pub count: Option<u32>,
}

/// A catalog entry. Identity is by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Anime {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub age_rating: Option<String>,
    pub score: Option<f32>,
    pub rank: Option<u32>,
    pub status: String,
    pub episodes: Option<u32>,
    pub genres: Vec<Genre>,
    pub aired_from: Option<DateTime<Utc>>,
}

/// One page of results plus the server's continuation flag
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Idle => write!(f, "Idle"),
            FetchState::Loading => write!(f, "Loading"),
        }
    }
}

/// Identifies the request a fetch was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: Page,
    pub filters: FilterSet,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<PagedResult<Anime>, FetchError>,
}
