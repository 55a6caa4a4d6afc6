//! In-memory movie store and its adapter as the bulk ingestion sink.
//!
//! The store re-checks every record against the movie schema before storing
//! it, including records arriving through the ingestion queue. `insert_many`
//! is unordered: valid records are kept even when others in the same call
//! are rejected, and the call then reports an error for the rejected ones.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use cinedb_core::{CineError, Movie, MovieId, MoviePatch, NewMovie};
use cinedb_queue::{BatchSink, QueueError};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

// ── Query shapes ──────────────────────────────────────────────

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Parse loosely: missing, non-numeric or zero values fall back to defaults.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |v: Option<&str>, default: usize| {
            v.and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };
        Self {
            page: parse(page, DEFAULT_PAGE),
            limit: parse(limit, DEFAULT_LIMIT),
        }
    }

    fn skip(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit.max(1))
    }
}

/// One page of results plus the totals needed for pagination controls.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Rating,
    ReleaseDate,
    Duration,
    CreatedAt,
}

impl SortField {
    /// Unknown or missing fields sort by creation time.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("title") => SortField::Title,
            Some("rating") => SortField::Rating,
            Some("releaseDate") => SortField::ReleaseDate,
            Some("duration") => SortField::Duration,
            _ => SortField::CreatedAt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Rating => "rating",
            SortField::ReleaseDate => "releaseDate",
            SortField::Duration => "duration",
            SortField::CreatedAt => "createdAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `asc` is descending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

// ── Store ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MovieStore {
    movies: RwLock<HashMap<MovieId, Movie>>,
}

impl MovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<MovieId, Movie>> {
        self.movies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<MovieId, Movie>> {
        self.movies.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Validate and store a single movie.
    pub fn insert(&self, new: &NewMovie, added_by: &str) -> Result<Movie, CineError> {
        let movie = Movie::new(new.validate()?, added_by);
        self.write().insert(movie.id, movie.clone());
        Ok(movie)
    }

    /// Store every record that passes the schema check.
    ///
    /// Returns the number stored, or an error naming how many were rejected
    /// once the valid ones are in.
    pub fn insert_many(&self, movies: Vec<Movie>) -> Result<usize, CineError> {
        let total = movies.len();
        let mut rejected: Vec<String> = Vec::new();
        let mut inserted = 0;

        {
            let mut map = self.write();
            for movie in movies {
                let violations = movie.fields.violations();
                if !violations.is_empty() {
                    rejected.push(format!("{}: {}", movie.fields.title, violations.join(", ")));
                    continue;
                }
                if map.contains_key(&movie.id) {
                    rejected.push(format!("{}: duplicate id {}", movie.fields.title, movie.id));
                    continue;
                }
                map.insert(movie.id, movie);
                inserted += 1;
            }
        }

        debug!(inserted, rejected = rejected.len(), "insert_many");

        if rejected.is_empty() {
            Ok(inserted)
        } else {
            Err(CineError::Storage(format!(
                "{} of {} movies rejected ({})",
                rejected.len(),
                total,
                rejected.join("; ")
            )))
        }
    }

    pub fn get(&self, id: &MovieId) -> Result<Movie, CineError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| CineError::NotFound("Movie".to_string()))
    }

    /// Apply a partial update, keeping id, author and creation time.
    pub fn update(&self, id: &MovieId, patch: &MoviePatch) -> Result<Movie, CineError> {
        let mut map = self.write();
        let movie = map
            .get_mut(id)
            .ok_or_else(|| CineError::NotFound("Movie".to_string()))?;
        movie.fields = patch.apply(&movie.fields)?;
        movie.updated_at = Utc::now();
        Ok(movie.clone())
    }

    pub fn delete(&self, id: &MovieId) -> Result<(), CineError> {
        self.write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CineError::NotFound("Movie".to_string()))
    }

    /// Newest first.
    pub fn list(&self, page: PageRequest) -> Page<Movie> {
        self.sorted(SortField::CreatedAt, SortOrder::Desc, page)
    }

    pub fn sorted(&self, field: SortField, order: SortOrder, page: PageRequest) -> Page<Movie> {
        let mut movies: Vec<Movie> = self.read().values().cloned().collect();
        movies.sort_by(|a, b| {
            let ord = compare_by(a, b, field);
            let ord = match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        paginate(movies, page)
    }

    /// Term search over title and description, ranked by matching terms.
    pub fn search(&self, query: &str, page: PageRequest) -> Result<Page<Movie>, CineError> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() {
            return Err(CineError::Validation(
                "Search query parameter \"q\" is required".to_string(),
            ));
        }

        let mut scored: Vec<(usize, Movie)> = self
            .read()
            .values()
            .filter_map(|movie| {
                let haystack = format!(
                    "{} {}",
                    movie.fields.title.to_lowercase(),
                    movie.fields.description.to_lowercase()
                );
                let score = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (score > 0).then(|| (score, movie.clone()))
            })
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(paginate(scored.into_iter().map(|(_, m)| m).collect(), page))
    }
}

fn compare_by(a: &Movie, b: &Movie, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.fields.title.to_lowercase().cmp(&b.fields.title.to_lowercase()),
        SortField::Rating => a
            .fields
            .rating
            .partial_cmp(&b.fields.rating)
            .unwrap_or(Ordering::Equal),
        SortField::ReleaseDate => a.fields.release_date.cmp(&b.fields.release_date),
        SortField::Duration => a.fields.duration.cmp(&b.fields.duration),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len();
    let limit = page.limit.max(1);
    let total_pages = total.div_ceil(limit);
    let items = items.into_iter().skip(page.skip()).take(limit).collect();
    Page {
        items,
        total,
        page: page.page,
        total_pages,
    }
}

// ── Sink adapter ──────────────────────────────────────────────

/// Feeds ingestion batches into a [`MovieStore`].
pub struct MovieSink {
    store: Arc<MovieStore>,
}

impl MovieSink {
    pub fn new(store: Arc<MovieStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchSink<Movie> for MovieSink {
    async fn write_batch(&self, batch: &[Movie]) -> Result<(), QueueError> {
        match self.store.insert_many(batch.to_vec()) {
            Ok(inserted) => {
                debug!(inserted, "bulk batch stored");
                Ok(())
            }
            Err(e) => {
                warn!(batch_size = batch.len(), error = %e, "bulk batch partially rejected");
                Err(QueueError::sink(e))
            }
        }
    }

    fn name(&self) -> &str {
        "movies"
    }
}
