//! Caller-facing catalog operations.
//!
//! Front ends (the CLI today) talk to [`LibraryImporter`] only; the ingestion
//! pipeline, resolver and aggregator behind it are implementation details.

use crate::clients::SearchHit;
use crate::domain::{AuthorId, BookId};
use crate::models::AuthorTotals;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by catalog operations.
///
/// Identity conflicts and aggregate inconsistencies are constructed for
/// logging and never returned from ingestion; callers of
/// [`LibraryImporter::add_author_by_id`] get a message instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider unavailable: {provider} - {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Identity conflict for {author_id}: stored '{stored}', provider '{incoming}'")]
    IdentityConflict {
        author_id: AuthorId,
        stored: String,
        incoming: String,
    },

    #[error("Aggregate inconsistency: {0}")]
    AggregateInconsistency(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ImportError {
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for ImportError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ImportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Result of a by-name author request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameResolution {
    pub author_name: String,
    pub author_id: AuthorId,
    /// True when this call created the author.
    pub new: bool,
}

/// Catalog operations exposed to front ends.
#[async_trait::async_trait]
pub trait LibraryImporter: Send + Sync {
    /// Finds or creates the author behind a free-text name.
    ///
    /// Returns `None` when the name is too short, the provider has no
    /// acceptable match, or adding authors is disabled. With `refresh` an
    /// author already in the catalog is re-ingested.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Database`] when the catalog cannot be read.
    async fn add_author_by_name(
        &self,
        name: &str,
        refresh: bool,
        add_books: bool,
    ) -> Result<Option<NameResolution>, ImportError>;

    /// Ingests an author by provider id and returns a human-readable result.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidInput`] for an empty id. Ingestion
    /// failures are reported in the message, not as errors.
    async fn add_author_by_id(
        &self,
        author_id: &AuthorId,
        refresh: bool,
        add_books: bool,
    ) -> Result<String, ImportError>;

    /// Adds a single book as `Wanted`, adding its author metadata-only if needed.
    ///
    /// With `wait == false` the work runs on a detached task and the returned
    /// message only acknowledges the request.
    ///
    /// # Errors
    ///
    /// - Returns [`ImportError::ProviderUnavailable`] when the provider cannot be reached
    /// - Returns [`ImportError::Database`] on store failures
    async fn import_book(&self, book_id: &BookId, wait: bool) -> Result<String, ImportError>;

    /// Provider search ranked by relevance then reviews, flagged with catalog membership.
    ///
    /// # Errors
    ///
    /// - Returns [`ImportError::InvalidInput`] for a blank term
    /// - Returns [`ImportError::ProviderUnavailable`] when the provider cannot be reached
    async fn search_catalog(&self, term: &str) -> Result<Vec<SearchHit>, ImportError>;

    /// Recomputes stored aggregates for one author.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Database`] on store failures.
    async fn recompute_totals(
        &self,
        author_id: &AuthorId,
    ) -> Result<Option<AuthorTotals>, ImportError>;
}

/// Orders search hits by relevance, then reviews, both descending.
///
/// The sort is stable so provider order breaks remaining ties.
///
/// ```
/// # use bookarr::services::importer::rank_hits;
/// # use bookarr::clients::SearchHit;
/// # use bookarr::domain::{AuthorId, BookId};
/// let hit = |id: &str, relevance, reviews| SearchHit {
///     book_id: BookId::from(id),
///     book_name: id.to_string(),
///     author_id: AuthorId::from("A1"),
///     author_name: "Someone".to_string(),
///     book_date: None,
///     image: None,
///     relevance,
///     reviews,
///     in_catalog: false,
/// };
/// let mut hits = vec![hit("a", 80, 5), hit("b", 95, 1), hit("c", 80, 50)];
/// rank_hits(&mut hits);
/// let order: Vec<_> = hits.iter().map(|h| h.book_id.as_str()).collect();
/// assert_eq!(order, ["b", "c", "a"]);
/// ```
pub fn rank_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.relevance
            .cmp(&a.relevance)
            .then_with(|| b.reviews.cmp(&a.reviews))
    });
}
