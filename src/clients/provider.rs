//! Contract shared by the bibliographic metadata providers.
//!
//! Provider calls never raise: every answer is a [`Lookup`] so that the
//! ingestion pipeline branches on "found", "nothing there" and "could not ask"
//! explicitly. The pipeline treats the last two the same way, but keeps the
//! transport detail for logging.

use crate::domain::{AuthorId, BookId, BookStatus};
use serde::{Deserialize, Serialize};

/// Outcome of a single provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    TransportError(String),
}

impl<T> Lookup<T> {
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::TransportError(_) => None,
        }
    }
}

impl<T> From<anyhow::Result<Option<T>>> for Lookup<T> {
    fn from(result: anyhow::Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::NotFound,
            Err(e) => Self::TransportError(format!("{e:#}")),
        }
    }
}

/// Author record as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAuthor {
    pub author_id: AuthorId,
    pub author_name: String,
    pub author_link: Option<String>,
    pub author_img: Option<String>,
    pub author_born: Option<String>,
    pub author_death: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSeries {
    /// Provider series id; series without one are keyed by name.
    pub series_id: Option<String>,
    pub name: String,
    pub number: Option<String>,
}

/// Book record as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBook {
    pub book_id: BookId,
    pub author_id: AuthorId,
    pub author_name: String,
    pub title: String,
    pub link: Option<String>,
    pub date: Option<String>,
    pub isbn: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub series: Vec<ProviderSeries>,
    /// Status already established upstream (e.g. the book is known to be in
    /// the user's library). Overrides the status policy for new books.
    #[serde(default)]
    pub known_status: Option<BookStatus>,
    #[serde(default)]
    pub known_audio_status: Option<BookStatus>,
}

/// One candidate returned by a free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub book_id: BookId,
    pub book_name: String,
    pub author_id: AuthorId,
    pub author_name: String,
    pub book_date: Option<String>,
    pub image: Option<String>,
    /// 0..=100, how well the hit matches the search term.
    pub relevance: u8,
    pub reviews: u32,
    #[serde(default)]
    pub in_catalog: bool,
}

/// A bibliographic metadata source.
///
/// Implementations are interchangeable; the rest of the crate only sees this
/// trait.
#[async_trait::async_trait]
pub trait BookProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Best author match for a free-text name.
    async fn find_author(&self, query: &str) -> Lookup<ProviderAuthor>;

    async fn author_info(&self, author_id: &AuthorId) -> Lookup<ProviderAuthor>;

    async fn author_books(&self, author_id: &AuthorId, author_name: &str)
    -> Lookup<Vec<ProviderBook>>;

    async fn find_book(&self, book_id: &BookId) -> Lookup<ProviderBook>;

    async fn search(&self, term: &str) -> Lookup<Vec<SearchHit>>;

    /// Secondary image lookup for authors whose primary record has no photo.
    async fn author_image(&self, _author_id: &AuthorId) -> Lookup<String> {
        Lookup::NotFound
    }

    /// Marks the author as followed upstream and returns the follow token.
    async fn follow_author(&self, _author_id: &AuthorId) -> Lookup<String> {
        Lookup::NotFound
    }
}
