//! Persistence of provider book lists.

use crate::clients::ProviderBook;
use crate::config::BookStatusPolicy;
use crate::constants::limits::MAX_AUTHOR_BOOKS;
use crate::db::{BookWrite, Store};
use crate::domain::AuthorId;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts from one book-list ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookCounts {
    pub added: usize,
    pub updated: usize,
    /// Authors that lost a book to this ingestion.
    pub previous_owners: BTreeSet<AuthorId>,
}

pub struct BookIngestor {
    store: Arc<Store>,
}

impl BookIngestor {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Stores `books` under `author_id` along with their series links.
    ///
    /// Books seen for the first time get statuses from `policy` unless the
    /// provider already knows one; books already stored keep theirs.
    pub async fn ingest(
        &self,
        author_id: &AuthorId,
        books: &[ProviderBook],
        policy: BookStatusPolicy,
    ) -> Result<BookCounts> {
        if books.len() > MAX_AUTHOR_BOOKS {
            warn!(
                author_id = %author_id,
                received = books.len(),
                kept = MAX_AUTHOR_BOOKS,
                "Truncating oversized book list"
            );
        }

        let mut counts = BookCounts::default();

        for book in books.iter().take(MAX_AUTHOR_BOOKS) {
            if book.title.trim().is_empty() {
                debug!(book_id = %book.book_id, "Skipping untitled book");
                continue;
            }

            let write = self
                .store
                .upsert_provider_book(author_id, book, policy)
                .await
                .with_context(|| format!("Failed to store book {}", book.book_id))?;

            match write {
                BookWrite::Added => counts.added += 1,
                BookWrite::Updated => counts.updated += 1,
                BookWrite::Reassigned(owner) => {
                    info!(book_id = %book.book_id, from = %owner, to = %author_id, "Book moved between authors");
                    counts.updated += 1;
                    counts.previous_owners.insert(owner);
                }
            }

            for series in &book.series {
                let series_id = series.series_id.as_deref().unwrap_or(&series.name);
                self.store.ensure_series(series_id, &series.name).await?;
                self.store
                    .add_series_member(series_id, &book.book_id, series.number.as_deref())
                    .await?;
                self.store.link_series_author(series_id, author_id).await?;
            }
        }

        info!(
            author_id = %author_id,
            added = counts.added,
            updated = counts.updated,
            "Stored author books"
        );
        Ok(counts)
    }
}
