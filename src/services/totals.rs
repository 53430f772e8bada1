//! Derived per-author and per-series counts.
//!
//! Every recompute reads the book table from scratch, so running it again
//! after a crash or a partial ingestion repairs the stored numbers.

use crate::db::Store;
use crate::domain::{AuthorId, BookStatus};
use crate::models::{AuthorTotals, Book, LastBook};
use crate::services::importer::ImportError;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TotalsAggregator {
    store: Arc<Store>,
}

impl TotalsAggregator {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Recomputes and stores the author's aggregates and those of every
    /// series the author touches.
    ///
    /// Returns `None` when the author no longer exists.
    pub async fn recompute(&self, author_id: &AuthorId) -> Result<Option<AuthorTotals>, ImportError> {
        if !self.store.author_exists(author_id).await? {
            let err = ImportError::AggregateInconsistency(format!(
                "author {author_id} vanished before totals could be written"
            ));
            warn!(error = %err, "Skipping totals");
            return Ok(None);
        }

        let books = self.store.list_books_for_author(author_id).await?;
        let (totals, last_book) = author_totals(&books);
        self.store
            .set_author_totals(author_id, totals, last_book.as_ref())
            .await?;

        for series_id in self.store.series_ids_for_author(author_id).await? {
            let members = self.store.series_member_books(&series_id).await?;
            let (have, total) = series_counts(&members);
            self.store.set_series_totals(&series_id, have, total).await?;
        }

        debug!(
            author_id = %author_id,
            total = totals.total,
            unignored = totals.unignored,
            have = totals.have,
            "Author totals updated"
        );
        Ok(Some(totals))
    }
}

fn is_ignored(book: &Book) -> bool {
    book.status == BookStatus::Ignored.as_str()
}

/// A book counts as held once, whether the ebook or the audiobook is owned.
fn is_held(book: &Book) -> bool {
    BookStatus::owned_str(&book.status) || BookStatus::owned_str(&book.audio_status)
}

/// Newest dated book first; equal dates fall back to the smaller id.
fn newer(a: &Book, b: &Book) -> Ordering {
    a.date.cmp(&b.date).then_with(|| b.id.cmp(&a.id))
}

/// Author counts and most recent non-ignored book.
#[must_use]
pub fn author_totals(books: &[Book]) -> (AuthorTotals, Option<LastBook>) {
    let totals = AuthorTotals {
        total: count(books.len()),
        unignored: count(books.iter().filter(|b| !is_ignored(b)).count()),
        have: count(books.iter().filter(|b| is_held(b)).count()),
    };

    let last_book = books
        .iter()
        .filter(|b| !is_ignored(b))
        .max_by(|a, b| newer(a, b))
        .map(|b| LastBook {
            book_id: b.id.to_string(),
            name: b.name.clone(),
            link: b.link.clone(),
            date: b.date.clone(),
        });

    (totals, last_book)
}

/// `(have, total)` for a series; ignored members are left out of `total`.
#[must_use]
pub fn series_counts(members: &[Book]) -> (i32, i32) {
    let have = count(members.iter().filter(|b| is_held(b)).count());
    let total = count(members.iter().filter(|b| !is_ignored(b)).count());
    (have, total)
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
