//! Per-author ingestion: placeholder, provider lookup, merge, books, totals.
//!
//! A run moves the author row through
//! `Absent -> Loading -> Merging -> Active | Wanted | Ignored | Paused`.
//! The `Loading` marker is written before any provider call so concurrent
//! runs for the same id converge on one row. Errors never escape
//! [`AuthorIngestionPipeline::ingest`]: they are logged under the run's
//! correlation id and reported as [`IngestOutcome::Failed`].

use crate::clients::{BookProvider, Lookup, ProviderAuthor};
use crate::config::ImportPolicy;
use crate::constants::placeholder;
use crate::db::Store;
use crate::domain::{AuthorId, AuthorStatus};
use crate::matching::collapse_whitespace;
use crate::models::Author;
use crate::services::books::{BookCounts, BookIngestor};
use crate::services::identity::IdentityResolver;
use crate::services::image::{ImageCache, ImageKind};
use crate::services::importer::ImportError;
use crate::services::merge::{is_placeholder_image, merge};
use crate::services::totals::TotalsAggregator;
use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// What the caller knows about the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestRequest {
    ById(AuthorId),
    ByName(String),
}

impl fmt::Display for IngestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "id:{id}"),
            Self::ByName(name) => write!(f, "name:{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Re-download cached images.
    pub refresh: bool,
    /// Fetch and store the author's books; without it the author ends `Ignored`.
    pub add_books: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub author_id: AuthorId,
    pub author_name: String,
    pub status: AuthorStatus,
    pub new_author: bool,
    pub books: BookCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Completed(IngestReport),
    NotFound,
    Failed(String),
}

/// Lifecycle position of the row being ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IngestState {
    Absent,
    Loading,
    Merging,
    Settled(AuthorStatus),
}

/// Tracks the row a run holds in `Loading` so the boundary can settle it.
struct Progress {
    state: IngestState,
    author_id: Option<AuthorId>,
    add_books: bool,
}

impl Progress {
    const fn new(add_books: bool) -> Self {
        Self {
            state: IngestState::Absent,
            author_id: None,
            add_books,
        }
    }

    fn advance(&mut self, author_id: &AuthorId, next: IngestState) {
        debug!(author_id = %author_id, from = ?self.state, to = ?next, "Ingestion state");
        self.state = next;
        self.author_id = match next {
            IngestState::Absent | IngestState::Settled(_) => None,
            IngestState::Loading | IngestState::Merging => Some(author_id.clone()),
        };
    }
}

/// What was stored for the author before this run touched it.
struct Prior {
    author: Option<Author>,
    /// Created by this run, or still an untouched placeholder.
    new_author: bool,
}

pub struct AuthorIngestionPipeline {
    store: Arc<Store>,
    provider: Arc<dyn BookProvider>,
    images: Arc<dyn ImageCache>,
    books: BookIngestor,
    totals: TotalsAggregator,
    policy: ImportPolicy,
}

impl AuthorIngestionPipeline {
    #[must_use]
    pub fn new(
        store: Arc<Store>,
        provider: Arc<dyn BookProvider>,
        images: Arc<dyn ImageCache>,
        policy: ImportPolicy,
    ) -> Self {
        Self {
            books: BookIngestor::new(store.clone()),
            totals: TotalsAggregator::new(store.clone()),
            store,
            provider,
            images,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &ImportPolicy {
        &self.policy
    }

    /// Runs one ingestion inside a span carrying a fresh correlation id.
    pub async fn ingest(&self, request: IngestRequest, options: IngestOptions) -> IngestOutcome {
        let correlation_id = Uuid::new_v4();
        let span = info_span!(
            "ingest",
            %correlation_id,
            request = %request,
            provider = self.provider.name()
        );

        async move {
            let mut progress = Progress::new(options.add_books);
            let result = match &request {
                IngestRequest::ById(id) => self.ingest_by_id(id, options, &mut progress).await,
                IngestRequest::ByName(name) => {
                    self.ingest_by_name(name, options, &mut progress).await
                }
            };

            match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = ?e, "Author ingestion failed");
                    self.settle_after_error(&progress).await;
                    IngestOutcome::Failed(format!("Failed to ingest {request}: {e}"))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn ingest_by_id(
        &self,
        author_id: &AuthorId,
        options: IngestOptions,
        progress: &mut Progress,
    ) -> Result<IngestOutcome> {
        let existing = self.store.get_author(author_id).await?;
        let prior = Prior {
            new_author: existing.as_ref().is_none_or(Author::is_placeholder),
            author: existing,
        };

        self.store
            .mark_author_loading(author_id, placeholder::AUTHOR_NAME)
            .await?;
        progress.advance(author_id, IngestState::Loading);

        let incoming = match self.provider.author_info(author_id).await {
            Lookup::Found(author) => author,
            missing => {
                self.abandon(author_id, &prior, &missing).await?;
                progress.advance(author_id, IngestState::Absent);
                return Ok(IngestOutcome::NotFound);
            }
        };

        self.complete(author_id, prior, &incoming, options, progress)
            .await
    }

    async fn ingest_by_name(
        &self,
        raw_name: &str,
        options: IngestOptions,
        progress: &mut Progress,
    ) -> Result<IngestOutcome> {
        let name = collapse_whitespace(raw_name);

        let existing = self.store.find_author_by_name(&name).await?;
        let placeholder_id = match &existing {
            Some(author) => author.id.clone(),
            None => AuthorId::unresolved(&name),
        };
        let prior = Prior {
            new_author: existing.as_ref().is_none_or(Author::is_placeholder),
            author: existing,
        };

        self.store.mark_author_loading(&placeholder_id, &name).await?;
        progress.advance(&placeholder_id, IngestState::Loading);

        let incoming = match self.provider.find_author(&name).await {
            Lookup::Found(author) => author,
            missing => {
                self.abandon(&placeholder_id, &prior, &missing).await?;
                progress.advance(&placeholder_id, IngestState::Absent);
                return Ok(IngestOutcome::NotFound);
            }
        };

        if !IdentityResolver::resolve_provider_identity(&name, &incoming).is_accept() {
            self.abandon(&placeholder_id, &prior, &Lookup::<()>::NotFound)
                .await?;
            progress.advance(&placeholder_id, IngestState::Absent);
            return Ok(IngestOutcome::NotFound);
        }

        let canonical = incoming.author_id.clone();
        let mut prior = prior;
        if placeholder_id != canonical {
            if let Some(stored) = self.store.get_author(&canonical).await? {
                // Provider id already in the catalog under its own row.
                prior.new_author = prior.new_author && stored.is_placeholder();
                prior.author = Some(stored);
            }
            self.store.rekey_author(&placeholder_id, &canonical).await?;
            self.store.mark_author_loading(&canonical, &name).await?;
            progress.advance(&canonical, IngestState::Loading);
        }

        self.complete(&canonical, prior, &incoming, options, progress)
            .await
    }

    /// Undoes the `Loading` marker after the provider had nothing usable.
    async fn abandon<T>(&self, author_id: &AuthorId, prior: &Prior, lookup: &Lookup<T>) -> Result<()> {
        match lookup {
            Lookup::TransportError(detail) => {
                warn!(author_id = %author_id, detail = %detail, "Provider unavailable");
            }
            Lookup::NotFound | Lookup::Found(_) => {
                info!(author_id = %author_id, "Provider has no matching author");
            }
        }

        match &prior.author {
            Some(author) if !prior.new_author => {
                self.store
                    .restore_author_status(author_id, &author.status)
                    .await?;
            }
            _ => {
                self.store.remove_author(author_id).await?;
            }
        }
        Ok(())
    }

    async fn complete(
        &self,
        author_id: &AuthorId,
        prior: Prior,
        incoming: &ProviderAuthor,
        options: IngestOptions,
        progress: &mut Progress,
    ) -> Result<IngestOutcome> {
        progress.advance(author_id, IngestState::Merging);

        let merge_base = if prior.new_author {
            None
        } else {
            prior.author.as_ref()
        };

        if let Some(stored) = merge_base.filter(|a| a.name != incoming.author_name) {
            let conflict = ImportError::IdentityConflict {
                author_id: author_id.clone(),
                stored: stored.name.clone(),
                incoming: incoming.author_name.clone(),
            };
            info!(error = %conflict, "Keeping stored author name");
        }

        let changes = merge(merge_base, incoming, chrono::Local::now().date_naive());
        self.store.apply_author_changes(author_id, &changes).await?;

        self.refresh_image(author_id, incoming, options.refresh)
            .await?;

        let books = if options.add_books {
            self.ingest_books(author_id, incoming, prior.new_author)
                .await?
        } else {
            BookCounts::default()
        };

        self.totals.recompute(author_id).await?;
        for owner in &books.previous_owners {
            self.totals.recompute(owner).await?;
        }

        if prior.new_author && self.policy.follow_new_authors {
            self.follow(author_id).await?;
        }

        let status = if options.add_books {
            let entry = if prior.new_author {
                Some(self.policy.new_author_entry_status.as_str())
            } else {
                prior.author.as_ref().map(|a| a.status.as_str())
            };
            AuthorStatus::terminal_or_active(entry)
        } else {
            AuthorStatus::Ignored
        };
        self.store.set_author_status(author_id, status).await?;
        progress.advance(author_id, IngestState::Settled(status));

        let author_name = self
            .store
            .get_author(author_id)
            .await?
            .map_or_else(|| incoming.author_name.clone(), |a| a.name);

        info!(
            author_id = %author_id,
            author_name = %author_name,
            status = %status,
            added = books.added,
            updated = books.updated,
            "Author ingested"
        );

        Ok(IngestOutcome::Completed(IngestReport {
            author_id: author_id.clone(),
            author_name,
            status,
            new_author: prior.new_author,
            books,
        }))
    }

    async fn ingest_books(
        &self,
        author_id: &AuthorId,
        incoming: &ProviderAuthor,
        new_author: bool,
    ) -> Result<BookCounts> {
        match self
            .provider
            .author_books(author_id, &incoming.author_name)
            .await
        {
            Lookup::Found(books) => {
                self.books
                    .ingest(author_id, &books, self.policy.books_for(new_author))
                    .await
            }
            Lookup::NotFound => {
                info!(author_id = %author_id, "Provider lists no books for author");
                Ok(BookCounts::default())
            }
            Lookup::TransportError(detail) => {
                warn!(author_id = %author_id, detail = %detail, "Could not fetch author books");
                Ok(BookCounts::default())
            }
        }
    }

    /// Replaces a missing or remote author image with a cached copy.
    ///
    /// Manual rows are only touched while they still show the placeholder, and
    /// only from the image the provider sent with the author record.
    async fn refresh_image(
        &self,
        author_id: &AuthorId,
        incoming: &ProviderAuthor,
        refresh: bool,
    ) -> Result<()> {
        let Some(author) = self.store.get_author(author_id).await? else {
            return Ok(());
        };

        if author.manual && !is_placeholder_image(author.image.as_deref()) {
            return Ok(());
        }

        let mut candidate = incoming
            .author_img
            .clone()
            .filter(|img| !is_placeholder_image(Some(img.as_str())));
        if candidate.is_none() && !author.manual {
            candidate = self.provider.author_image(author_id).await.found();
        }
        let Some(image) = candidate else {
            return Ok(());
        };

        if !image.starts_with("http") {
            if !author.manual && author.image.as_deref() != Some(image.as_str()) {
                self.store.set_author_image(author_id, &image).await?;
            }
            return Ok(());
        }

        match self
            .images
            .cache(ImageKind::Author, author_id.as_str(), &image, refresh)
            .await
        {
            Ok(local) => self.store.set_author_image(author_id, &local).await?,
            Err(e) => {
                warn!(author_id = %author_id, url = %image, error = %e, "Failed to cache author image");
            }
        }
        Ok(())
    }

    async fn follow(&self, author_id: &AuthorId) -> Result<()> {
        match self.provider.follow_author(author_id).await {
            Lookup::Found(token) => {
                self.store
                    .set_author_follow_id(author_id, Some(&token))
                    .await?;
                info!(author_id = %author_id, "Following author");
            }
            Lookup::NotFound => {
                warn!(author_id = %author_id, "Provider refused to follow author");
            }
            Lookup::TransportError(detail) => {
                warn!(author_id = %author_id, detail = %detail, "Failed to follow author");
            }
        }
        Ok(())
    }

    /// Moves a row left in `Loading` by a failed run to a terminal status.
    async fn settle_after_error(&self, progress: &Progress) {
        let Some(author_id) = &progress.author_id else {
            return;
        };

        let still_loading = match self.store.get_author(author_id).await {
            Ok(Some(author)) => author.parsed_status() == Some(AuthorStatus::Loading),
            Ok(None) => false,
            Err(e) => {
                error!(author_id = %author_id, error = %e, "Could not read author after failure");
                return;
            }
        };

        if still_loading {
            let fallback = if progress.add_books {
                AuthorStatus::Active
            } else {
                AuthorStatus::Ignored
            };
            if let Err(e) = self.store.set_author_status(author_id, fallback).await {
                error!(author_id = %author_id, error = %e, "Could not settle author status");
            } else {
                warn!(author_id = %author_id, status = %fallback, "Settled author after failure");
            }
        }
    }
}
