//! Default [`LibraryImporter`] over the store and a single book provider.

use crate::clients::{BookProvider, Lookup, ProviderBook, SearchHit};
use crate::config::{BookStatusPolicy, ImportPolicy};
use crate::constants::limits::MAX_SEARCH_RESULTS;
use crate::constants::matching::MIN_NAME_LEN;
use crate::db::Store;
use crate::domain::{AuthorId, BookId, BookStatus};
use crate::matching::{collapse_whitespace, format_author_name};
use crate::models::AuthorTotals;
use crate::services::books::BookIngestor;
use crate::services::identity::{IdentityResolver, is_unknown};
use crate::services::image::ImageCache;
use crate::services::importer::{ImportError, LibraryImporter, NameResolution, rank_hits};
use crate::services::ingest::{AuthorIngestionPipeline, IngestOptions, IngestOutcome, IngestRequest};
use crate::services::totals::TotalsAggregator;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

/// Importer wiring the resolver, pipeline and aggregator to one store.
///
/// Cheap to clone; detached book imports run on a clone.
#[derive(Clone)]
pub struct DefaultLibraryImporter {
    store: Arc<Store>,
    provider: Arc<dyn BookProvider>,
    resolver: Arc<IdentityResolver>,
    pipeline: Arc<AuthorIngestionPipeline>,
    totals: Arc<TotalsAggregator>,
    books: Arc<BookIngestor>,
}

impl DefaultLibraryImporter {
    #[must_use]
    pub fn new(
        store: Arc<Store>,
        provider: Arc<dyn BookProvider>,
        images: Arc<dyn ImageCache>,
        policy: ImportPolicy,
    ) -> Self {
        Self {
            resolver: Arc::new(IdentityResolver::new(store.clone())),
            pipeline: Arc::new(AuthorIngestionPipeline::new(
                store.clone(),
                provider.clone(),
                images,
                policy,
            )),
            totals: Arc::new(TotalsAggregator::new(store.clone())),
            books: Arc::new(BookIngestor::new(store.clone())),
            store,
            provider,
        }
    }

    fn policy(&self) -> &ImportPolicy {
        self.pipeline.policy()
    }

    async fn import_book_now(&self, book_id: &BookId) -> Result<String, ImportError> {
        let book = match self.provider.find_book(book_id).await {
            Lookup::Found(book) => book,
            Lookup::NotFound => return Ok(format!("No book found for {book_id}")),
            Lookup::TransportError(detail) => {
                return Err(ImportError::provider(self.provider.name(), detail));
            }
        };

        let author_id = book.author_id.clone();
        if !self.store.author_exists(&author_id).await? {
            let options = IngestOptions {
                refresh: false,
                add_books: false,
            };
            match self
                .pipeline
                .ingest(IngestRequest::ById(author_id.clone()), options)
                .await
            {
                IngestOutcome::Completed(report) => {
                    info!(author_id = %report.author_id, "Added author for imported book");
                }
                IngestOutcome::NotFound => {
                    return Ok(format!(
                        "Author {author_id} of {} could not be found",
                        book.title
                    ));
                }
                IngestOutcome::Failed(message) => return Ok(message),
            }
        }

        self.store_wanted_book(&author_id, &book).await?;
        self.totals.recompute(&author_id).await?;

        Ok(format!("Added {} by {} as Wanted", book.title, book.author_name))
    }

    async fn store_wanted_book(
        &self,
        author_id: &AuthorId,
        book: &ProviderBook,
    ) -> Result<(), ImportError> {
        let policy = BookStatusPolicy {
            book: BookStatus::Wanted,
            audio: self.policy().existing_author_books.audio,
        };
        let counts = self
            .books
            .ingest(author_id, std::slice::from_ref(book), policy)
            .await?;
        self.store
            .set_book_status(&book.book_id, BookStatus::Wanted)
            .await?;
        for owner in &counts.previous_owners {
            self.totals.recompute(owner).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LibraryImporter for DefaultLibraryImporter {
    async fn add_author_by_name(
        &self,
        name: &str,
        refresh: bool,
        add_books: bool,
    ) -> Result<Option<NameResolution>, ImportError> {
        let name = format_author_name(&collapse_whitespace(name));
        if name.chars().count() < MIN_NAME_LEN {
            warn!(name = %name, "Author name too short");
            return Ok(None);
        }

        let resolution = self.resolver.resolve_by_name(&name).await?;
        if let Some((author_id, stored_name)) = resolution.author() {
            let mut result = NameResolution {
                author_name: stored_name.to_string(),
                author_id: author_id.clone(),
                new: false,
            };

            if refresh {
                let options = IngestOptions { refresh, add_books };
                if let IngestOutcome::Completed(report) = self
                    .pipeline
                    .ingest(IngestRequest::ById(author_id.clone()), options)
                    .await
                {
                    result.author_name = report.author_name;
                }
            }
            return Ok(Some(result));
        }

        if !self.policy().add_author {
            info!(name = %name, "Author not in catalog and adding authors is disabled");
            return Ok(None);
        }

        if is_unknown(&name) {
            info!("Refusing to add the unknown-author sentinel");
            return Ok(None);
        }

        let options = IngestOptions { refresh, add_books };
        match self
            .pipeline
            .ingest(IngestRequest::ByName(name.clone()), options)
            .await
        {
            IngestOutcome::Completed(report) => Ok(Some(NameResolution {
                author_name: report.author_name,
                author_id: report.author_id,
                new: report.new_author,
            })),
            IngestOutcome::NotFound => Ok(None),
            IngestOutcome::Failed(message) => {
                warn!(name = %name, message = %message, "Author could not be added");
                Ok(None)
            }
        }
    }

    async fn add_author_by_id(
        &self,
        author_id: &AuthorId,
        refresh: bool,
        add_books: bool,
    ) -> Result<String, ImportError> {
        if author_id.as_str().trim().is_empty() {
            return Err(ImportError::InvalidInput("author id is empty".to_string()));
        }

        let options = IngestOptions { refresh, add_books };
        let message = match self
            .pipeline
            .ingest(IngestRequest::ById(author_id.clone()), options)
            .await
        {
            IngestOutcome::Completed(report) => format!(
                "{} {} ({}): {} books added, {} updated, status {}",
                if report.new_author { "Added" } else { "Updated" },
                report.author_name,
                report.author_id,
                report.books.added,
                report.books.updated,
                report.status
            ),
            IngestOutcome::NotFound => format!("No author found for {author_id}"),
            IngestOutcome::Failed(message) => message,
        };
        Ok(message)
    }

    async fn import_book(&self, book_id: &BookId, wait: bool) -> Result<String, ImportError> {
        if book_id.as_str().trim().is_empty() {
            return Err(ImportError::InvalidInput("book id is empty".to_string()));
        }

        if wait {
            return self.import_book_now(book_id).await;
        }

        let this = self.clone();
        let book_id = book_id.clone();
        let span = info_span!("import_book", book_id = %book_id);
        tokio::spawn(
            async move {
                match this.import_book_now(&book_id).await {
                    Ok(message) => info!(message = %message, "Book import finished"),
                    Err(e) => error!(error = %e, "Book import failed"),
                }
            }
            .instrument(span),
        );
        Ok("Book import started".to_string())
    }

    async fn search_catalog(&self, term: &str) -> Result<Vec<SearchHit>, ImportError> {
        let term = collapse_whitespace(term);
        if term.is_empty() {
            return Err(ImportError::InvalidInput("search term is empty".to_string()));
        }

        let mut hits = match self.provider.search(&term).await {
            Lookup::Found(hits) => hits,
            Lookup::NotFound => return Ok(Vec::new()),
            Lookup::TransportError(detail) => {
                return Err(ImportError::provider(self.provider.name(), detail));
            }
        };

        rank_hits(&mut hits);
        hits.truncate(MAX_SEARCH_RESULTS);

        let ids: Vec<BookId> = hits.iter().map(|h| h.book_id.clone()).collect();
        let known = self.store.existing_book_ids(&ids).await?;
        for hit in &mut hits {
            hit.in_catalog = known.contains(&hit.book_id);
        }

        Ok(hits)
    }

    async fn recompute_totals(
        &self,
        author_id: &AuthorId,
    ) -> Result<Option<AuthorTotals>, ImportError> {
        self.totals.recompute(author_id).await
    }
}
