//! Shared fixtures: a temp-file store and scripted provider and image cache.

#![allow(dead_code)]

use bookarr::clients::{BookProvider, Lookup, ProviderAuthor, ProviderBook, ProviderSeries, SearchHit};
use bookarr::config::ImportPolicy;
use bookarr::db::Store;
use bookarr::domain::{AuthorId, BookId, BookStatus};
use bookarr::services::{AuthorIngestionPipeline, DefaultLibraryImporter, ImageCache, ImageKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub async fn test_store() -> Arc<Store> {
    let db_path =
        std::env::temp_dir().join(format!("bookarr-test-{}.db", uuid::Uuid::new_v4()));
    let store = Store::with_pool_options(&format!("sqlite:{}", db_path.display()), 1, 1)
        .await
        .expect("failed to open test store");
    Arc::new(store)
}

pub fn author(id: &str, name: &str) -> ProviderAuthor {
    ProviderAuthor {
        author_id: AuthorId::from(id),
        author_name: name.to_string(),
        author_link: Some(format!("https://example.org/authors/{id}")),
        author_img: None,
        author_born: Some("1950".to_string()),
        author_death: None,
    }
}

pub fn book(id: &str, author: &ProviderAuthor, date: &str, known: Option<BookStatus>) -> ProviderBook {
    ProviderBook {
        book_id: BookId::from(id),
        author_id: author.author_id.clone(),
        author_name: author.author_name.clone(),
        title: format!("Title {id}"),
        link: None,
        date: Some(date.to_string()),
        isbn: None,
        image: None,
        description: None,
        series: Vec::new(),
        known_status: known,
        known_audio_status: None,
    }
}

pub fn in_series(mut book: ProviderBook, series_id: &str, number: &str) -> ProviderBook {
    book.series.push(ProviderSeries {
        series_id: Some(series_id.to_string()),
        name: format!("Series {series_id}"),
        number: Some(number.to_string()),
    });
    book
}

/// Provider answering from in-memory tables.
#[derive(Default)]
pub struct FakeProvider {
    authors: Mutex<HashMap<AuthorId, ProviderAuthor>>,
    names: Mutex<HashMap<String, AuthorId>>,
    books: Mutex<HashMap<AuthorId, Vec<ProviderBook>>>,
    hits: Mutex<Vec<SearchHit>>,
    offline: Mutex<bool>,
    follow_token: Mutex<Option<String>>,
    photos: Mutex<HashMap<AuthorId, String>>,
    pub author_info_calls: AtomicUsize,
    pub author_image_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn add_author(&self, author: ProviderAuthor, books: Vec<ProviderBook>) {
        self.names
            .lock()
            .unwrap()
            .insert(author.author_name.to_lowercase(), author.author_id.clone());
        self.books
            .lock()
            .unwrap()
            .insert(author.author_id.clone(), books);
        self.authors
            .lock()
            .unwrap()
            .insert(author.author_id.clone(), author);
    }

    /// Answers a name query with `author` regardless of its own name.
    pub fn alias(&self, query: &str, author_id: &str) {
        self.names
            .lock()
            .unwrap()
            .insert(query.to_lowercase(), AuthorId::from(author_id));
    }

    pub fn set_hits(&self, hits: Vec<SearchHit>) {
        *self.hits.lock().unwrap() = hits;
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn set_follow_token(&self, token: &str) {
        *self.follow_token.lock().unwrap() = Some(token.to_string());
    }

    /// Answers the secondary photo lookup for `author_id`.
    pub fn set_photo(&self, author_id: &str, url: &str) {
        self.photos
            .lock()
            .unwrap()
            .insert(AuthorId::from(author_id), url.to_string());
    }

    fn is_offline(&self) -> bool {
        *self.offline.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl BookProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "Fake"
    }

    async fn find_author(&self, query: &str) -> Lookup<ProviderAuthor> {
        if self.is_offline() {
            return Lookup::TransportError("offline".to_string());
        }
        let id = self.names.lock().unwrap().get(&query.to_lowercase()).cloned();
        match id.and_then(|id| self.authors.lock().unwrap().get(&id).cloned()) {
            Some(author) => Lookup::Found(author),
            None => Lookup::NotFound,
        }
    }

    async fn author_info(&self, author_id: &AuthorId) -> Lookup<ProviderAuthor> {
        self.author_info_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.is_offline() {
            return Lookup::TransportError("offline".to_string());
        }
        match self.authors.lock().unwrap().get(author_id) {
            Some(author) => Lookup::Found(author.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn author_books(
        &self,
        author_id: &AuthorId,
        _author_name: &str,
    ) -> Lookup<Vec<ProviderBook>> {
        tokio::task::yield_now().await;
        match self.books.lock().unwrap().get(author_id) {
            Some(books) => Lookup::Found(books.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn find_book(&self, book_id: &BookId) -> Lookup<ProviderBook> {
        let books = self.books.lock().unwrap();
        books
            .values()
            .flatten()
            .find(|b| &b.book_id == book_id)
            .cloned()
            .map_or(Lookup::NotFound, Lookup::Found)
    }

    async fn search(&self, _term: &str) -> Lookup<Vec<SearchHit>> {
        if self.is_offline() {
            return Lookup::TransportError("offline".to_string());
        }
        Lookup::Found(self.hits.lock().unwrap().clone())
    }

    async fn author_image(&self, author_id: &AuthorId) -> Lookup<String> {
        self.author_image_calls.fetch_add(1, Ordering::SeqCst);
        self.photos
            .lock()
            .unwrap()
            .get(author_id)
            .cloned()
            .map_or(Lookup::NotFound, Lookup::Found)
    }

    async fn follow_author(&self, _author_id: &AuthorId) -> Lookup<String> {
        self.follow_token
            .lock()
            .unwrap()
            .clone()
            .map_or(Lookup::NotFound, Lookup::Found)
    }
}

/// Image cache that never touches the network.
#[derive(Default)]
pub struct FakeImageCache {
    failing: Mutex<bool>,
    pub calls: AtomicUsize,
}

impl FakeImageCache {
    pub fn failing() -> Self {
        Self {
            failing: Mutex::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ImageCache for FakeImageCache {
    async fn cache(
        &self,
        _kind: ImageKind,
        id: &str,
        _url: &str,
        _refresh: bool,
    ) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock().unwrap() {
            anyhow::bail!("image host unreachable");
        }
        Ok(format!("cache/author/{id}.jpg"))
    }
}

pub struct Harness {
    pub store: Arc<Store>,
    pub provider: Arc<FakeProvider>,
    pub images: Arc<FakeImageCache>,
    pub importer: DefaultLibraryImporter,
}

pub async fn harness() -> Harness {
    harness_with(ImportPolicy::default(), FakeImageCache::default()).await
}

pub async fn harness_with(policy: ImportPolicy, images: FakeImageCache) -> Harness {
    let store = test_store().await;
    let provider = Arc::new(FakeProvider::default());
    let images = Arc::new(images);
    let importer = DefaultLibraryImporter::new(
        store.clone(),
        provider.clone(),
        images.clone(),
        policy,
    );
    Harness {
        store,
        provider,
        images,
        importer,
    }
}

/// A pipeline sharing the harness store, provider and image cache.
pub fn pipeline(h: &Harness, policy: ImportPolicy) -> AuthorIngestionPipeline {
    AuthorIngestionPipeline::new(h.store.clone(), h.provider.clone(), h.images.clone(), policy)
}
