use crate::clients::ProviderBook;
use crate::config::BookStatusPolicy;
use crate::domain::{AuthorId, AuthorStatus, BookId, BookStatus};
use crate::models::{Author, AuthorChanges, AuthorTotals, Book, LastBook, SeriesTotals};
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::book::BookWrite;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn author_repo(&self) -> repositories::author::AuthorRepository {
        repositories::author::AuthorRepository::new(self.conn.clone())
    }

    fn book_repo(&self) -> repositories::book::BookRepository {
        repositories::book::BookRepository::new(self.conn.clone())
    }

    fn series_repo(&self) -> repositories::series::SeriesRepository {
        repositories::series::SeriesRepository::new(self.conn.clone())
    }

    // Authors

    pub async fn get_author(&self, id: &AuthorId) -> Result<Option<Author>> {
        self.author_repo().get(id).await
    }

    pub async fn author_exists(&self, id: &AuthorId) -> Result<bool> {
        self.author_repo().exists(id).await
    }

    pub async fn find_author_by_name(&self, name: &str) -> Result<Option<Author>> {
        self.author_repo().find_by_name(name).await
    }

    pub async fn list_author_names(&self) -> Result<Vec<(AuthorId, String)>> {
        self.author_repo().list_names().await
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>> {
        self.author_repo().list_all().await
    }

    pub async fn add_author(&self, author: &Author) -> Result<()> {
        self.author_repo().insert(author).await
    }

    pub async fn mark_author_loading(&self, id: &AuthorId, name: &str) -> Result<()> {
        self.author_repo().mark_loading(id, name).await
    }

    pub async fn set_author_status(&self, id: &AuthorId, status: AuthorStatus) -> Result<()> {
        self.author_repo().set_status(id, status).await
    }

    pub async fn restore_author_status(&self, id: &AuthorId, status: &str) -> Result<()> {
        self.author_repo().set_raw_status(id, status).await
    }

    pub async fn apply_author_changes(&self, id: &AuthorId, changes: &AuthorChanges) -> Result<()> {
        self.author_repo().apply_changes(id, changes).await
    }

    pub async fn set_author_image(&self, id: &AuthorId, image: &str) -> Result<()> {
        self.author_repo().set_image(id, image).await
    }

    pub async fn set_author_follow_id(&self, id: &AuthorId, follow_id: Option<&str>) -> Result<()> {
        self.author_repo().set_follow_id(id, follow_id).await
    }

    pub async fn set_author_totals(
        &self,
        id: &AuthorId,
        totals: AuthorTotals,
        last_book: Option<&LastBook>,
    ) -> Result<()> {
        self.author_repo().set_totals(id, totals, last_book).await
    }

    pub async fn remove_author(&self, id: &AuthorId) -> Result<bool> {
        self.author_repo().delete(id).await
    }

    pub async fn rekey_author(&self, stale: &AuthorId, canonical: &AuthorId) -> Result<bool> {
        self.author_repo().rekey(stale, canonical).await
    }

    // Books

    pub async fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        self.book_repo().get(id).await
    }

    pub async fn list_books_for_author(&self, author_id: &AuthorId) -> Result<Vec<Book>> {
        self.book_repo().list_for_author(author_id).await
    }

    pub async fn count_books_for_author(&self, author_id: &AuthorId) -> Result<u64> {
        self.book_repo().count_for_author(author_id).await
    }

    pub async fn existing_book_ids(&self, ids: &[BookId]) -> Result<HashSet<BookId>> {
        self.book_repo().existing_ids(ids).await
    }

    pub async fn upsert_provider_book(
        &self,
        author_id: &AuthorId,
        book: &ProviderBook,
        policy: BookStatusPolicy,
    ) -> Result<BookWrite> {
        self.book_repo()
            .upsert_from_provider(author_id, book, policy)
            .await
    }

    pub async fn set_book_status(&self, id: &BookId, status: BookStatus) -> Result<()> {
        self.book_repo().set_status(id, status).await
    }

    pub async fn set_book_audio_status(&self, id: &BookId, status: BookStatus) -> Result<()> {
        self.book_repo().set_audio_status(id, status).await
    }

    // Series

    pub async fn get_series(&self, series_id: &str) -> Result<Option<SeriesTotals>> {
        self.series_repo().get(series_id).await
    }

    pub async fn ensure_series(&self, series_id: &str, name: &str) -> Result<()> {
        self.series_repo().ensure(series_id, name).await
    }

    pub async fn add_series_member(
        &self,
        series_id: &str,
        book_id: &BookId,
        number: Option<&str>,
    ) -> Result<()> {
        self.series_repo()
            .add_member(series_id, book_id.as_str(), number)
            .await
    }

    pub async fn link_series_author(&self, series_id: &str, author_id: &AuthorId) -> Result<()> {
        self.series_repo().link_author(series_id, author_id).await
    }

    pub async fn series_ids_for_author(&self, author_id: &AuthorId) -> Result<BTreeSet<String>> {
        self.series_repo().ids_for_author(author_id).await
    }

    pub async fn series_member_books(&self, series_id: &str) -> Result<Vec<Book>> {
        self.series_repo().member_books(series_id).await
    }

    pub async fn set_series_totals(&self, series_id: &str, have: i32, total: i32) -> Result<()> {
        self.series_repo().set_totals(series_id, have, total).await
    }
}
