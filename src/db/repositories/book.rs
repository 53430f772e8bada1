use crate::clients::ProviderBook;
use crate::config::BookStatusPolicy;
use crate::domain::{AuthorId, BookId, BookStatus};
use crate::entities::{books, prelude::*};
use crate::models::Book;
use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::HashSet;

/// Whether a provider book created a row or refreshed an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookWrite {
    Added,
    Updated,
    /// Refreshed and moved off another author, whose totals are now stale.
    Reassigned(AuthorId),
}

pub struct BookRepository {
    conn: DatabaseConnection,
}

impl BookRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub(crate) fn map_model(model: books::Model) -> Book {
        Book {
            id: BookId::new(model.book_id),
            author_id: AuthorId::new(model.author_id),
            name: model.book_name,
            link: model.book_link,
            date: model.book_date,
            isbn: model.book_isbn,
            image: model.book_img,
            description: model.book_desc,
            added: model.book_added,
            status: model.status,
            audio_status: model.audio_status,
        }
    }

    pub async fn get(&self, id: &BookId) -> Result<Option<Book>> {
        let row = Books::find_by_id(id.as_str()).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    /// All books for an author, ordered by id so repeated reads line up.
    pub async fn list_for_author(&self, author_id: &AuthorId) -> Result<Vec<Book>> {
        let rows = Books::find()
            .filter(books::Column::AuthorId.eq(author_id.as_str()))
            .order_by_asc(books::Column::BookId)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn count_for_author(&self, author_id: &AuthorId) -> Result<u64> {
        let count = Books::find()
            .filter(books::Column::AuthorId.eq(author_id.as_str()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    /// Ids from `ids` that are already stored.
    pub async fn existing_ids(&self, ids: &[BookId]) -> Result<HashSet<BookId>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = Books::find()
            .select_only()
            .column(books::Column::BookId)
            .filter(books::Column::BookId.is_in(ids.iter().map(BookId::as_str)))
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(BookId::new).collect())
    }

    /// Stores a provider book under `author_id`.
    ///
    /// New books take their statuses from the provider's known status or else
    /// from `policy`. Existing books keep their statuses and only have content
    /// fields and owner refreshed.
    pub async fn upsert_from_provider(
        &self,
        author_id: &AuthorId,
        book: &ProviderBook,
        policy: BookStatusPolicy,
    ) -> Result<BookWrite> {
        let previous_owner = Books::find_by_id(book.book_id.as_str())
            .select_only()
            .column(books::Column::AuthorId)
            .into_tuple::<String>()
            .one(&self.conn)
            .await?
            .map(AuthorId::new);

        let status = book.known_status.unwrap_or(policy.book);
        let audio_status = book.known_audio_status.unwrap_or(policy.audio);

        let active_model = books::ActiveModel {
            book_id: Set(book.book_id.to_string()),
            author_id: Set(author_id.to_string()),
            book_name: Set(book.title.clone()),
            book_link: Set(book.link.clone()),
            book_date: Set(book.date.clone()),
            book_isbn: Set(book.isbn.clone()),
            book_img: Set(book.image.clone()),
            book_desc: Set(book.description.clone()),
            book_added: Set(Some(chrono::Utc::now().date_naive().to_string())),
            status: Set(status.to_string()),
            audio_status: Set(audio_status.to_string()),
        };

        Books::insert(active_model)
            .on_conflict(
                OnConflict::column(books::Column::BookId)
                    .update_columns([
                        books::Column::AuthorId,
                        books::Column::BookName,
                        books::Column::BookLink,
                        books::Column::BookDate,
                        books::Column::BookIsbn,
                        books::Column::BookImg,
                        books::Column::BookDesc,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(match previous_owner {
            None => BookWrite::Added,
            Some(owner) if &owner == author_id => BookWrite::Updated,
            Some(owner) => BookWrite::Reassigned(owner),
        })
    }

    pub async fn set_status(&self, id: &BookId, status: BookStatus) -> Result<()> {
        Books::update_many()
            .col_expr(books::Column::Status, Expr::value(status.as_str()))
            .filter(books::Column::BookId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_audio_status(&self, id: &BookId, status: BookStatus) -> Result<()> {
        Books::update_many()
            .col_expr(books::Column::AudioStatus, Expr::value(status.as_str()))
            .filter(books::Column::BookId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
