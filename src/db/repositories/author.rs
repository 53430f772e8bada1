use crate::constants::placeholder;
use crate::domain::{AuthorId, AuthorStatus};
use crate::entities::{authors, books, prelude::*, series_authors};
use crate::models::{Author, AuthorChanges, AuthorTotals, LastBook};
use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

pub struct AuthorRepository {
    conn: DatabaseConnection,
}

impl AuthorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: authors::Model) -> Author {
        let last_book = model.last_book_id.map(|book_id| LastBook {
            book_id,
            name: model.last_book.unwrap_or_default(),
            link: model.last_link,
            date: model.last_date,
        });

        Author {
            id: AuthorId::new(model.author_id),
            name: model.author_name,
            link: model.author_link,
            image: model.author_img,
            born: model.author_born,
            died: model.author_death,
            status: model.status,
            manual: model.manual,
            date_added: model.date_added,
            totals: AuthorTotals {
                total: model.total_books,
                unignored: model.unignored_books,
                have: model.have_books,
            },
            last_book,
            follow_id: model.follow_id,
        }
    }

    pub async fn get(&self, id: &AuthorId) -> Result<Option<Author>> {
        let row = Authors::find_by_id(id.as_str()).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn exists(&self, id: &AuthorId) -> Result<bool> {
        let row = Authors::find_by_id(id.as_str())
            .select_only()
            .column(authors::Column::AuthorId)
            .into_tuple::<String>()
            .one(&self.conn)
            .await?;
        Ok(row.is_some())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Author>> {
        let row = Authors::find()
            .filter(authors::Column::AuthorName.eq(name))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    /// Every (id, name) pair in store order, for the fuzzy candidate scan.
    pub async fn list_names(&self) -> Result<Vec<(AuthorId, String)>> {
        let rows = Authors::find()
            .select_only()
            .column(authors::Column::AuthorId)
            .column(authors::Column::AuthorName)
            .into_tuple::<(String, String)>()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| (AuthorId::new(id), name))
            .collect())
    }

    pub async fn list_all(&self) -> Result<Vec<Author>> {
        let rows = Authors::find()
            .order_by_asc(authors::Column::AuthorName)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Writes the `Loading` marker for `id` in a single statement.
    ///
    /// A missing row is created with the given name and the no-photo image; an
    /// existing row only has its status flipped, so concurrent callers for the
    /// same id converge on one row.
    pub async fn mark_loading(&self, id: &AuthorId, name: &str) -> Result<()> {
        let active_model = authors::ActiveModel {
            author_id: Set(id.to_string()),
            author_name: Set(name.to_string()),
            author_img: Set(Some(placeholder::AUTHOR_IMAGE.to_string())),
            status: Set(AuthorStatus::Loading.to_string()),
            manual: Set(false),
            total_books: Set(0),
            unignored_books: Set(0),
            have_books: Set(0),
            ..Default::default()
        };

        Authors::insert(active_model)
            .on_conflict(
                OnConflict::column(authors::Column::AuthorId)
                    .update_column(authors::Column::Status)
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        debug!(author_id = %id, "Author marked Loading");
        Ok(())
    }

    pub async fn set_status(&self, id: &AuthorId, status: AuthorStatus) -> Result<()> {
        self.set_raw_status(id, status.as_str()).await
    }

    /// Restores a status read earlier, even one outside [`AuthorStatus`].
    pub async fn set_raw_status(&self, id: &AuthorId, status: &str) -> Result<()> {
        Authors::update_many()
            .col_expr(authors::Column::Status, Expr::value(status))
            .filter(authors::Column::AuthorId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn apply_changes(&self, id: &AuthorId, changes: &AuthorChanges) -> Result<()> {
        let mut update = Authors::update_many()
            .col_expr(authors::Column::AuthorLink, Expr::value(changes.link.clone()))
            .col_expr(
                authors::Column::DateAdded,
                Expr::value(changes.date_added.clone()),
            );

        if let Some(name) = &changes.name {
            update = update.col_expr(authors::Column::AuthorName, Expr::value(name.clone()));
        }

        if let Some(details) = &changes.details {
            update = update
                .col_expr(authors::Column::AuthorImg, Expr::value(details.image.clone()))
                .col_expr(authors::Column::AuthorBorn, Expr::value(details.born.clone()))
                .col_expr(authors::Column::AuthorDeath, Expr::value(details.died.clone()));
        }

        update
            .filter(authors::Column::AuthorId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_image(&self, id: &AuthorId, image: &str) -> Result<()> {
        Authors::update_many()
            .col_expr(authors::Column::AuthorImg, Expr::value(image))
            .filter(authors::Column::AuthorId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_follow_id(&self, id: &AuthorId, follow_id: Option<&str>) -> Result<()> {
        Authors::update_many()
            .col_expr(
                authors::Column::FollowId,
                Expr::value(follow_id.map(str::to_string)),
            )
            .filter(authors::Column::AuthorId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_totals(
        &self,
        id: &AuthorId,
        totals: AuthorTotals,
        last_book: Option<&LastBook>,
    ) -> Result<()> {
        Authors::update_many()
            .col_expr(authors::Column::TotalBooks, Expr::value(totals.total))
            .col_expr(authors::Column::UnignoredBooks, Expr::value(totals.unignored))
            .col_expr(authors::Column::HaveBooks, Expr::value(totals.have))
            .col_expr(
                authors::Column::LastBookId,
                Expr::value(last_book.map(|b| b.book_id.clone())),
            )
            .col_expr(
                authors::Column::LastBook,
                Expr::value(last_book.map(|b| b.name.clone())),
            )
            .col_expr(
                authors::Column::LastLink,
                Expr::value(last_book.and_then(|b| b.link.clone())),
            )
            .col_expr(
                authors::Column::LastDate,
                Expr::value(last_book.and_then(|b| b.date.clone())),
            )
            .filter(authors::Column::AuthorId.eq(id.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &AuthorId) -> Result<bool> {
        let result = Authors::delete_by_id(id.as_str()).exec(&self.conn).await?;
        let removed = result.rows_affected > 0;
        if removed {
            info!(author_id = %id, "Removed author");
        }
        Ok(removed)
    }

    /// Moves everything owned by `stale` onto `canonical` and drops `stale`.
    ///
    /// The canonical row is created from the stale one when it does not exist
    /// yet. Books and series links are re-pointed before the stale row is
    /// deleted, all in one transaction. Returns false when `stale` is gone.
    pub async fn rekey(&self, stale: &AuthorId, canonical: &AuthorId) -> Result<bool> {
        if stale == canonical {
            return Ok(true);
        }

        let txn = self.conn.begin().await?;

        let Some(stale_row) = Authors::find_by_id(stale.as_str()).one(&txn).await? else {
            txn.commit().await?;
            return Ok(false);
        };

        let mut canonical_row = stale_row.into_active_model().reset_all();
        canonical_row.author_id = Set(canonical.to_string());
        Authors::insert(canonical_row)
            .on_conflict(
                OnConflict::column(authors::Column::AuthorId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let moved = Books::update_many()
            .col_expr(books::Column::AuthorId, Expr::value(canonical.as_str()))
            .filter(books::Column::AuthorId.eq(stale.as_str()))
            .exec(&txn)
            .await?;

        let links = SeriesAuthors::find()
            .filter(series_authors::Column::AuthorId.eq(stale.as_str()))
            .all(&txn)
            .await?;
        for link in links {
            let relinked = series_authors::ActiveModel {
                series_id: Set(link.series_id),
                author_id: Set(canonical.to_string()),
            };
            SeriesAuthors::insert(relinked)
                .on_conflict(
                    OnConflict::columns([
                        series_authors::Column::SeriesId,
                        series_authors::Column::AuthorId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        SeriesAuthors::delete_many()
            .filter(series_authors::Column::AuthorId.eq(stale.as_str()))
            .exec(&txn)
            .await?;

        Authors::delete_by_id(stale.as_str()).exec(&txn).await?;

        txn.commit().await?;

        info!(
            stale = %stale,
            canonical = %canonical,
            books = moved.rows_affected,
            "Re-keyed author"
        );
        Ok(true)
    }

    /// Test and admin hook: stores a fully formed author row.
    pub async fn insert(&self, author: &Author) -> Result<()> {
        let active_model = authors::ActiveModel {
            author_id: Set(author.id.to_string()),
            author_name: Set(author.name.clone()),
            author_link: Set(author.link.clone()),
            author_img: Set(author.image.clone()),
            author_born: Set(author.born.clone()),
            author_death: Set(author.died.clone()),
            status: Set(author.status.clone()),
            manual: Set(author.manual),
            date_added: Set(author.date_added.clone()),
            total_books: Set(author.totals.total),
            unignored_books: Set(author.totals.unignored),
            have_books: Set(author.totals.have),
            last_book_id: Set(author.last_book.as_ref().map(|b| b.book_id.clone())),
            last_book: Set(author.last_book.as_ref().map(|b| b.name.clone())),
            last_link: Set(author.last_book.as_ref().and_then(|b| b.link.clone())),
            last_date: Set(author.last_book.as_ref().and_then(|b| b.date.clone())),
            follow_id: Set(author.follow_id.clone()),
        };
        active_model.insert(&self.conn).await?;
        Ok(())
    }
}
