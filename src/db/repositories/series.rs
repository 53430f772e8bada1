use crate::domain::AuthorId;
use crate::entities::{books, prelude::*, series, series_authors, series_members};
use crate::models::{Book, SeriesTotals};
use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use std::collections::BTreeSet;

use super::book::BookRepository;

pub struct SeriesRepository {
    conn: DatabaseConnection,
}

impl SeriesRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, series_id: &str) -> Result<Option<SeriesTotals>> {
        let row = Series::find_by_id(series_id).one(&self.conn).await?;
        Ok(row.map(|s| SeriesTotals {
            series_id: s.series_id,
            name: s.series_name,
            have: s.have,
            total: s.total,
        }))
    }

    /// Creates the series if needed; an existing series keeps its name and counts.
    pub async fn ensure(&self, series_id: &str, name: &str) -> Result<()> {
        let active_model = series::ActiveModel {
            series_id: Set(series_id.to_string()),
            series_name: Set(name.to_string()),
            have: Set(0),
            total: Set(0),
        };

        Series::insert(active_model)
            .on_conflict(
                OnConflict::column(series::Column::SeriesId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn add_member(
        &self,
        series_id: &str,
        book_id: &str,
        number: Option<&str>,
    ) -> Result<()> {
        let active_model = series_members::ActiveModel {
            series_id: Set(series_id.to_string()),
            book_id: Set(book_id.to_string()),
            series_num: Set(number.map(str::to_string)),
        };

        SeriesMembers::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    series_members::Column::SeriesId,
                    series_members::Column::BookId,
                ])
                .update_column(series_members::Column::SeriesNum)
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn link_author(&self, series_id: &str, author_id: &AuthorId) -> Result<()> {
        let active_model = series_authors::ActiveModel {
            series_id: Set(series_id.to_string()),
            author_id: Set(author_id.to_string()),
        };

        SeriesAuthors::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    series_authors::Column::SeriesId,
                    series_authors::Column::AuthorId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    /// Series linked to the author directly or through one of the author's books.
    pub async fn ids_for_author(&self, author_id: &AuthorId) -> Result<BTreeSet<String>> {
        let linked: Vec<String> = SeriesAuthors::find()
            .select_only()
            .column(series_authors::Column::SeriesId)
            .filter(series_authors::Column::AuthorId.eq(author_id.as_str()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        let via_books: Vec<String> = SeriesMembers::find()
            .select_only()
            .column(series_members::Column::SeriesId)
            .join(JoinType::InnerJoin, series_members::Relation::Books.def())
            .filter(books::Column::AuthorId.eq(author_id.as_str()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(linked.into_iter().chain(via_books).collect())
    }

    /// Member books of a series across all of its authors.
    pub async fn member_books(&self, series_id: &str) -> Result<Vec<Book>> {
        let rows = Books::find()
            .join(JoinType::InnerJoin, books::Relation::SeriesMembers.def())
            .filter(series_members::Column::SeriesId.eq(series_id))
            .order_by_asc(books::Column::BookId)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(BookRepository::map_model).collect())
    }

    pub async fn set_totals(&self, series_id: &str, have: i32, total: i32) -> Result<()> {
        Series::update_many()
            .col_expr(series::Column::Have, Expr::value(have))
            .col_expr(series::Column::Total, Expr::value(total))
            .filter(series::Column::SeriesId.eq(series_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
