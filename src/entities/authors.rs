use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub author_id: String,
    pub author_name: String,
    pub author_link: Option<String>,
    pub author_img: Option<String>,
    pub author_born: Option<String>,
    pub author_death: Option<String>,
    pub status: String,
    /// Set by a human curator; freezes provider-sourced name, image and dates.
    pub manual: bool,
    pub date_added: Option<String>,
    pub total_books: i32,
    pub unignored_books: i32,
    pub have_books: i32,
    pub last_book_id: Option<String>,
    pub last_book: Option<String>,
    pub last_link: Option<String>,
    pub last_date: Option<String>,
    pub follow_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::books::Entity")]
    Books,
    #[sea_orm(has_many = "super::series_authors::Entity")]
    SeriesAuthors,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl Related<super::series_authors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeriesAuthors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
