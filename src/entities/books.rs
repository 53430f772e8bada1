use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub book_id: String,
    pub author_id: String,
    pub book_name: String,
    pub book_link: Option<String>,
    /// ISO-8601 prefix; may be a bare year.
    pub book_date: Option<String>,
    pub book_isbn: Option<String>,
    pub book_img: Option<String>,
    pub book_desc: Option<String>,
    pub book_added: Option<String>,
    pub status: String,
    pub audio_status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::authors::Entity",
        from = "Column::AuthorId",
        to = "super::authors::Column::AuthorId",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Authors,
    #[sea_orm(has_many = "super::series_members::Entity")]
    SeriesMembers,
}

impl Related<super::authors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authors.def()
    }
}

impl Related<super::series_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeriesMembers.def()
    }
}

impl Related<super::series::Entity> for Entity {
    fn to() -> RelationDef {
        super::series_members::Relation::Series.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::series_members::Relation::Books.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
