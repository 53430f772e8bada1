use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "series")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub series_id: String,
    pub series_name: String,
    pub have: i32,
    pub total: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::series_members::Entity")]
    SeriesMembers,
    #[sea_orm(has_many = "super::series_authors::Entity")]
    SeriesAuthors,
}

impl Related<super::series_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeriesMembers.def()
    }
}

impl Related<super::series_authors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeriesAuthors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
