use crate::domain::{AuthorId, BookId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub author_id: AuthorId,
    pub name: String,
    pub link: Option<String>,
    pub date: Option<String>,
    pub isbn: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub added: Option<String>,
    pub status: String,
    pub audio_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesTotals {
    pub series_id: String,
    pub name: String,
    pub have: i32,
    pub total: i32,
}
