pub mod author;
pub mod book;

pub use author::{Author, AuthorChanges, AuthorDetails, AuthorTotals, LastBook};
pub use book::{Book, SeriesTotals};
