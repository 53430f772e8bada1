pub mod prelude;

pub mod authors;
pub mod books;
pub mod series;
pub mod series_authors;
pub mod series_members;
