pub use super::authors::Entity as Authors;
pub use super::books::Entity as Books;
pub use super::series::Entity as Series;
pub use super::series_authors::Entity as SeriesAuthors;
pub use super::series_members::Entity as SeriesMembers;
