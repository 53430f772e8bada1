pub mod googlebooks;
pub mod openlibrary;
pub mod provider;

pub use googlebooks::GoogleBooksClient;
pub use openlibrary::OpenLibraryClient;
pub use provider::{BookProvider, Lookup, ProviderAuthor, ProviderBook, ProviderSeries, SearchHit};

use crate::config::{BookApi, Config};
use std::sync::Arc;

/// Builds the provider selected by `import.book_api`.
#[must_use]
pub fn provider_from_config(config: &Config) -> Arc<dyn BookProvider> {
    match config.import.book_api {
        BookApi::OpenLibrary => Arc::new(OpenLibraryClient::new(&config.providers)),
        BookApi::GoogleBooks => Arc::new(GoogleBooksClient::new(&config.providers)),
    }
}
