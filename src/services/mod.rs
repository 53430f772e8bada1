pub mod books;
pub use books::{BookCounts, BookIngestor};

pub mod identity;
pub use identity::{IdentityResolver, ProviderDecision, Resolution};

pub mod image;
pub use image::{FsImageCache, ImageCache, ImageKind};

pub mod importer;
pub mod importer_impl;
pub use importer::{ImportError, LibraryImporter, NameResolution};
pub use importer_impl::DefaultLibraryImporter;

pub mod ingest;
pub use ingest::{AuthorIngestionPipeline, IngestOptions, IngestOutcome, IngestReport, IngestRequest};

pub mod merge;

pub mod totals;
pub use totals::TotalsAggregator;
