mod add;
mod books;
mod list;
mod search;

pub use add::{cmd_add_author, cmd_add_author_id, cmd_refresh_author};
pub use books::cmd_import_book;
pub use list::{cmd_list_authors, cmd_totals};
pub use search::cmd_search_books;

use crate::clients::provider_from_config;
use crate::config::Config;
use crate::db::Store;
use crate::services::{DefaultLibraryImporter, FsImageCache};
use std::sync::Arc;

async fn open_store(config: &Config) -> anyhow::Result<Arc<Store>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    Ok(Arc::new(store))
}

async fn build_importer(config: &Config) -> anyhow::Result<(Arc<Store>, DefaultLibraryImporter)> {
    let store = open_store(config).await?;
    let images = FsImageCache::new(&config.general.images_path, &config.providers.user_agent)?;
    let importer = DefaultLibraryImporter::new(
        store.clone(),
        provider_from_config(config),
        Arc::new(images),
        config.import_policy(),
    );
    Ok((store, importer))
}
