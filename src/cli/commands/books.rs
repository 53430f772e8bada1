use super::build_importer;
use crate::config::Config;
use crate::domain::BookId;
use crate::services::LibraryImporter;

pub async fn cmd_import_book(config: &Config, id: &str) -> anyhow::Result<()> {
    let (_store, importer) = build_importer(config).await?;
    let message = importer.import_book(&BookId::new(id), true).await?;
    println!("{message}");
    Ok(())
}
