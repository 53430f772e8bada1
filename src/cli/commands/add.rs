use super::build_importer;
use crate::config::Config;
use crate::domain::AuthorId;
use crate::services::LibraryImporter;

pub async fn cmd_add_author(
    config: &Config,
    name: &str,
    add_books: bool,
    refresh: bool,
) -> anyhow::Result<()> {
    println!("Looking up: {name}");

    let (_store, importer) = build_importer(config).await?;

    match importer.add_author_by_name(name, refresh, add_books).await? {
        Some(found) if found.new => {
            println!("✓ Added {} ({})", found.author_name, found.author_id);
        }
        Some(found) => {
            println!(
                "• {} is already in the catalog ({})",
                found.author_name, found.author_id
            );
            if !refresh {
                println!("  Use --refresh to update it from the provider.");
            }
        }
        None => {
            println!("No author added for '{name}'");
        }
    }

    Ok(())
}

pub async fn cmd_add_author_id(config: &Config, id: &str, add_books: bool) -> anyhow::Result<()> {
    let (_store, importer) = build_importer(config).await?;
    let message = importer
        .add_author_by_id(&AuthorId::new(id), false, add_books)
        .await?;
    println!("{message}");
    Ok(())
}

pub async fn cmd_refresh_author(config: &Config, id: &str) -> anyhow::Result<()> {
    let (store, importer) = build_importer(config).await?;
    let author_id = AuthorId::new(id);

    if !store.author_exists(&author_id).await? {
        println!("Author {id} is not in the catalog. Use 'bookarr add-id {id}' to add it.");
        return Ok(());
    }

    let message = importer.add_author_by_id(&author_id, true, true).await?;
    println!("{message}");
    Ok(())
}
