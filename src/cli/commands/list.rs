use super::{build_importer, open_store};
use crate::config::Config;
use crate::domain::AuthorId;
use crate::services::LibraryImporter;

pub async fn cmd_list_authors(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let authors = store.list_authors().await?;

    if authors.is_empty() {
        println!("No authors in the catalog.");
        println!();
        println!("Add one with: bookarr add \"author name\"");
        return Ok(());
    }

    println!("Authors ({} total)", authors.len());
    println!("{:-<70}", "");

    for author in authors {
        println!(
            "• {} [{}/{} books, {} ignored]",
            author.name,
            author.totals.have,
            author.totals.unignored,
            author.totals.total - author.totals.unignored
        );
        println!("  ID: {} | Status: {}", author.id, author.status);
        if let Some(last) = &author.last_book {
            println!(
                "  Latest: {} ({})",
                last.name,
                last.date.as_deref().unwrap_or("?")
            );
        }
    }

    Ok(())
}

pub async fn cmd_totals(config: &Config, id: &str) -> anyhow::Result<()> {
    let (_store, importer) = build_importer(config).await?;

    match importer.recompute_totals(&AuthorId::new(id)).await? {
        Some(totals) => println!(
            "{id}: {} books, {} not ignored, {} held",
            totals.total, totals.unignored, totals.have
        ),
        None => println!("Author {id} is not in the catalog"),
    }

    Ok(())
}
