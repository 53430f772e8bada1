use super::build_importer;
use crate::config::Config;
use crate::services::LibraryImporter;

pub async fn cmd_search_books(config: &Config, term: &str) -> anyhow::Result<()> {
    println!("Searching for: {term}");

    let (_store, importer) = build_importer(config).await?;
    let results = importer.search_catalog(term).await?;

    if results.is_empty() {
        println!("No books found matching '{term}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for hit in &results {
        let marker = if hit.in_catalog { "✓" } else { "•" };
        let year = hit.book_date.as_deref().unwrap_or("?");

        println!("{marker} {} ({year})", hit.book_name);
        println!(
            "  Author: {} | Book ID: {} | Relevance: {}% | Reviews: {}",
            hit.author_name, hit.book_id, hit.relevance, hit.reviews
        );
        println!();
    }

    println!("To add a book: bookarr import-book <book id>");

    Ok(())
}
