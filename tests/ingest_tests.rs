//! Author ingestion against a temp-file store and a scripted provider.

mod common;

use bookarr::config::ImportPolicy;
use bookarr::domain::{AuthorId, AuthorStatus, BookId, BookStatus};
use bookarr::models::{Author, AuthorTotals};
use bookarr::services::{
    IdentityResolver, IngestOptions, IngestOutcome, IngestRequest, LibraryImporter, Resolution,
};
use common::{FakeImageCache, author, book, harness, harness_with, in_series, pipeline};
use std::sync::atomic::Ordering;

fn stored_author(id: &str, name: &str, status: &str) -> Author {
    Author {
        id: AuthorId::from(id),
        name: name.to_string(),
        link: None,
        image: Some("images/nophoto.png".to_string()),
        born: Some("1929".to_string()),
        died: None,
        status: status.to_string(),
        manual: false,
        date_added: Some("2020-01-01".to_string()),
        totals: AuthorTotals::default(),
        last_book: None,
        follow_id: None,
    }
}

#[tokio::test]
async fn resolves_punctuation_variants_to_stored_author() {
    let h = harness().await;
    h.store
        .add_author(&stored_author("OL26320A", "J.R.R. Tolkien", "Active"))
        .await
        .unwrap();

    let resolver = IdentityResolver::new(h.store.clone());
    let resolution = resolver.resolve_by_name("J R R Tolkien").await.unwrap();

    match resolution {
        Resolution::Fuzzy { author_id, .. } => assert_eq!(author_id.as_str(), "OL26320A"),
        other => panic!("expected fuzzy match, got {other:?}"),
    }

    let found = h
        .importer
        .add_author_by_name("J R R Tolkien", false, true)
        .await
        .unwrap()
        .expect("author should resolve");
    assert_eq!(found.author_id.as_str(), "OL26320A");
    assert!(!found.new);
    assert_eq!(h.provider.author_info_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_author_is_never_added() {
    let h = harness().await;
    h.provider.add_author(author("OL0A", "Unknown"), Vec::new());

    let result = h
        .importer
        .add_author_by_name("Unknown", false, true)
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(h.store.list_authors().await.unwrap().is_empty());
}

const WITH_BOOKS: IngestOptions = IngestOptions {
    refresh: false,
    add_books: true,
};

#[tokio::test]
async fn provider_name_with_extra_initial_is_accepted() {
    let h = harness().await;
    h.provider.add_author(author("OL9A", "Iain M. Banks"), Vec::new());
    h.provider.alias("Iain Banks", "OL9A");

    let found = h
        .importer
        .add_author_by_name("Iain Banks", false, true)
        .await
        .unwrap()
        .expect("close provider name should be accepted");

    assert!(found.new);
    assert_eq!(found.author_id.as_str(), "OL9A");
    let stored = h.store.get_author(&found.author_id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Iain M. Banks");
}

#[tokio::test]
async fn provider_name_mismatch_leaves_no_row() {
    let h = harness().await;
    h.provider.add_author(author("OL9A", "Anne Rivers"), Vec::new());
    h.provider.alias("Anne Rice", "OL9A");

    let result = h
        .importer
        .add_author_by_name("Anne Rice", false, true)
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(h.store.list_authors().await.unwrap().is_empty());
}

#[tokio::test]
async fn pipeline_refuses_unknown_typed_name() {
    let h = harness().await;
    h.provider.add_author(author("OL0A", "Unknowns"), Vec::new());
    h.provider.alias("Unknown", "OL0A");

    let outcome = pipeline(&h, ImportPolicy::default())
        .ingest(IngestRequest::ByName("Unknown".to_string()), WITH_BOOKS)
        .await;

    assert_eq!(outcome, IngestOutcome::NotFound);
    assert!(h.store.list_authors().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_adds_for_one_id_leave_one_row() {
    let h = harness().await;
    let jane = author("OL1A", "Jane Doe");
    let books = vec![
        book("B1", &jane, "2001", None),
        book("B2", &jane, "2005", None),
        book("B3", &jane, "2010", None),
    ];
    h.provider.add_author(jane, books);

    let id = AuthorId::from("OL1A");
    let runs = (0..2).map(|_| h.importer.add_author_by_id(&id, false, true));
    let results = futures::future::join_all(runs).await;
    for result in results {
        result.expect("ingestion should not error");
    }

    let authors = h.store.list_authors().await.unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].id, id);
    assert_eq!(authors[0].name, "Jane Doe");
    assert_eq!(authors[0].parsed_status(), Some(AuthorStatus::Active));

    let books = h.store.list_books_for_author(&id).await.unwrap();
    assert_eq!(books.len(), 3);
    assert!(books.iter().all(|b| b.author_id == id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn by_id_and_by_name_adds_converge_on_one_row() {
    let h = harness().await;
    let jane = author("OL1A", "Jane Doe");
    let books = vec![
        book("B1", &jane, "2001", None),
        book("B2", &jane, "2005", None),
    ];
    h.provider.add_author(jane, books);

    let id = AuthorId::from("OL1A");
    let (by_id, by_name) = tokio::join!(
        h.importer.add_author_by_id(&id, false, true),
        h.importer.add_author_by_name("Jane Doe", false, true),
    );
    by_id.expect("by-id ingestion should not error");
    let resolved = by_name
        .expect("by-name ingestion should not error")
        .expect("name should resolve");
    assert_eq!(resolved.author_id, id);

    let authors = h.store.list_authors().await.unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].id, id);
    assert!(!authors[0].id.is_unresolved());
    assert_eq!(authors[0].name, "Jane Doe");
    assert_eq!(authors[0].parsed_status(), Some(AuthorStatus::Active));
    assert!(
        h.store
            .get_author(&AuthorId::unresolved("Jane Doe"))
            .await
            .unwrap()
            .is_none()
    );

    let books = h.store.list_books_for_author(&id).await.unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|b| b.author_id == id));
}

#[tokio::test]
async fn rekeyed_marker_is_still_a_new_author() {
    let mut policy = ImportPolicy::default();
    policy.follow_new_authors = true;
    let h = harness_with(policy.clone(), FakeImageCache::default()).await;
    h.provider.add_author(author("OL1A", "Jane Doe"), Vec::new());
    h.provider.set_follow_token("follow-7");

    let id = AuthorId::from("OL1A");
    let stale = AuthorId::unresolved("Jane Doe");
    h.store.mark_author_loading(&stale, "Jane Doe").await.unwrap();
    assert!(h.store.rekey_author(&stale, &id).await.unwrap());

    let outcome = pipeline(&h, policy)
        .ingest(IngestRequest::ByName("Jane Doe".to_string()), WITH_BOOKS)
        .await;

    let IngestOutcome::Completed(report) = &outcome else {
        panic!("expected completed ingestion, got {outcome:?}");
    };
    assert!(report.new_author);
    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.follow_id.as_deref(), Some("follow-7"));
    assert_eq!(stored.parsed_status(), Some(AuthorStatus::Active));
    assert!(stored.date_added.is_some());
}

#[tokio::test]
async fn new_author_without_books_ends_ignored() {
    let h = harness().await;
    let jane = author("OL1A", "Jane Doe");
    let books = vec![book("B1", &jane, "2001", None)];
    h.provider.add_author(jane, books);

    let found = h
        .importer
        .add_author_by_name("Jane Doe", false, false)
        .await
        .unwrap()
        .expect("author should be added");

    assert!(found.new);
    assert_eq!(found.author_id.as_str(), "OL1A");

    let stored = h.store.get_author(&found.author_id).await.unwrap().unwrap();
    assert_eq!(stored.parsed_status(), Some(AuthorStatus::Ignored));
    assert_eq!(
        h.store.count_books_for_author(&found.author_id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn new_author_with_books_settles_totals() {
    let h = harness().await;
    let jane = author("OL1A", "Jane Doe");
    let books = vec![
        book("B1", &jane, "2001", Some(BookStatus::Have)),
        book("B2", &jane, "2005", Some(BookStatus::Have)),
        book("B3", &jane, "2010", Some(BookStatus::Wanted)),
    ];
    h.provider.add_author(jane, books);

    let found = h
        .importer
        .add_author_by_name("Jane Doe", false, true)
        .await
        .unwrap()
        .expect("author should be added");

    let stored = h.store.get_author(&found.author_id).await.unwrap().unwrap();
    assert_eq!(stored.parsed_status(), Some(AuthorStatus::Active));
    assert_eq!(
        stored.totals,
        AuthorTotals {
            total: 3,
            unignored: 3,
            have: 2
        }
    );
    assert_eq!(stored.last_book.unwrap().book_id, "B3");
}

#[tokio::test]
async fn by_name_run_rekeys_placeholder_to_provider_id() {
    let h = harness().await;
    let jane = author("OL1A", "Jane Doe");
    h.provider
        .add_author(jane.clone(), vec![book("B1", &jane, "2001", None)]);

    h.importer
        .add_author_by_name("  Jane   Doe ", false, true)
        .await
        .unwrap()
        .expect("author should be added");

    let authors = h.store.list_authors().await.unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].id.as_str(), "OL1A");
    assert!(!authors[0].id.is_unresolved());
    assert!(
        h.store
            .get_author(&AuthorId::unresolved("Jane Doe"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn rekey_moves_books_and_series_links() {
    let h = harness().await;
    let stale = AuthorId::unresolved("Jane Doe");
    let canonical = AuthorId::from("OL1A");
    h.store.mark_author_loading(&stale, "Jane Doe").await.unwrap();

    let jane = author("0: Jane Doe", "Jane Doe");
    let first = in_series(book("B1", &jane, "2001", None), "S1", "1");
    h.store
        .upsert_provider_book(&stale, &first, ImportPolicy::default().books_for(true))
        .await
        .unwrap();
    h.store.ensure_series("S1", "Series S1").await.unwrap();
    h.store
        .add_series_member("S1", &first.book_id, Some("1"))
        .await
        .unwrap();
    h.store.link_series_author("S1", &stale).await.unwrap();

    assert!(h.store.rekey_author(&stale, &canonical).await.unwrap());

    assert!(h.store.get_author(&stale).await.unwrap().is_none());
    let moved = h.store.get_author(&canonical).await.unwrap().unwrap();
    assert_eq!(moved.name, "Jane Doe");
    assert_eq!(h.store.count_books_for_author(&canonical).await.unwrap(), 1);
    let series = h.store.series_ids_for_author(&canonical).await.unwrap();
    assert!(series.contains("S1"));
}

#[tokio::test]
async fn unknown_id_deletes_new_placeholder() {
    let h = harness().await;
    let id = AuthorId::from("OL404A");

    let message = h.importer.add_author_by_id(&id, false, true).await.unwrap();

    assert!(message.contains("No author found"));
    assert!(h.store.get_author(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn provider_outage_restores_previous_status() {
    let h = harness().await;
    h.store
        .add_author(&stored_author("OL7A", "Ann Leckie", "Paused"))
        .await
        .unwrap();
    h.provider.set_offline(true);

    let id = AuthorId::from("OL7A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, "Paused");
    assert_eq!(stored.name, "Ann Leckie");
}

#[tokio::test]
async fn existing_status_survives_refresh() {
    let h = harness().await;
    h.store
        .add_author(&stored_author("OL7A", "Ann Leckie", "Wanted"))
        .await
        .unwrap();
    h.provider.add_author(author("OL7A", "Ann Leckie"), Vec::new());

    let id = AuthorId::from("OL7A");
    h.importer.add_author_by_id(&id, true, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.parsed_status(), Some(AuthorStatus::Wanted));
}

#[tokio::test]
async fn stuck_loading_row_settles_active() {
    let h = harness().await;
    h.store
        .add_author(&stored_author("OL7A", "Ann Leckie", "Loading"))
        .await
        .unwrap();
    h.provider.add_author(author("OL7A", "Ann Leckie"), Vec::new());

    let id = AuthorId::from("OL7A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.parsed_status(), Some(AuthorStatus::Active));
}

#[tokio::test]
async fn manual_author_keeps_curated_fields() {
    let h = harness().await;
    let mut curated = stored_author("OL5A", "Ursula K. Le Guin", "Active");
    curated.manual = true;
    h.store.add_author(&curated).await.unwrap();

    let mut incoming = author("OL5A", "Ursula Le Guin");
    incoming.author_born = Some("October 21, 1929".to_string());
    incoming.author_img = Some("https://covers.example.org/a/5.jpg".to_string());
    h.provider.add_author(incoming, Vec::new());

    let id = AuthorId::from("OL5A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ursula K. Le Guin");
    assert_eq!(stored.born.as_deref(), Some("1929"));
    assert!(stored.manual);
    assert_eq!(stored.image.as_deref(), Some("cache/author/OL5A.jpg"));
}

#[tokio::test]
async fn manual_author_with_real_image_is_untouched() {
    let h = harness().await;
    let mut curated = stored_author("OL5A", "Ursula K. Le Guin", "Active");
    curated.manual = true;
    curated.image = Some("cache/author/custom.jpg".to_string());
    h.store.add_author(&curated).await.unwrap();

    let mut incoming = author("OL5A", "Ursula Le Guin");
    incoming.author_img = Some("https://covers.example.org/a/5.jpg".to_string());
    h.provider.add_author(incoming, Vec::new());

    let id = AuthorId::from("OL5A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("cache/author/custom.jpg"));
    assert_eq!(h.images.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn manual_author_skips_secondary_photo_lookup() {
    let h = harness().await;
    let mut curated = stored_author("OL5A", "Ursula K. Le Guin", "Active");
    curated.manual = true;
    h.store.add_author(&curated).await.unwrap();
    h.provider.add_author(author("OL5A", "Ursula Le Guin"), Vec::new());
    h.provider.set_photo("OL5A", "https://covers.example.org/a/5-M.jpg");

    let id = AuthorId::from("OL5A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("images/nophoto.png"));
    assert_eq!(h.provider.author_image_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.images.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn secondary_photo_fills_missing_image() {
    let h = harness().await;
    h.store
        .add_author(&stored_author("OL5A", "Ursula K. Le Guin", "Active"))
        .await
        .unwrap();
    h.provider.add_author(author("OL5A", "Ursula K. Le Guin"), Vec::new());
    h.provider.set_photo("OL5A", "https://covers.example.org/a/5-M.jpg");

    let id = AuthorId::from("OL5A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("cache/author/OL5A.jpg"));
    assert_eq!(h.provider.author_image_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_image_cache_keeps_placeholder_for_manual_author() {
    let h = harness_with(ImportPolicy::default(), FakeImageCache::failing()).await;
    let mut curated = stored_author("OL5A", "Ursula K. Le Guin", "Active");
    curated.manual = true;
    h.store.add_author(&curated).await.unwrap();

    let mut incoming = author("OL5A", "Ursula Le Guin");
    incoming.author_img = Some("https://covers.example.org/a/5.jpg".to_string());
    h.provider.add_author(incoming, Vec::new());

    let id = AuthorId::from("OL5A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.image.as_deref(), Some("images/nophoto.png"));
    assert_eq!(h.images.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn new_author_is_followed_when_enabled() {
    let mut policy = ImportPolicy::default();
    policy.follow_new_authors = true;
    let h = harness_with(policy, FakeImageCache::default()).await;
    h.provider.add_author(author("OL1A", "Jane Doe"), Vec::new());
    h.provider.set_follow_token("follow-42");

    let id = AuthorId::from("OL1A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();

    let stored = h.store.get_author(&id).await.unwrap().unwrap();
    assert_eq!(stored.follow_id.as_deref(), Some("follow-42"));
}

#[tokio::test]
async fn refresh_keeps_existing_book_statuses() {
    let h = harness().await;
    let jane = author("OL1A", "Jane Doe");
    h.provider
        .add_author(jane.clone(), vec![book("B1", &jane, "2001", None)]);

    let id = AuthorId::from("OL1A");
    h.importer.add_author_by_id(&id, false, true).await.unwrap();
    h.store
        .set_book_status(&BookId::from("B1"), BookStatus::Have)
        .await
        .unwrap();

    h.importer.add_author_by_id(&id, true, true).await.unwrap();

    let stored = h.store.get_book(&BookId::from("B1")).await.unwrap().unwrap();
    assert_eq!(stored.status, "Have");
}
