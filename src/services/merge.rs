//! Field-level reconciliation between a stored author and a provider record.

use crate::clients::ProviderAuthor;
use crate::constants::placeholder;
use crate::models::{Author, AuthorChanges, AuthorDetails};
use chrono::NaiveDate;

/// Computes the updates a provider record may make to an author row.
///
/// `existing` is `None` for authors created by this run; a stored placeholder
/// row counts the same. Link and date added are always refreshed. The name is
/// only taken from the provider for brand-new rows, and image/born/died are
/// frozen once a curator sets `manual`.
#[must_use]
pub fn merge(existing: Option<&Author>, incoming: &ProviderAuthor, today: NaiveDate) -> AuthorChanges {
    let brand_new = existing.is_none_or(Author::is_placeholder);
    let manual = existing.is_some_and(|a| a.manual);

    let name = brand_new.then(|| incoming.author_name.clone());

    let details = (brand_new || !manual).then(|| AuthorDetails {
        image: Some(
            incoming
                .author_img
                .clone()
                .unwrap_or_else(|| placeholder::AUTHOR_IMAGE.to_string()),
        ),
        born: incoming.author_born.clone(),
        died: incoming.author_death.clone(),
    });

    AuthorChanges {
        link: incoming.author_link.clone(),
        date_added: today.to_string(),
        name,
        details,
    }
}

/// True for missing images and the no-photo placeholder.
#[must_use]
pub fn is_placeholder_image(image: Option<&str>) -> bool {
    image.is_none_or(|i| i.is_empty() || i.contains(placeholder::NO_PHOTO_MARKER))
}
