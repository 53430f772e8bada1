use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Collapses whitespace runs into single spaces and trims both ends.
///
/// This is the only clean-up applied to names that are displayed or stored.
///
/// ```
/// use bookarr::matching::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Ursula   K. \tLe Guin "), "Ursula K. Le Guin");
/// ```
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical comparison form of an author name.
///
/// Periods are folded to spaces so that "J.R.R. Tolkien" and "J R R Tolkien"
/// line up, diacritics are stripped and whitespace is collapsed. The result is
/// for comparison only and must never be written back as a display name.
///
/// ```
/// use bookarr::matching::normalize;
///
/// assert_eq!(normalize("J.R.R. Tolkien"), "J R R Tolkien");
/// assert_eq!(normalize("Gabriel García  Márquez"), "Gabriel Garcia Marquez");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    let folded: String = raw
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .map(|ch| if ch == '.' { ' ' } else { ch })
        .collect();

    collapse_whitespace(&folded)
}

/// Lower-cased [`normalize`] output, the key fed to the fuzzy scorer.
#[must_use]
pub fn comparison_key(raw: &str) -> String {
    normalize(raw).to_lowercase()
}

/// Puts a typed author name into the form used for catalog lookups.
///
/// A single "Surname, Forenames" comma is flipped into natural order. Names with
/// more than one comma are left alone since the extra part is usually a suffix.
///
/// ```
/// use bookarr::matching::format_author_name;
///
/// assert_eq!(format_author_name("Tolkien,  J.R.R."), "J.R.R. Tolkien");
/// assert_eq!(format_author_name("Iain M. Banks"), "Iain M. Banks");
/// ```
#[must_use]
pub fn format_author_name(raw: &str) -> String {
    let cleaned = collapse_whitespace(raw);
    let mut parts = cleaned.split(',');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(surname), Some(forenames), None)
            if !surname.trim().is_empty() && !forenames.trim().is_empty() =>
        {
            format!("{} {}", forenames.trim(), surname.trim())
        }
        _ => cleaned,
    }
}
