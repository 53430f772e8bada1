use crate::constants::placeholder;
use crate::domain::{AuthorId, AuthorStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub born: Option<String>,
    pub died: Option<String>,
    /// Raw stored status; rows written by older or foreign tools may hold text
    /// outside [`AuthorStatus`].
    pub status: String,
    pub manual: bool,
    pub date_added: Option<String>,
    pub totals: AuthorTotals,
    pub last_book: Option<LastBook>,
    pub follow_id: Option<String>,
}

impl Author {
    #[must_use]
    pub fn parsed_status(&self) -> Option<AuthorStatus> {
        self.status.parse().ok()
    }

    /// True for a `Loading` row no provider record has been merged into yet.
    ///
    /// That covers the by-id marker (placeholder name), a by-name marker still
    /// under its unresolved id, and a marker re-keyed onto the provider id,
    /// which keeps the typed name but has never been stamped with a date.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.parsed_status() == Some(AuthorStatus::Loading)
            && (self.name == placeholder::AUTHOR_NAME
                || self.id.is_unresolved()
                || self.date_added.is_none())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorTotals {
    pub total: i32,
    pub unignored: i32,
    pub have: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastBook {
    pub book_id: String,
    pub name: String,
    pub link: Option<String>,
    pub date: Option<String>,
}

/// Provider-sourced fields that a curator can freeze with the manual flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorDetails {
    pub image: Option<String>,
    pub born: Option<String>,
    pub died: Option<String>,
}

/// Field updates produced by a metadata merge.
///
/// `link` and `date_added` are always written. `name` and `details` are written
/// only when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorChanges {
    pub link: Option<String>,
    pub date_added: String,
    pub name: Option<String>,
    pub details: Option<AuthorDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: AuthorId, name: &str, status: &str, date_added: Option<&str>) -> Author {
        Author {
            id,
            name: name.to_string(),
            link: None,
            image: None,
            born: None,
            died: None,
            status: status.to_string(),
            manual: false,
            date_added: date_added.map(str::to_string),
            totals: AuthorTotals::default(),
            last_book: None,
            follow_id: None,
        }
    }

    #[test]
    fn loading_markers_are_placeholders() {
        let by_id = row(AuthorId::from("OL1A"), "Loading", "Loading", None);
        let by_name = row(AuthorId::unresolved("Jane Doe"), "Jane Doe", "Loading", None);
        let rekeyed = row(AuthorId::from("OL1A"), "Jane Doe", "Loading", None);

        assert!(by_id.is_placeholder());
        assert!(by_name.is_placeholder());
        assert!(rekeyed.is_placeholder());
    }

    #[test]
    fn merged_rows_are_not_placeholders() {
        let refreshing = row(AuthorId::from("OL1A"), "Jane Doe", "Loading", Some("2020-01-01"));
        let settled = row(AuthorId::from("OL1A"), "Loading", "Active", None);

        assert!(!refreshing.is_placeholder());
        assert!(!settled.is_placeholder());
    }
}
