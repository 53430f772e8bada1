//! Domain types for the author/book catalog with strong typing.
//!
//! Identifiers are newtypes so that author ids, book ids and series ids can
//! never be swapped by accident, and statuses are closed enums with a lenient
//! parser for values read back from the store.

use crate::constants::placeholder::UNRESOLVED_ID_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque author identifier.
///
/// Usually issued by a metadata provider. While a by-name ingestion has not yet
/// learned the provider id, a local id of the form `"0: <name>"` is used.
///
/// ```rust
/// use bookarr::domain::AuthorId;
///
/// let id = AuthorId::unresolved("Jane Doe");
/// assert!(id.is_unresolved());
/// assert_eq!(id.as_str(), "0: Jane Doe");
/// assert!(!AuthorId::from("OL23919A").is_unresolved());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Local id for an author known only by name.
    #[must_use]
    pub fn unresolved(name: &str) -> Self {
        Self(format!("{UNRESOLVED_ID_PREFIX}{name}"))
    }

    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.0.starts_with(UNRESOLVED_ID_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AuthorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AuthorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque book identifier issued by a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BookId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Lifecycle status of an author row.
///
/// `Loading` is transient: a row shows it only while an ingestion is in flight.
/// The remaining variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorStatus {
    Loading,
    Active,
    Wanted,
    Ignored,
    Paused,
}

impl AuthorStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Active => "Active",
            Self::Wanted => "Wanted",
            Self::Ignored => "Ignored",
            Self::Paused => "Paused",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Maps any stored status onto a terminal one.
    ///
    /// Values outside the terminal set (including `Loading` left behind by a
    /// crashed run, or text this crate does not know) fall back to `Active`.
    ///
    /// ```rust
    /// use bookarr::domain::AuthorStatus;
    ///
    /// assert_eq!(AuthorStatus::terminal_or_active(Some("Paused")), AuthorStatus::Paused);
    /// assert_eq!(AuthorStatus::terminal_or_active(Some("Loading")), AuthorStatus::Active);
    /// assert_eq!(AuthorStatus::terminal_or_active(None), AuthorStatus::Active);
    /// ```
    #[must_use]
    pub fn terminal_or_active(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse::<Self>().ok())
            .filter(|s| s.is_terminal())
            .unwrap_or(Self::Active)
    }
}

impl fmt::Display for AuthorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Loading" => Ok(Self::Loading),
            "Active" => Ok(Self::Active),
            "Wanted" => Ok(Self::Wanted),
            "Ignored" => Ok(Self::Ignored),
            "Paused" => Ok(Self::Paused),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Acquisition status of a book, tracked separately for ebook and audiobook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    Skipped,
    Wanted,
    Snatched,
    Have,
    Open,
    Ignored,
}

impl BookStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "Skipped",
            Self::Wanted => "Wanted",
            Self::Snatched => "Snatched",
            Self::Have => "Have",
            Self::Open => "Open",
            Self::Ignored => "Ignored",
        }
    }

    /// True for statuses meaning the user already holds a copy.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::Have | Self::Open)
    }

    /// Ownership test for raw stored values; unknown text is not owned.
    #[must_use]
    pub fn owned_str(raw: &str) -> bool {
        raw.parse::<Self>().is_ok_and(Self::is_owned)
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Skipped" => Ok(Self::Skipped),
            "Wanted" => Ok(Self::Wanted),
            "Snatched" => Ok(Self::Snatched),
            "Have" => Ok(Self::Have),
            "Open" => Ok(Self::Open),
            "Ignored" => Ok(Self::Ignored),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_id_unresolved_prefix() {
        let id = AuthorId::unresolved("Robin Hobb");
        assert_eq!(id.to_string(), "0: Robin Hobb");
        assert!(id.is_unresolved());
        assert!(!AuthorId::new("OL26320A").is_unresolved());
    }

    #[test]
    fn author_id_serializes_transparently() {
        let id = AuthorId::new("OL26320A");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"OL26320A\"");
        let back: AuthorId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn author_status_round_trips_through_text() {
        for status in [
            AuthorStatus::Loading,
            AuthorStatus::Active,
            AuthorStatus::Wanted,
            AuthorStatus::Ignored,
            AuthorStatus::Paused,
        ] {
            assert_eq!(status.as_str().parse::<AuthorStatus>(), Ok(status));
        }
        assert!("Deleted".parse::<AuthorStatus>().is_err());
    }

    #[test]
    fn terminal_or_active_defaults_stuck_rows() {
        assert_eq!(
            AuthorStatus::terminal_or_active(Some("Wanted")),
            AuthorStatus::Wanted
        );
        assert_eq!(
            AuthorStatus::terminal_or_active(Some("garbage")),
            AuthorStatus::Active
        );
        assert_eq!(
            AuthorStatus::terminal_or_active(Some("Loading")),
            AuthorStatus::Active
        );
    }

    #[test]
    fn book_ownership() {
        assert!(BookStatus::owned_str("Have"));
        assert!(BookStatus::owned_str("Open"));
        assert!(!BookStatus::owned_str("Wanted"));
        assert!(!BookStatus::owned_str("Ignored"));
        assert!(!BookStatus::owned_str(""));
    }
}
