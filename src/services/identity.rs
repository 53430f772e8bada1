//! Maps free-text author names onto catalog rows and vets provider matches.

use crate::clients::ProviderAuthor;
use crate::constants::matching::{CATALOG_MATCH_THRESHOLD, PROVIDER_MATCH_THRESHOLD, UNKNOWN_AUTHOR};
use crate::db::Store;
use crate::domain::AuthorId;
use crate::matching::{collapse_whitespace, comparison_key, similarity};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a free-text name landed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Exact { author_id: AuthorId, name: String },
    Fuzzy {
        author_id: AuthorId,
        name: String,
        score: u8,
    },
    NotFound,
}

impl Resolution {
    #[must_use]
    pub fn author(&self) -> Option<(&AuthorId, &str)> {
        match self {
            Self::Exact { author_id, name } | Self::Fuzzy { author_id, name, .. } => {
                Some((author_id, name.as_str()))
            }
            Self::NotFound => None,
        }
    }
}

/// Whether a provider's answer to a name search may be adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderDecision {
    Accept { score: u8 },
    Refuse { score: u8 },
}

impl ProviderDecision {
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

pub struct IdentityResolver {
    store: Arc<Store>,
}

impl IdentityResolver {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Exact name lookup, then a fuzzy scan of every stored name.
    ///
    /// The scan takes the first candidate in store order scoring at least
    /// [`CATALOG_MATCH_THRESHOLD`], so with several close names the winner is
    /// whichever the store yields first.
    pub async fn resolve_by_name(&self, raw_name: &str) -> Result<Resolution> {
        let name = collapse_whitespace(raw_name);

        if let Some(author) = self.store.find_author_by_name(&name).await? {
            debug!(author_id = %author.id, name = %author.name, "Exact author match");
            return Ok(Resolution::Exact {
                author_id: author.id,
                name: author.name,
            });
        }

        let wanted = comparison_key(&name);
        for (author_id, stored) in self.store.list_author_names().await? {
            let score = similarity(&wanted, &comparison_key(&stored));
            if score >= CATALOG_MATCH_THRESHOLD {
                info!(
                    requested = %name,
                    matched = %stored,
                    score,
                    "Fuzzy author match"
                );
                return Ok(Resolution::Fuzzy {
                    author_id,
                    name: stored,
                    score,
                });
            }
        }

        debug!(requested = %name, "No catalog match for author");
        Ok(Resolution::NotFound)
    }

    /// Decides whether the provider's author is the one the user typed.
    #[must_use]
    pub fn resolve_provider_identity(raw_name: &str, incoming: &ProviderAuthor) -> ProviderDecision {
        let score = similarity(
            &comparison_key(raw_name),
            &comparison_key(&incoming.author_name),
        );

        if is_unknown(raw_name) || is_unknown(&incoming.author_name) {
            info!(
                requested = %raw_name,
                provider_name = %incoming.author_name,
                "Unknown-author sentinel is never imported"
            );
            return ProviderDecision::Refuse { score };
        }

        if score < PROVIDER_MATCH_THRESHOLD {
            info!(
                requested = %raw_name,
                provider_name = %incoming.author_name,
                score,
                "Provider author does not match requested name"
            );
            return ProviderDecision::Refuse { score };
        }

        ProviderDecision::Accept { score }
    }
}

/// True for the placeholder name providers use for unattributed works.
#[must_use]
pub fn is_unknown(name: &str) -> bool {
    comparison_key(name) == comparison_key(UNKNOWN_AUTHOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_author(name: &str) -> ProviderAuthor {
        ProviderAuthor {
            author_id: AuthorId::from("OL1A"),
            author_name: name.to_string(),
            author_link: None,
            author_img: None,
            author_born: None,
            author_death: None,
        }
    }

    #[test]
    fn accepts_close_provider_name() {
        let decision =
            IdentityResolver::resolve_provider_identity("J R R Tolkien", &provider_author("J.R.R. Tolkien"));
        assert_eq!(decision, ProviderDecision::Accept { score: 100 });
    }

    #[test]
    fn accepts_provider_name_with_middle_initial() {
        let decision = IdentityResolver::resolve_provider_identity(
            "Iain Banks",
            &provider_author("Iain M. Banks"),
        );
        assert_eq!(decision, ProviderDecision::Accept { score: 91 });
    }

    #[test]
    fn refuses_distant_provider_name() {
        let decision = IdentityResolver::resolve_provider_identity(
            "Anne Rice",
            &provider_author("Anne Rivers"),
        );
        assert!(!decision.is_accept());
    }

    #[test]
    fn refuses_unknown_sentinel_even_when_typed() {
        let decision =
            IdentityResolver::resolve_provider_identity("Unknown", &provider_author("unknown"));
        assert!(!decision.is_accept());
        assert!(is_unknown(" Unknown "));
    }

    #[test]
    fn refuses_unknown_typed_name_whatever_the_provider_answers() {
        let decision =
            IdentityResolver::resolve_provider_identity("Unknown", &provider_author("Unknowns"));
        assert!(matches!(decision, ProviderDecision::Refuse { score } if score >= 90));
    }
}
