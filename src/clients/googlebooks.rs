use crate::clients::provider::{BookProvider, Lookup, ProviderAuthor, ProviderBook, SearchHit};
use crate::config::ProvidersConfig;
use crate::constants::limits::{MAX_AUTHOR_BOOKS, MAX_SEARCH_RESULTS};
use crate::constants::matching::PROVIDER_MATCH_THRESHOLD;
use crate::domain::{AuthorId, BookId};
use crate::matching::{comparison_key, similarity};
use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const PAGE_SIZE: usize = 40;
const AUTHOR_ID_PREFIX: &str = "GB:";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
    #[serde(rename = "totalItems", default)]
    total_items: usize,
}

#[derive(Debug, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "industryIdentifiers", default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
    #[serde(rename = "ratingsCount")]
    ratings_count: Option<u32>,
    #[serde(rename = "canonicalVolumeLink")]
    canonical_volume_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    small_thumbnail: Option<String>,
}

impl VolumeInfo {
    fn isbn(&self) -> Option<String> {
        self.industry_identifiers
            .iter()
            .find(|i| i.kind == "ISBN_13")
            .or_else(|| self.industry_identifiers.iter().find(|i| i.kind == "ISBN_10"))
            .map(|i| i.identifier.clone())
    }

    fn image(&self) -> Option<String> {
        self.image_links
            .as_ref()
            .and_then(|l| l.thumbnail.as_ref().or(l.small_thumbnail.as_ref()))
            .map(|url| url.replace("http://", "https://"))
    }
}

/// Google Books provider.
///
/// Google Books has no author entities, so author ids are derived from the
/// author's comparison key (`GB:ursula_k_le_guin`). The id is stable across
/// spelling variants that normalize to the same key.
#[derive(Clone)]
pub struct GoogleBooksClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl Default for GoogleBooksClient {
    fn default() -> Self {
        Self::new(&ProvidersConfig::default())
    }
}

impl GoogleBooksClient {
    pub fn new(config: &ProvidersConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.google_books_url.trim_end_matches('/').to_string(),
            api_key: config.google_api_key.clone(),
        }
    }

    #[must_use]
    pub fn author_id_for(name: &str) -> AuthorId {
        AuthorId::new(format!(
            "{AUTHOR_ID_PREFIX}{}",
            comparison_key(name).replace(' ', "_")
        ))
    }

    fn name_hint(author_id: &AuthorId) -> String {
        author_id
            .as_str()
            .trim_start_matches(AUTHOR_ID_PREFIX)
            .replace('_', " ")
    }

    fn author_link(name: &str) -> String {
        format!(
            "https://books.google.com/books?q=inauthor:%22{}%22",
            urlencoding::encode(name)
        )
    }

    async fn volumes(&self, query: &str, start: usize, max: usize) -> Result<VolumesResponse> {
        let mut url = format!(
            "{}/volumes?q={}&startIndex={}&maxResults={}&printType=books",
            self.base_url,
            urlencoding::encode(query),
            start,
            max
        );
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(key);
        }

        debug!(query = %query, start, "Google Books request");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Google Books API error: {} - {}", status, body));
        }

        Ok(response.json().await?)
    }

    /// Picks the credited author spelling closest to `wanted` across a page of volumes.
    fn best_author_name(volumes: &[Volume], wanted: &str) -> Option<(String, u8)> {
        let wanted_key = comparison_key(wanted);
        volumes
            .iter()
            .flat_map(|v| v.volume_info.authors.iter())
            .map(|name| (name.clone(), similarity(&wanted_key, &comparison_key(name))))
            .max_by_key(|(_, score)| *score)
    }

    pub async fn search_author(&self, query: &str) -> Result<Option<ProviderAuthor>> {
        let response = self
            .volumes(&format!("inauthor:\"{query}\""), 0, PAGE_SIZE)
            .await?;

        let Some((name, score)) = Self::best_author_name(&response.items, query) else {
            return Ok(None);
        };
        if score < PROVIDER_MATCH_THRESHOLD {
            debug!(query = %query, candidate = %name, score, "No credited author close enough");
            return Ok(None);
        }

        Ok(Some(ProviderAuthor {
            author_id: Self::author_id_for(&name),
            author_link: Some(Self::author_link(&name)),
            author_name: name,
            author_img: None,
            author_born: None,
            author_death: None,
        }))
    }

    pub async fn get_author_volumes(
        &self,
        author_id: &AuthorId,
        author_name: &str,
    ) -> Result<Option<Vec<ProviderBook>>> {
        let wanted = comparison_key(author_name);
        let mut books = Vec::new();
        let mut start = 0;

        loop {
            let response = self
                .volumes(&format!("inauthor:\"{author_name}\""), start, PAGE_SIZE)
                .await?;
            let page_len = response.items.len();

            for volume in response.items {
                let credited = volume
                    .volume_info
                    .authors
                    .iter()
                    .any(|a| similarity(&wanted, &comparison_key(a)) >= PROVIDER_MATCH_THRESHOLD);
                if credited {
                    if let Some(book) = Self::to_book(volume, author_id, author_name) {
                        books.push(book);
                    }
                }
            }

            start += page_len;
            if page_len < PAGE_SIZE || start >= response.total_items || start >= MAX_AUTHOR_BOOKS {
                break;
            }
        }

        Ok(Some(books))
    }

    fn to_book(volume: Volume, author_id: &AuthorId, author_name: &str) -> Option<ProviderBook> {
        let info = volume.volume_info;
        let isbn = info.isbn();
        let image = info.image();
        Some(ProviderBook {
            book_id: BookId::new(volume.id),
            author_id: author_id.clone(),
            author_name: author_name.to_string(),
            title: info.title?,
            link: info.canonical_volume_link,
            date: info.published_date,
            isbn,
            image,
            description: info.description,
            series: Vec::new(),
            known_status: None,
            known_audio_status: None,
        })
    }

    pub async fn get_volume(&self, id: &str) -> Result<Option<ProviderBook>> {
        let mut url = format!("{}/volumes/{}", self.base_url, urlencoding::encode(id));
        if let Some(key) = &self.api_key {
            url.push_str("?key=");
            url.push_str(key);
        }

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow::anyhow!("Google Books API error: {}", status));
        }

        let volume: Volume = response.json().await?;
        let Some(author_name) = volume.volume_info.authors.first().cloned() else {
            return Ok(None);
        };
        let author_id = Self::author_id_for(&author_name);
        Ok(Self::to_book(volume, &author_id, &author_name))
    }

    pub async fn search_volumes(&self, term: &str) -> Result<Option<Vec<SearchHit>>> {
        let response = self.volumes(term, 0, MAX_SEARCH_RESULTS).await?;
        let term_key = comparison_key(term);

        let hits = response
            .items
            .into_iter()
            .filter_map(|volume| {
                let info = volume.volume_info;
                let image = info.image();
                let title = info.title?;
                let author_name = info.authors.into_iter().next().unwrap_or_default();
                let relevance = similarity(&term_key, &comparison_key(&title))
                    .max(similarity(&term_key, &comparison_key(&author_name)));
                Some(SearchHit {
                    book_id: BookId::new(volume.id),
                    book_name: title,
                    author_id: Self::author_id_for(&author_name),
                    author_name,
                    book_date: info.published_date,
                    image,
                    relevance,
                    reviews: info.ratings_count.unwrap_or(0),
                    in_catalog: false,
                })
            })
            .collect();

        Ok(Some(hits))
    }
}

#[async_trait::async_trait]
impl BookProvider for GoogleBooksClient {
    fn name(&self) -> &'static str {
        "GoogleBooks"
    }

    async fn find_author(&self, query: &str) -> Lookup<ProviderAuthor> {
        self.search_author(query).await.into()
    }

    async fn author_info(&self, author_id: &AuthorId) -> Lookup<ProviderAuthor> {
        let hint = Self::name_hint(author_id);
        match self.search_author(&hint).await {
            // only accept the lookup if it resolves back to the same id
            Ok(Some(author)) if author.author_id == *author_id => Lookup::Found(author),
            Ok(_) => Lookup::NotFound,
            Err(e) => Lookup::TransportError(format!("{e:#}")),
        }
    }

    async fn author_books(
        &self,
        author_id: &AuthorId,
        author_name: &str,
    ) -> Lookup<Vec<ProviderBook>> {
        self.get_author_volumes(author_id, author_name).await.into()
    }

    async fn find_book(&self, book_id: &BookId) -> Lookup<ProviderBook> {
        self.get_volume(book_id.as_str()).await.into()
    }

    async fn search(&self, term: &str) -> Lookup<Vec<SearchHit>> {
        self.search_volumes(term).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_id_is_stable_across_spellings() {
        assert_eq!(
            GoogleBooksClient::author_id_for("J.R.R. Tolkien"),
            GoogleBooksClient::author_id_for("J R R  Tolkien")
        );
        assert_eq!(
            GoogleBooksClient::author_id_for("Émile Zola").as_str(),
            "GB:emile_zola"
        );
    }

    #[test]
    fn name_hint_reverses_author_id() {
        let id = GoogleBooksClient::author_id_for("Ursula K. Le Guin");
        assert_eq!(GoogleBooksClient::name_hint(&id), "ursula k le guin");
    }

    #[test]
    fn volume_parsing_prefers_isbn13_and_https_images() {
        let json = r#"{
            "id": "zyTCAlFPjgYC",
            "volumeInfo": {
                "title": "The Google Story",
                "authors": ["David A. Vise", "Mark Malseed"],
                "publishedDate": "2005-11-15",
                "industryIdentifiers": [
                    {"type": "ISBN_10", "identifier": "055380457X"},
                    {"type": "ISBN_13", "identifier": "9780553804577"}
                ],
                "imageLinks": {"thumbnail": "http://books.google.com/thumb.jpg"}
            }
        }"#;

        let volume: Volume = serde_json::from_str(json).unwrap();
        assert_eq!(volume.volume_info.isbn().as_deref(), Some("9780553804577"));
        assert_eq!(
            volume.volume_info.image().as_deref(),
            Some("https://books.google.com/thumb.jpg")
        );

        let id = GoogleBooksClient::author_id_for("David A. Vise");
        let book = GoogleBooksClient::to_book(volume, &id, "David A. Vise").unwrap();
        assert_eq!(book.title, "The Google Story");
        assert_eq!(book.date.as_deref(), Some("2005-11-15"));
    }

    #[test]
    fn best_author_name_picks_closest_credit() {
        let json = r#"[
            {"id": "a", "volumeInfo": {"title": "x", "authors": ["Neil Gaiman", "Terry Pratchett"]}},
            {"id": "b", "volumeInfo": {"title": "y", "authors": ["Terry Pratchet"]}}
        ]"#;
        let volumes: Vec<Volume> = serde_json::from_str(json).unwrap();
        let (name, score) = GoogleBooksClient::best_author_name(&volumes, "terry pratchett").unwrap();
        assert_eq!(name, "Terry Pratchett");
        assert_eq!(score, 100);
    }
}
