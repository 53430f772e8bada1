use crate::clients::provider::{BookProvider, Lookup, ProviderAuthor, ProviderBook, SearchHit};
use crate::config::ProvidersConfig;
use crate::constants::limits::{MAX_AUTHOR_BOOKS, MAX_SEARCH_RESULTS};
use crate::domain::{AuthorId, BookId};
use crate::matching::{comparison_key, similarity};
use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const COVERS_URL: &str = "https://covers.openlibrary.org";

#[derive(Debug, Deserialize)]
struct AuthorSearchResponse {
    #[serde(default)]
    docs: Vec<AuthorDoc>,
}

#[derive(Debug, Deserialize)]
struct AuthorDoc {
    key: String,
    name: Option<String>,
    birth_date: Option<String>,
    death_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorRecord {
    name: Option<String>,
    personal_name: Option<String>,
    birth_date: Option<String>,
    death_date: Option<String>,
    #[serde(default)]
    photos: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct WorkSearchResponse {
    #[serde(default)]
    docs: Vec<WorkDoc>,
}

#[derive(Debug, Deserialize)]
struct WorkDoc {
    key: String,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    author_key: Vec<String>,
    first_publish_year: Option<i32>,
    cover_i: Option<i64>,
    #[serde(default)]
    isbn: Vec<String>,
    ratings_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WorkRecord {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<WorkAuthorRef>,
    #[serde(default)]
    covers: Vec<i64>,
    first_publish_date: Option<String>,
    description: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthorRef {
    author: KeyRef,
}

#[derive(Debug, Deserialize)]
struct KeyRef {
    key: String,
}

/// Open Library serves descriptions either as a bare string or as a typed object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextValue {
    Plain(String),
    Typed { value: String },
}

impl TextValue {
    fn into_string(self) -> String {
        match self {
            Self::Plain(s) | Self::Typed { value: s } => s,
        }
    }
}

/// Open Library provider.
///
/// Author ids are Open Library author keys (`OL23919A`), book ids are work keys
/// (`OL45804W`).
#[derive(Clone)]
pub struct OpenLibraryClient {
    client: Client,
    base_url: String,
}

impl Default for OpenLibraryClient {
    fn default() -> Self {
        Self::new(&ProvidersConfig::default())
    }
}

impl OpenLibraryClient {
    pub fn new(config: &ProvidersConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.open_library_url.trim_end_matches('/').to_string(),
        }
    }

    fn author_link(&self, key: &str) -> String {
        format!("{}/authors/{}", self.base_url, key)
    }

    fn work_link(&self, key: &str) -> String {
        format!("{}/works/{}", self.base_url, key)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!(url = %url, "Open Library request");
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Open Library API error: {} - {}", status, body));
        }

        Ok(Some(response.json().await?))
    }

    pub async fn search_author(&self, query: &str) -> Result<Option<ProviderAuthor>> {
        let url = format!(
            "{}/search/authors.json?q={}&limit=5",
            self.base_url,
            urlencoding::encode(query)
        );

        let Some(response) = self.get_json::<AuthorSearchResponse>(&url).await? else {
            return Ok(None);
        };

        let Some(doc) = response.docs.into_iter().next() else {
            return Ok(None);
        };

        // the detail record carries photos; fall back to the search doc without one
        if let Some(author) = self.get_author(&doc.key).await? {
            return Ok(Some(author));
        }

        Ok(doc.name.map(|name| ProviderAuthor {
            author_id: AuthorId::new(doc.key.clone()),
            author_name: name,
            author_link: Some(self.author_link(&doc.key)),
            author_img: None,
            author_born: doc.birth_date,
            author_death: doc.death_date,
        }))
    }

    pub async fn get_author(&self, key: &str) -> Result<Option<ProviderAuthor>> {
        let url = format!("{}/authors/{}.json", self.base_url, key);

        let Some(record) = self.get_json::<AuthorRecord>(&url).await? else {
            return Ok(None);
        };

        let Some(name) = record.name.or(record.personal_name) else {
            return Ok(None);
        };

        // negative photo ids are Open Library's marker for deleted images
        let author_img = record
            .photos
            .iter()
            .find(|id| **id > 0)
            .map(|id| format!("{COVERS_URL}/a/id/{id}-L.jpg"));

        Ok(Some(ProviderAuthor {
            author_id: AuthorId::new(key),
            author_name: name,
            author_link: Some(self.author_link(key)),
            author_img,
            author_born: record.birth_date,
            author_death: record.death_date,
        }))
    }

    pub async fn get_author_works(
        &self,
        key: &str,
        author_name: &str,
    ) -> Result<Option<Vec<ProviderBook>>> {
        let url = format!(
            "{}/search.json?q=author_key:{}&fields=key,title,author_name,author_key,first_publish_year,cover_i,isbn,ratings_count&limit={}",
            self.base_url, key, MAX_AUTHOR_BOOKS
        );

        let Some(response) = self.get_json::<WorkSearchResponse>(&url).await? else {
            return Ok(None);
        };

        let books = response
            .docs
            .into_iter()
            .filter_map(|doc| {
                let work_key = doc.key.trim_start_matches("/works/").to_string();
                let title = doc.title?;
                Some(ProviderBook {
                    book_id: BookId::new(work_key.clone()),
                    author_id: AuthorId::new(key),
                    author_name: author_name.to_string(),
                    title,
                    link: Some(self.work_link(&work_key)),
                    date: doc.first_publish_year.map(|y| y.to_string()),
                    isbn: doc.isbn.into_iter().next(),
                    image: doc.cover_i.map(|id| format!("{COVERS_URL}/b/id/{id}-L.jpg")),
                    description: None,
                    series: Vec::new(),
                    known_status: None,
                    known_audio_status: None,
                })
            })
            .collect();

        Ok(Some(books))
    }

    pub async fn get_work(&self, key: &str) -> Result<Option<ProviderBook>> {
        let url = format!("{}/works/{}.json", self.base_url, key);

        let Some(work) = self.get_json::<WorkRecord>(&url).await? else {
            return Ok(None);
        };

        let Some(author_key) = work
            .authors
            .first()
            .map(|a| a.author.key.trim_start_matches("/authors/").to_string())
        else {
            return Ok(None);
        };

        let author_name = self
            .get_author(&author_key)
            .await?
            .map(|a| a.author_name)
            .unwrap_or_default();

        Ok(work.title.map(|title| ProviderBook {
            book_id: BookId::new(key),
            author_id: AuthorId::new(author_key),
            author_name,
            title,
            link: Some(self.work_link(key)),
            date: work.first_publish_date,
            isbn: None,
            image: work
                .covers
                .iter()
                .find(|id| **id > 0)
                .map(|id| format!("{COVERS_URL}/b/id/{id}-L.jpg")),
            description: work.description.map(TextValue::into_string),
            series: Vec::new(),
            known_status: None,
            known_audio_status: None,
        }))
    }

    pub async fn search_works(&self, term: &str) -> Result<Option<Vec<SearchHit>>> {
        let url = format!(
            "{}/search.json?q={}&fields=key,title,author_name,author_key,first_publish_year,cover_i,ratings_count&limit={}",
            self.base_url,
            urlencoding::encode(term),
            MAX_SEARCH_RESULTS
        );

        let Some(response) = self.get_json::<WorkSearchResponse>(&url).await? else {
            return Ok(None);
        };

        let term_key = comparison_key(term);
        let hits = response
            .docs
            .into_iter()
            .filter_map(|doc| {
                let title = doc.title?;
                let author_name = doc.author_name.into_iter().next().unwrap_or_default();
                let relevance = similarity(&term_key, &comparison_key(&title))
                    .max(similarity(&term_key, &comparison_key(&author_name)));
                Some(SearchHit {
                    book_id: BookId::new(doc.key.trim_start_matches("/works/")),
                    book_name: title,
                    author_id: AuthorId::new(doc.author_key.into_iter().next().unwrap_or_default()),
                    author_name,
                    book_date: doc.first_publish_year.map(|y| y.to_string()),
                    image: doc.cover_i.map(|id| format!("{COVERS_URL}/b/id/{id}-M.jpg")),
                    relevance,
                    reviews: doc.ratings_count.unwrap_or(0),
                    in_catalog: false,
                })
            })
            .collect();

        Ok(Some(hits))
    }
}

#[async_trait::async_trait]
impl BookProvider for OpenLibraryClient {
    fn name(&self) -> &'static str {
        "OpenLibrary"
    }

    async fn find_author(&self, query: &str) -> Lookup<ProviderAuthor> {
        self.search_author(query).await.into()
    }

    async fn author_info(&self, author_id: &AuthorId) -> Lookup<ProviderAuthor> {
        self.get_author(author_id.as_str()).await.into()
    }

    async fn author_books(
        &self,
        author_id: &AuthorId,
        author_name: &str,
    ) -> Lookup<Vec<ProviderBook>> {
        self.get_author_works(author_id.as_str(), author_name)
            .await
            .into()
    }

    async fn find_book(&self, book_id: &BookId) -> Lookup<ProviderBook> {
        self.get_work(book_id.as_str()).await.into()
    }

    async fn search(&self, term: &str) -> Lookup<Vec<SearchHit>> {
        self.search_works(term).await.into()
    }

    async fn author_image(&self, author_id: &AuthorId) -> Lookup<String> {
        // the olid cover endpoint 404s instead of serving a blank when default=false
        let url = format!(
            "{COVERS_URL}/a/olid/{}-L.jpg?default=false",
            author_id.as_str()
        );
        let result = self.client.head(&url).send().await;
        match result {
            Ok(response) if response.status().is_success() => {
                Lookup::Found(url.trim_end_matches("?default=false").to_string())
            }
            Ok(_) => Lookup::NotFound,
            Err(e) => Lookup::TransportError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_value_accepts_both_shapes() {
        let plain: TextValue = serde_json::from_str(r#""A novel.""#).unwrap();
        assert_eq!(plain.into_string(), "A novel.");

        let typed: TextValue =
            serde_json::from_str(r#"{"type": "/type/text", "value": "A saga."}"#).unwrap();
        assert_eq!(typed.into_string(), "A saga.");
    }

    #[test]
    fn author_record_parses_sparse_payload() {
        let json = r#"{"key": "/authors/OL26320A", "name": "J.R.R. Tolkien", "photos": [-1, 6155606]}"#;
        let record: AuthorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name.as_deref(), Some("J.R.R. Tolkien"));
        assert_eq!(record.photos.iter().find(|id| **id > 0), Some(&6_155_606));
        assert!(record.birth_date.is_none());
    }

    #[test]
    fn links_use_configured_base() {
        let config = ProvidersConfig {
            open_library_url: "http://localhost:9000/".to_string(),
            ..ProvidersConfig::default()
        };
        let client = OpenLibraryClient::new(&config);
        assert_eq!(
            client.author_link("OL1A"),
            "http://localhost:9000/authors/OL1A"
        );
        assert_eq!(client.work_link("OL2W"), "http://localhost:9000/works/OL2W");
    }
}
