use crate::domain::{AuthorStatus, BookStatus};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub import: ImportConfig,

    pub providers: ProvidersConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,

    /// Directory for cached author and book images.
    pub images_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/bookarr.db".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            images_path: "images".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

/// Which provider drives author and book lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookApi {
    #[default]
    OpenLibrary,
    GoogleBooks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Allow unknown authors to be created from a typed name.
    pub add_author: bool,

    pub book_api: BookApi,

    /// Book status given to the back catalogue of a newly added author.
    pub new_author_status: BookStatus,

    pub new_author_audio: BookStatus,

    /// Book status given to new releases of an author already in the catalog.
    pub new_book_status: BookStatus,

    pub new_audio_status: BookStatus,

    /// Status an author created from a typed name ends in.
    pub new_author_entry_status: AuthorStatus,

    /// Ask the provider to follow every newly added author.
    pub follow_new_authors: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            add_author: true,
            book_api: BookApi::default(),
            new_author_status: BookStatus::Skipped,
            new_author_audio: BookStatus::Skipped,
            new_book_status: BookStatus::Skipped,
            new_audio_status: BookStatus::Skipped,
            new_author_entry_status: AuthorStatus::Active,
            follow_new_authors: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub open_library_url: String,

    pub google_books_url: String,

    pub google_api_key: Option<String>,

    pub user_agent: String,

    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            open_library_url: "https://openlibrary.org".to_string(),
            google_books_url: "https://www.googleapis.com/books/v1".to_string(),
            google_api_key: None,
            user_agent: "Bookarr/0.1".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "bookarr".to_string());

        Self {
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

/// Book statuses applied to books seen for the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookStatusPolicy {
    pub book: BookStatus,
    pub audio: BookStatus,
}

/// Immutable import policy handed to the ingestion pipeline.
///
/// Built once from [`Config`]; the pipeline never reads configuration on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPolicy {
    pub add_author: bool,
    pub new_author_books: BookStatusPolicy,
    pub existing_author_books: BookStatusPolicy,
    pub new_author_entry_status: AuthorStatus,
    pub follow_new_authors: bool,
}

impl ImportPolicy {
    #[must_use]
    pub const fn books_for(&self, new_author: bool) -> BookStatusPolicy {
        if new_author {
            self.new_author_books
        } else {
            self.existing_author_books
        }
    }
}

impl Default for ImportPolicy {
    fn default() -> Self {
        ImportConfig::default().policy()
    }
}

impl ImportConfig {
    #[must_use]
    pub const fn policy(&self) -> ImportPolicy {
        ImportPolicy {
            add_author: self.add_author,
            new_author_books: BookStatusPolicy {
                book: self.new_author_status,
                audio: self.new_author_audio,
            },
            existing_author_books: BookStatusPolicy {
                book: self.new_book_status,
                audio: self.new_audio_status,
            },
            new_author_entry_status: self.new_author_entry_status,
            follow_new_authors: self.follow_new_authors,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bookarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".bookarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.import.new_author_entry_status.is_terminal() {
            anyhow::bail!(
                "import.new_author_entry_status must be Active, Wanted, Ignored or Paused"
            );
        }

        let provider_url = match self.import.book_api {
            BookApi::OpenLibrary => &self.providers.open_library_url,
            BookApi::GoogleBooks => &self.providers.google_books_url,
        };
        if provider_url.is_empty() {
            anyhow::bail!("Base URL for {:?} cannot be empty", self.import.book_api);
        }

        if self.observability.loki_enabled && self.observability.loki_url.is_empty() {
            anyhow::bail!("Loki URL cannot be empty when enabled");
        }

        Ok(())
    }

    #[must_use]
    pub const fn import_policy(&self) -> ImportPolicy {
        self.import.policy()
    }
}
