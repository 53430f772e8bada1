use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Author,
    Book,
}

impl ImageKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Book => "book",
        }
    }
}

/// Local copies of remote images.
#[async_trait::async_trait]
pub trait ImageCache: Send + Sync {
    /// Caches `url` for the given record and returns the stored reference,
    /// `cache/<kind>/<id>.jpg`.
    ///
    /// An already cached file is reused unless `refresh` is set.
    async fn cache(&self, kind: ImageKind, id: &str, url: &str, refresh: bool) -> Result<String>;
}

/// [`ImageCache`] writing under the configured images directory.
pub struct FsImageCache {
    images_dir: PathBuf,
    client: reqwest::Client,
}

impl FsImageCache {
    pub fn new(images_path: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build image HTTP client")?;

        Ok(Self {
            images_dir: PathBuf::from(images_path),
            client,
        })
    }

    fn file_name(id: &str) -> String {
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{safe}.jpg")
    }

    fn target(&self, kind: ImageKind, file_name: &str) -> PathBuf {
        self.images_dir.join(kind.as_str()).join(file_name)
    }
}

#[async_trait::async_trait]
impl ImageCache for FsImageCache {
    async fn cache(&self, kind: ImageKind, id: &str, url: &str, refresh: bool) -> Result<String> {
        let file_name = Self::file_name(id);
        let reference = format!("cache/{}/{file_name}", kind.as_str());
        let file_path = self.target(kind, &file_name);

        if !refresh && Path::new(&file_path).exists() {
            debug!(path = %file_path.display(), "Image already cached");
            return Ok(reference);
        }

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        info!(url = %url, path = %file_path.display(), "Downloading image");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            anyhow::bail!("Empty image body from {url}");
        }

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        Ok(reference)
    }
}
