//! Image fetching for the CLI: http(s) through `reqwest`, everything else
//! from disk. Data URIs never get here; the image cache decodes those
//! inline.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use thumb_render::{ImageError, LoadTicket, RasterImage};
use tokio::task::JoinSet;

const USER_AGENT: &str = concat!("thumb/", env!("CARGO_PKG_VERSION"));
const TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    #[error("timeout")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported URL scheme: {0}")]
    Scheme(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
            }
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Where an image URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Http(String),
    File(PathBuf),
}

impl Source {
    /// Classify `url`. Relative paths resolve against `base_dir`.
    pub fn resolve(url: &str, base_dir: &Path) -> Result<Self, FetchError> {
        let url = url.trim();
        let Some((scheme, rest)) = url.split_once("://") else {
            return Ok(Source::File(base_dir.join(url)));
        };
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(Source::Http(url.to_owned())),
            "file" => Ok(Source::File(PathBuf::from(rest))),
            _ => Err(FetchError::Scheme(scheme.to_owned())),
        }
    }
}

/// Fetches image bytes for load tickets. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    base_dir: PathBuf,
}

impl Fetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_dir: base_dir.into(),
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match Source::resolve(url, &self.base_dir)? {
            Source::Http(url) => {
                log::debug!("GET {url}");
                let response = self.client.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Http {
                        status: status.as_u16(),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
            Source::File(path) => {
                log::debug!("read {}", path.display());
                tokio::fs::read(&path)
                    .await
                    .map_err(|source| FetchError::Io { path, source })
            }
        }
    }

    /// Fetch and decode one ticket's image.
    pub async fn load(&self, url: &str) -> Result<RasterImage, ImageError> {
        let bytes = self
            .fetch(url)
            .await
            .map_err(|e| ImageError::Unavailable(e.to_string()))?;
        RasterImage::decode(url, &bytes)
    }

    /// Run every ticket concurrently; results come back in completion order.
    pub async fn load_all(
        &self,
        tickets: Vec<LoadTicket>,
    ) -> Vec<(LoadTicket, Result<RasterImage, ImageError>)> {
        let mut tasks = JoinSet::new();
        for ticket in tickets {
            let fetcher = self.clone();
            tasks.spawn(async move {
                let result = fetcher.load(&ticket.url).await;
                (ticket, result)
            });
        }

        let mut done = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => done.push(pair),
                Err(e) => log::warn!("image fetch task failed: {e}"),
            }
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_sources() {
        let base = Path::new("/work/configs");
        assert_eq!(
            Source::resolve("https://cdn.example.com/a.png", base).unwrap(),
            Source::Http("https://cdn.example.com/a.png".into())
        );
        assert_eq!(
            Source::resolve("file:///srv/img/b.jpg", base).unwrap(),
            Source::File(PathBuf::from("/srv/img/b.jpg"))
        );
        assert_eq!(
            Source::resolve("photos/host.png", base).unwrap(),
            Source::File(PathBuf::from("/work/configs/photos/host.png"))
        );
        assert_eq!(
            Source::resolve("/abs/host.png", base).unwrap(),
            Source::File(PathBuf::from("/abs/host.png"))
        );
        assert!(matches!(
            Source::resolve("ftp://old.example/a.png", base),
            Err(FetchError::Scheme(s)) if s == "ftp"
        ));
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path()).unwrap();
        let err = fetcher.load("nope.png").await.unwrap_err();
        assert!(matches!(err, ImageError::Unavailable(msg) if msg.contains("nope.png")));
    }

    #[tokio::test]
    async fn garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not an image").unwrap();
        let fetcher = Fetcher::new(dir.path()).unwrap();
        assert!(matches!(fetcher.load("bad.png").await, Err(ImageError::Decode(_))));
    }
}
