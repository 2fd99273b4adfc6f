//! URL-keyed image cache with a stale-completion guard.
//!
//! The cache never performs I/O. [`ImageCache::sync`] records which URL
//! each role currently wants and queues a [`LoadTicket`] for every URL not
//! seen before; the host fetches the bytes and hands the result back
//! through [`ImageCache::complete`]. Data URIs are decoded inline.

use crate::bitmap::{ImageError, RasterImage, is_data_uri};
use std::collections::HashMap;
use thumb_core::{PhotoRole, ThumbnailConfig};

/// Which config field an image is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Background,
    Host,
    Guest,
}

impl ImageRole {
    pub const ALL: [ImageRole; 3] = [ImageRole::Background, ImageRole::Host, ImageRole::Guest];

    pub fn url<'a>(&self, config: &'a ThumbnailConfig) -> Option<&'a str> {
        match self {
            ImageRole::Background => config.background_image.as_deref(),
            ImageRole::Host => config.photo(PhotoRole::Host).map(|p| p.url.as_str()),
            ImageRole::Guest => config.photo(PhotoRole::Guest).map(|p| p.url.as_str()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRole::Background => "background",
            ImageRole::Host => "host",
            ImageRole::Guest => "guest",
        }
    }
}

impl From<PhotoRole> for ImageRole {
    fn from(role: PhotoRole) -> Self {
        match role {
            PhotoRole::Host => ImageRole::Host,
            PhotoRole::Guest => ImageRole::Guest,
        }
    }
}

/// A load the host must perform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub role: ImageRole,
    pub url: String,
}

#[derive(Debug, Clone)]
pub enum ImageState {
    Loading,
    Ready(RasterImage),
    Failed,
}

#[derive(Debug, Default)]
pub struct ImageCache {
    desired: HashMap<ImageRole, String>,
    entries: HashMap<String, ImageState>,
    pending: Vec<LoadTicket>,
    loaded: u64,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the URLs `config` wants and queue loads for unseen ones.
    ///
    /// A URL that failed before is retried when a role newly asks for it.
    /// Pending and failed attempts for URLs nobody wants are dropped.
    pub fn sync(&mut self, config: &ThumbnailConfig) {
        for role in ImageRole::ALL {
            let Some(url) = role.url(config).filter(|u| !u.trim().is_empty()) else {
                self.desired.remove(&role);
                continue;
            };
            let newly_desired = self.desired.get(&role).map(String::as_str) != Some(url);
            if newly_desired {
                self.desired.insert(role, url.to_owned());
            }
            match self.entries.get(url) {
                Some(ImageState::Failed) if newly_desired => {
                    log::debug!("retrying {} image: {url}", role.as_str());
                    self.entries.remove(url);
                }
                Some(_) => continue,
                None => {}
            }

            if is_data_uri(url) {
                let state = match RasterImage::from_data_uri(url) {
                    Ok(image) => {
                        self.loaded += 1;
                        ImageState::Ready(image)
                    }
                    Err(e) => {
                        log::warn!("{} image data URI rejected: {e}", role.as_str());
                        ImageState::Failed
                    }
                };
                self.entries.insert(url.to_owned(), state);
                continue;
            }

            log::debug!("queue {} image load: {url}", role.as_str());
            self.entries.insert(url.to_owned(), ImageState::Loading);
            self.pending.push(LoadTicket {
                role,
                url: url.to_owned(),
            });
        }
        self.drop_unwanted_attempts();
    }

    fn is_desired(&self, url: &str) -> bool {
        self.desired.values().any(|u| u == url)
    }

    /// Forget loads and failures for URLs no role wants. Ready images stay
    /// until [`ImageCache::evict_unused`] so undo can bring them back.
    fn drop_unwanted_attempts(&mut self) {
        let desired = &self.desired;
        let before = self.entries.len();
        self.entries
            .retain(|url, state| matches!(state, ImageState::Ready(_)) || desired.values().any(|u| u == url));
        self.pending.retain(|t| desired.values().any(|u| *u == t.url));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            log::trace!("dropped {dropped} superseded image load(s)");
        }
    }

    /// Drain the loads queued since the last call.
    pub fn take_pending(&mut self) -> Vec<LoadTicket> {
        std::mem::take(&mut self.pending)
    }

    /// Loads that were handed out and have not completed.
    pub fn in_flight(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, ImageState::Loading))
            .count()
    }

    /// Record the outcome of a load. Returns `true` when a redraw is due.
    ///
    /// A completion whose URL no role wants any more is dropped; it never
    /// touches the entry of whatever URL replaced it.
    pub fn complete(&mut self, ticket: &LoadTicket, result: Result<RasterImage, ImageError>) -> bool {
        let wanted = self.is_desired(&ticket.url);
        if !wanted {
            log::debug!("discarding stale {} load: {}", ticket.role.as_str(), ticket.url);
            if matches!(self.entries.get(&ticket.url), Some(ImageState::Loading)) {
                self.entries.remove(&ticket.url);
            }
            return false;
        }
        if !matches!(self.entries.get(&ticket.url), Some(ImageState::Loading)) {
            log::trace!("duplicate completion for {}", ticket.url);
            return false;
        }

        match result {
            Ok(image) => {
                log::debug!(
                    "{} image ready: {}x{} {}",
                    ticket.role.as_str(),
                    image.width(),
                    image.height(),
                    ticket.url
                );
                self.entries.insert(ticket.url.clone(), ImageState::Ready(image));
                self.loaded += 1;
                true
            }
            Err(e) => {
                log::warn!("{} image failed: {e}", ticket.role.as_str());
                self.entries.insert(ticket.url.clone(), ImageState::Failed);
                false
            }
        }
    }

    pub fn state(&self, url: &str) -> Option<&ImageState> {
        self.entries.get(url)
    }

    /// Ready image for `url`, if any.
    pub fn get(&self, url: &str) -> Option<&RasterImage> {
        match self.entries.get(url) {
            Some(ImageState::Ready(image)) => Some(image),
            _ => None,
        }
    }

    /// Ready image for whatever `role` currently wants.
    pub fn for_role(&self, role: ImageRole) -> Option<&RasterImage> {
        self.desired.get(&role).and_then(|url| self.get(url))
    }

    /// Number of images that became ready over the cache's lifetime.
    pub fn loaded_count(&self) -> u64 {
        self.loaded
    }

    /// Drop entries no role wants any more.
    pub fn evict_unused(&mut self) {
        let desired = &self.desired;
        self.entries.retain(|url, _| desired.values().any(|u| u == url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumb_core::PhotoConfig;

    fn image(key: &str) -> RasterImage {
        RasterImage::from_rgba(key, 1, 1, vec![0, 0, 0, 255]).unwrap()
    }

    fn config_with_host(url: &str) -> ThumbnailConfig {
        ThumbnailConfig {
            host_photo: Some(PhotoConfig::new(url)),
            ..Default::default()
        }
    }

    #[test]
    fn sync_queues_each_url_once() {
        let mut cache = ImageCache::new();
        let cfg = config_with_host("a.png");
        cache.sync(&cfg);
        cache.sync(&cfg);
        let pending = cache.take_pending();
        assert_eq!(
            pending,
            vec![LoadTicket {
                role: ImageRole::Host,
                url: "a.png".into()
            }]
        );
        assert!(cache.take_pending().is_empty());
        assert_eq!(cache.in_flight(), 1);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("a.png"));
        let ticket_a = cache.take_pending().remove(0);

        cache.sync(&config_with_host("b.png"));
        let ticket_b = cache.take_pending().remove(0);

        assert!(!cache.complete(&ticket_a, Ok(image("a.png"))));
        assert!(cache.get("a.png").is_none());
        assert!(matches!(cache.state("b.png"), Some(ImageState::Loading)));

        assert!(cache.complete(&ticket_b, Ok(image("b.png"))));
        assert_eq!(cache.for_role(ImageRole::Host).unwrap().key(), "b.png");
        assert_eq!(cache.loaded_count(), 1);
    }

    #[test]
    fn url_shared_by_two_roles_is_loaded_once() {
        let mut cache = ImageCache::new();
        let cfg = ThumbnailConfig {
            host_photo: Some(PhotoConfig::new("same.png")),
            guest_photo: Some(PhotoConfig::new("same.png")),
            ..Default::default()
        };
        cache.sync(&cfg);
        let pending = cache.take_pending();
        assert_eq!(pending.len(), 1);
        assert!(cache.complete(&pending[0], Ok(image("same.png"))));
        assert!(cache.for_role(ImageRole::Host).is_some());
        assert!(cache.for_role(ImageRole::Guest).is_some());
    }

    #[test]
    fn failure_leaves_role_empty() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("broken.png"));
        let ticket = cache.take_pending().remove(0);
        let redraw = cache.complete(&ticket, Err(ImageError::Unavailable("404".into())));
        assert!(!redraw);
        assert!(cache.for_role(ImageRole::Host).is_none());
        assert!(matches!(cache.state("broken.png"), Some(ImageState::Failed)));
    }

    #[test]
    fn cleared_role_stops_wanting_url() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("a.png"));
        let ticket = cache.take_pending().remove(0);
        cache.sync(&ThumbnailConfig::default());
        assert!(!cache.complete(&ticket, Ok(image("a.png"))));
        assert!(cache.state("a.png").is_none());
    }

    #[test]
    fn failed_url_is_retried_when_set_again() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("flaky.png"));
        let ticket = cache.take_pending().remove(0);
        cache.complete(&ticket, Err(ImageError::Unavailable("timeout".into())));

        cache.sync(&ThumbnailConfig::default());
        assert!(cache.state("flaky.png").is_none());

        cache.sync(&config_with_host("flaky.png"));
        assert_eq!(cache.take_pending(), vec![ticket]);
        assert!(matches!(cache.state("flaky.png"), Some(ImageState::Loading)));
    }

    #[test]
    fn failed_url_moved_to_another_role_is_retried() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("flaky.png"));
        let ticket = cache.take_pending().remove(0);
        cache.complete(&ticket, Err(ImageError::Unavailable("timeout".into())));

        cache.sync(&ThumbnailConfig {
            guest_photo: Some(PhotoConfig::new("flaky.png")),
            ..Default::default()
        });
        assert_eq!(
            cache.take_pending(),
            vec![LoadTicket {
                role: ImageRole::Guest,
                url: "flaky.png".into()
            }]
        );
    }

    #[test]
    fn unchanged_failed_url_is_not_requeued() {
        let mut cache = ImageCache::new();
        let cfg = config_with_host("broken.png");
        cache.sync(&cfg);
        let ticket = cache.take_pending().remove(0);
        cache.complete(&ticket, Err(ImageError::Unavailable("404".into())));
        cache.sync(&cfg);
        assert!(cache.take_pending().is_empty());
    }

    #[test]
    fn superseded_loads_are_forgotten() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("a.png"));
        cache.sync(&config_with_host("b.png"));
        let pending = cache.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "b.png");
        assert!(cache.state("a.png").is_none());
        assert_eq!(cache.in_flight(), 1);
    }

    #[test]
    fn ready_image_survives_until_evicted() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("a.png"));
        let ticket = cache.take_pending().remove(0);
        assert!(cache.complete(&ticket, Ok(image("a.png"))));

        cache.sync(&ThumbnailConfig::default());
        assert!(cache.get("a.png").is_some());
        cache.evict_unused();
        assert!(cache.get("a.png").is_none());
    }

    #[test]
    fn invalid_data_uri_fails_without_queueing() {
        let mut cache = ImageCache::new();
        cache.sync(&config_with_host("data:image/png;base64,!!!"));
        assert!(cache.take_pending().is_empty());
        assert!(matches!(
            cache.state("data:image/png;base64,!!!"),
            Some(ImageState::Failed)
        ));
    }
}
