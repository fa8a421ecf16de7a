//! Token image cache: per-resource images loaded asynchronously per entity.
//!
//! Loads run as tokio tasks and report back over an mpsc channel. The cache
//! itself is only touched from the event thread, in [`TokenImageCache::drain_completed`],
//! which drops results that were superseded by a newer request or whose
//! entity left the scene while the load was in flight. Entities whose image
//! is not ready yet are simply skipped by the renderer.

#[cfg(test)]
#[path = "images_test.rs"]
mod images_test;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::doc::{AssetResource, EntityId, SceneDoc};

/// Completed loads buffered between drains.
const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Decoded token art.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {url}")]
    NotFound { url: String },
    #[error("image fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("image decode failed: {0}")]
    Decode(String),
}

/// Source of token images. Implemented by the host's HTTP layer.
#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<TokenImage, ImageError>;
}

#[derive(Debug)]
struct Completion {
    entity_id: EntityId,
    resource_id: Uuid,
    generation: u64,
    result: Result<TokenImage, ImageError>,
}

#[derive(Debug)]
struct PendingLoad {
    resource_id: Uuid,
    generation: u64,
    handle: JoinHandle<()>,
}

/// Outcome of [`TokenImageCache::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The image is cached.
    Ready,
    /// A load is in flight.
    Pending,
    /// The resource failed before; it is not retried.
    Failed,
    /// No async runtime to run the load on.
    Unavailable,
}

pub struct TokenImageCache {
    fetcher: Arc<dyn ImageFetcher>,
    images: HashMap<Uuid, Arc<TokenImage>>,
    failed: HashSet<Uuid>,
    pending: HashMap<EntityId, PendingLoad>,
    next_generation: u64,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
    inbox: Vec<Completion>,
}

impl TokenImageCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        let (tx, rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            fetcher,
            images: HashMap::new(),
            failed: HashSet::new(),
            pending: HashMap::new(),
            next_generation: 0,
            tx,
            rx,
            inbox: Vec::new(),
        }
    }

    /// Cached image for a resource.
    #[must_use]
    pub fn image(&self, resource_id: &Uuid) -> Option<Arc<TokenImage>> {
        self.images.get(resource_id).cloned()
    }

    #[must_use]
    pub fn is_pending(&self, entity_id: &EntityId) -> bool {
        self.pending.contains_key(entity_id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Make sure `resource` is loaded for `entity_id`, starting a load if needed.
    ///
    /// A request for a different resource supersedes the entity's in-flight load.
    pub fn request(&mut self, entity_id: EntityId, resource: &AssetResource) -> LoadStatus {
        let resource_id = resource.resource_id;
        if self.images.contains_key(&resource_id) {
            return LoadStatus::Ready;
        }
        if self.failed.contains(&resource_id) {
            return LoadStatus::Failed;
        }
        if let Some(existing) = self.pending.get(&entity_id) {
            if existing.resource_id == resource_id {
                return LoadStatus::Pending;
            }
            self.cancel(&entity_id);
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(%entity_id, "no async runtime; token image not requested");
            return LoadStatus::Unavailable;
        };

        self.next_generation += 1;
        let generation = self.next_generation;
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let url = resource.url.clone();
        let handle = runtime.spawn(async move {
            let result = fetcher.fetch(&url).await;
            let completion = Completion { entity_id, resource_id, generation, result };
            if tx.send(completion).await.is_err() {
                debug!(%entity_id, "image cache dropped before load completed");
            }
        });
        self.pending.insert(entity_id, PendingLoad { resource_id, generation, handle });
        LoadStatus::Pending
    }

    /// Abort the entity's in-flight load, if any.
    pub fn cancel(&mut self, entity_id: &EntityId) -> bool {
        match self.pending.remove(entity_id) {
            Some(load) => {
                load.handle.abort();
                debug!(%entity_id, "token image load cancelled");
                true
            }
            None => false,
        }
    }

    /// Apply finished loads. Returns the entities whose image just became available.
    pub fn drain_completed(&mut self, doc: &SceneDoc) -> Vec<EntityId> {
        let mut completions = std::mem::take(&mut self.inbox);
        while let Ok(completion) = self.rx.try_recv() {
            completions.push(completion);
        }

        let mut ready = Vec::new();
        for completion in completions {
            let current = self
                .pending
                .get(&completion.entity_id)
                .is_some_and(|p| p.generation == completion.generation);
            if !current {
                debug!(entity_id = %completion.entity_id, "dropping superseded token image");
                continue;
            }
            self.pending.remove(&completion.entity_id);
            if !doc.contains(&completion.entity_id) {
                debug!(entity_id = %completion.entity_id, "entity removed during token image load");
                continue;
            }
            match completion.result {
                Ok(image) => {
                    self.images.insert(completion.resource_id, Arc::new(image));
                    ready.push(completion.entity_id);
                }
                Err(e) => {
                    warn!(error = %e, entity_id = %completion.entity_id, "token image failed to load");
                    self.failed.insert(completion.resource_id);
                }
            }
        }
        ready
    }

    /// Wait until every pending load has reported back. Results are applied by
    /// the next [`Self::drain_completed`].
    pub async fn settle(&mut self) {
        loop {
            let outstanding = self
                .pending
                .iter()
                .filter(|(id, p)| !self.inbox.iter().any(|c| c.entity_id == **id && c.generation == p.generation))
                .count();
            if outstanding == 0 {
                return;
            }
            match self.rx.recv().await {
                Some(completion) => self.inbox.push(completion),
                None => return,
            }
        }
    }
}

impl Drop for TokenImageCache {
    fn drop(&mut self) {
        for load in self.pending.values() {
            load.handle.abort();
        }
    }
}

impl std::fmt::Debug for TokenImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenImageCache")
            .field("images", &self.images.len())
            .field("failed", &self.failed.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
