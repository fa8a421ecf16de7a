use std::sync::Mutex;

use tokio::sync::Notify;

use super::*;
use crate::camera::Point;
use crate::doc::{Asset, AssetKind, CreatureProperties, PlacedEntity, ResourceRole};
use crate::grid::Size;

// =============================================================
// Fetchers
// =============================================================

/// Resolves immediately; URLs containing "missing" fail.
struct StaticFetcher {
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    fn new() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()) })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<TokenImage, ImageError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        if url.contains("missing") {
            return Err(ImageError::NotFound { url: url.to_string() });
        }
        Ok(TokenImage { width: 2, height: 2, pixels: vec![255; 16] })
    }
}

/// Blocks every fetch until released.
struct GatedFetcher {
    gate: Notify,
}

#[async_trait::async_trait]
impl ImageFetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> Result<TokenImage, ImageError> {
        self.gate.notified().await;
        Ok(TokenImage { width: 1, height: 1, pixels: vec![0; 4] })
    }
}

// =============================================================
// Helpers
// =============================================================

fn resource(url: &str) -> AssetResource {
    AssetResource { resource_id: Uuid::new_v4(), role: ResourceRole::Token, url: url.into() }
}

fn scene_with_entity() -> (SceneDoc, EntityId) {
    let asset = Asset {
        id: Uuid::new_v4(),
        name: "Knight".into(),
        kind: AssetKind::Creature(CreatureProperties::default()),
        resources: Vec::new(),
    };
    let entity = PlacedEntity::new(&asset, Point::new(25.0, 25.0), Size::new(50.0, 50.0));
    let id = entity.id;
    let mut doc = SceneDoc::new();
    doc.insert_asset(asset);
    doc.insert(entity);
    (doc, id)
}

// =============================================================
// Loading
// =============================================================

#[tokio::test]
async fn load_populates_cache() {
    let (doc, id) = scene_with_entity();
    let fetcher = StaticFetcher::new();
    let mut cache = TokenImageCache::new(fetcher.clone());
    let res = resource("knight.png");

    assert_eq!(cache.request(id, &res), LoadStatus::Pending);
    assert!(cache.is_pending(&id));
    cache.settle().await;

    assert_eq!(cache.drain_completed(&doc), vec![id]);
    assert!(!cache.is_pending(&id));
    assert_eq!(cache.image(&res.resource_id).map(|img| img.width), Some(2));
    assert_eq!(cache.request(id, &res), LoadStatus::Ready);
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn duplicate_request_does_not_refetch() {
    let (doc, id) = scene_with_entity();
    let fetcher = StaticFetcher::new();
    let mut cache = TokenImageCache::new(fetcher.clone());
    let res = resource("knight.png");

    cache.request(id, &res);
    assert_eq!(cache.request(id, &res), LoadStatus::Pending);
    cache.settle().await;
    cache.drain_completed(&doc);
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn failed_load_is_skipped_and_not_retried() {
    let (doc, id) = scene_with_entity();
    let fetcher = StaticFetcher::new();
    let mut cache = TokenImageCache::new(fetcher.clone());
    let res = resource("missing.png");

    cache.request(id, &res);
    cache.settle().await;
    assert!(cache.drain_completed(&doc).is_empty());
    assert!(cache.image(&res.resource_id).is_none());
    assert_eq!(cache.request(id, &res), LoadStatus::Failed);
    assert_eq!(fetcher.call_count(), 1);
}

// =============================================================
// Cancellation
// =============================================================

#[tokio::test]
async fn removed_entity_result_is_dropped() {
    let (mut doc, id) = scene_with_entity();
    let fetcher = Arc::new(GatedFetcher { gate: Notify::new() });
    let mut cache = TokenImageCache::new(fetcher.clone());
    let res = resource("knight.png");

    cache.request(id, &res);
    doc.remove(&id);
    fetcher.gate.notify_one();
    cache.settle().await;

    assert!(cache.drain_completed(&doc).is_empty());
    assert!(cache.image(&res.resource_id).is_none());
    assert_eq!(cache.pending_count(), 0);
}

#[tokio::test]
async fn cancel_aborts_in_flight_load() {
    let (doc, id) = scene_with_entity();
    let fetcher = Arc::new(GatedFetcher { gate: Notify::new() });
    let mut cache = TokenImageCache::new(fetcher);
    let res = resource("knight.png");

    cache.request(id, &res);
    assert!(cache.cancel(&id));
    assert!(!cache.cancel(&id));
    cache.settle().await;
    assert!(cache.drain_completed(&doc).is_empty());
    assert!(cache.image(&res.resource_id).is_none());
}

#[tokio::test]
async fn newer_resource_supersedes_older() {
    let (doc, id) = scene_with_entity();
    let fetcher = StaticFetcher::new();
    let mut cache = TokenImageCache::new(fetcher);
    let old = resource("old.png");
    let new = resource("new.png");

    cache.request(id, &old);
    cache.request(id, &new);
    cache.settle().await;

    assert_eq!(cache.drain_completed(&doc), vec![id]);
    assert!(cache.image(&new.resource_id).is_some());
    assert!(cache.image(&old.resource_id).is_none());
}

// =============================================================
// Runtime availability
// =============================================================

#[test]
fn request_without_runtime_is_unavailable() {
    let (_doc, id) = scene_with_entity();
    let mut cache = TokenImageCache::new(StaticFetcher::new());
    assert_eq!(cache.request(id, &resource("knight.png")), LoadStatus::Unavailable);
    assert!(!cache.is_pending(&id));
}
