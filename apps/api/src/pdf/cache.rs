//! Content-addressed cache of rendered PDFs.
//!
//! Key = SHA-256 of the serialized `RenderInput`, so any change to resume content or
//! document settings yields a new key. Entries expire after the TTL; a background task
//! calls `sweep()` periodically to drop them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::pdf::document::RenderInput;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    pdf: Bytes,
    inserted_at: Instant,
}

pub struct PdfCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl PdfCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached PDF if present and not expired.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.pdf.clone())
    }

    pub async fn insert(&self, key: String, pdf: Bytes) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                pdf,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops expired entries, returning how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Spawns the periodic sweeper. The task runs for the life of the process.
pub fn spawn_sweeper(cache: Arc<PdfCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.sweep().await;
            if removed > 0 {
                debug!("PDF cache sweep removed {removed} expired entries");
            }
        }
    })
}

pub fn cache_key(input: &RenderInput) -> Result<String, serde_json::Error> {
    let serialized = serde_json::to_vec(input)?;
    Ok(hex::encode(Sha256::digest(&serialized)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ContactInfo;
    use crate::models::sections::{default_section_order, SectionConfigs, SectionContent};
    use crate::pdf::settings::DocumentSettings;

    fn input() -> RenderInput {
        RenderInput {
            contact: ContactInfo {
                first_name: Some("Grace".to_string()),
                ..Default::default()
            },
            target_role: "Engineer".to_string(),
            sections: SectionContent::default(),
            section_order: default_section_order(),
            section_configs: SectionConfigs::new(),
            document_settings: DocumentSettings::default(),
        }
    }

    #[test]
    fn test_identical_content_same_key() {
        assert_eq!(cache_key(&input()).unwrap(), cache_key(&input()).unwrap());
    }

    #[test]
    fn test_any_settings_change_changes_key() {
        let base = cache_key(&input()).unwrap();

        let mut changed = input();
        changed.document_settings.projects_item_spacing += 0.5;
        assert_ne!(base, cache_key(&changed).unwrap());

        let mut toggled = input();
        toggled.document_settings.show_footer = true;
        assert_ne!(base, cache_key(&toggled).unwrap());
    }

    #[test]
    fn test_content_change_changes_key() {
        let mut changed = input();
        changed.target_role = "Manager".to_string();
        assert_ne!(cache_key(&input()).unwrap(), cache_key(&changed).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = PdfCache::new(DEFAULT_TTL);
        cache.insert("k".to_string(), Bytes::from_static(b"%PDF")).await;
        assert_eq!(cache.get("k").await, Some(Bytes::from_static(b"%PDF")));

        tokio::time::advance(DEFAULT_TTL - Duration::from_secs(1)).await;
        assert!(cache.get("k").await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.sweep().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_fresh_entries() {
        let cache = PdfCache::new(Duration::from_secs(60));
        cache.insert("old".to_string(), Bytes::from_static(b"a")).await;
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.insert("new".to_string(), Bytes::from_static(b"b")).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.sweep().await, 1);
        assert!(cache.get("new").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_evicts() {
        let cache = Arc::new(PdfCache::new(Duration::from_secs(10)));
        cache.insert("k".to_string(), Bytes::from_static(b"a")).await;
        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(cache.len().await, 0);
        handle.abort();
    }
}
