//! Text and selector store operations

use super::model::{HostBucket, LocatorRecord, SiteSelectors, TextSnippet};
use super::KeyValueStore;
use crate::locator::LocatorPair;
use crate::utils::{Result, StorageError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Key holding the text snippets
pub const TEXTS_KEY: &str = "texts";
/// Key holding the hostname to bucket mapping
pub const SITE_SELECTORS_KEY: &str = "siteSelectors";

/// Result of saving a locator candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddSelectorOutcome {
    /// Appended with a fresh id
    Added(LocatorRecord),
    /// An existing record already shares a locator; nothing was written
    Duplicate,
}

/// Typed operations over a [`KeyValueStore`]
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get(key).await? {
            None | Some(serde_json::Value::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                StorageError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
                .into()
            }),
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.store.set(key, serde_json::to_value(value)?).await
    }

    // ---- texts ----

    /// Saved snippets; snippets stored without an id get one written back
    pub async fn get_texts(&self) -> Result<Vec<TextSnippet>> {
        let mut texts: Vec<TextSnippet> = self.load(TEXTS_KEY).await?;
        let assigned = texts.iter_mut().fold(false, |assigned, t| t.ensure_id() || assigned);
        if assigned {
            log::info!("assigned ids to stored texts");
            self.save(TEXTS_KEY, &texts).await?;
        }
        Ok(texts)
    }

    /// Create a snippet, or update the one with `id_to_update`
    ///
    /// An unknown id leaves the list unchanged.
    pub async fn save_text(&self, content: &str, id_to_update: Option<&str>) -> Result<Vec<TextSnippet>> {
        if content.trim().is_empty() {
            return Err(StorageError::EmptyText.into());
        }
        let mut texts = self.get_texts().await?;
        match id_to_update {
            Some(id) => {
                if let Some(snippet) = texts.iter_mut().find(|t| t.id == id) {
                    snippet.content = content.to_string();
                } else {
                    log::warn!("no text with id {id} to update");
                }
            }
            None => texts.push(TextSnippet::new(content)),
        }
        self.save(TEXTS_KEY, &texts).await?;
        Ok(texts)
    }

    pub async fn delete_text(&self, id: &str) -> Result<Vec<TextSnippet>> {
        let mut texts = self.get_texts().await?;
        texts.retain(|t| t.id != id);
        self.save(TEXTS_KEY, &texts).await?;
        Ok(texts)
    }

    // ---- selectors ----

    /// Every host's bucket; records stored without an id get one written back
    pub async fn get_site_selectors(&self) -> Result<SiteSelectors> {
        let mut sites: SiteSelectors = self.load(SITE_SELECTORS_KEY).await?;
        let assigned = sites
            .values_mut()
            .fold(false, |assigned, bucket| bucket.assign_missing_ids() || assigned);
        if assigned {
            log::info!("assigned ids to stored selectors");
            self.save_site_selectors(&sites).await?;
        }
        Ok(sites)
    }

    /// Bucket for one hostname, empty if none was saved
    pub async fn selectors_for_host(&self, hostname: &str) -> Result<HostBucket> {
        Ok(self
            .get_site_selectors()
            .await?
            .remove(hostname)
            .unwrap_or_default())
    }

    pub async fn save_site_selectors(&self, sites: &SiteSelectors) -> Result<()> {
        self.save(SITE_SELECTORS_KEY, sites).await
    }

    /// Append a candidate to a host's bucket unless it duplicates a record
    pub async fn add_selector_for_host(
        &self,
        hostname: &str,
        candidate: LocatorPair,
    ) -> Result<AddSelectorOutcome> {
        if candidate.is_empty() {
            return Err(StorageError::EmptyLocator.into());
        }
        let mut sites = self.get_site_selectors().await?;
        let bucket = sites.entry(hostname.to_string()).or_default();
        if bucket.contains_duplicate(&candidate) {
            log::info!("selector for {hostname} already saved");
            return Ok(AddSelectorOutcome::Duplicate);
        }

        let record = LocatorRecord::from_pair(candidate);
        bucket.push(record.clone());
        let total = bucket.len();
        self.save_site_selectors(&sites).await?;
        log::info!("saved selector for {hostname} ({total} total)");
        Ok(AddSelectorOutcome::Added(record))
    }

    /// Remove one record; the hostname key goes away with its last record
    pub async fn delete_selector(&self, hostname: &str, id: &str) -> Result<HostBucket> {
        if hostname.is_empty() {
            return Ok(HostBucket::new());
        }
        let mut sites = self.get_site_selectors().await?;
        let Some(bucket) = sites.get_mut(hostname) else {
            return Ok(HostBucket::new());
        };
        bucket.remove(id);
        let remaining = bucket.clone();
        if remaining.is_empty() {
            sites.remove(hostname);
        }
        self.save_site_selectors(&sites).await?;
        Ok(remaining)
    }

    /// Drop every record saved for a hostname
    pub async fn clear_all_selectors(&self, hostname: &str) -> Result<()> {
        if hostname.is_empty() {
            return Ok(());
        }
        let mut sites = self.get_site_selectors().await?;
        if sites.remove(hostname).is_some() {
            self.save_site_selectors(&sites).await?;
            log::info!("cleared selectors for {hostname}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, MockKeyValueStore};
    use crate::utils::InserterError;
    use pretty_assertions::assert_eq;

    fn service() -> StorageService {
        StorageService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_duplicate_candidate_is_not_saved() {
        let storage = service();
        let pair = LocatorPair::new("/html/body/input", "html > body > input");

        let first = storage.add_selector_for_host("a.test", pair.clone()).await.unwrap();
        assert!(matches!(first, AddSelectorOutcome::Added(_)));

        let again = storage
            .add_selector_for_host("a.test", LocatorPair::new("/other", "html > body > input"))
            .await
            .unwrap();
        assert_eq!(again, AddSelectorOutcome::Duplicate);
        assert_eq!(storage.selectors_for_host("a.test").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_buckets_keep_insertion_order_per_host() {
        let storage = service();
        for n in 0..3 {
            storage
                .add_selector_for_host("a.test", LocatorPair::new(format!("/x{n}"), format!("#x{n}")))
                .await
                .unwrap();
        }
        storage
            .add_selector_for_host("b.test", LocatorPair::new("/x0", "#x0"))
            .await
            .unwrap();

        let bucket = storage.selectors_for_host("a.test").await.unwrap();
        let css: Vec<_> = bucket.records().iter().filter_map(|r| r.css.as_deref()).collect();
        assert_eq!(css, vec!["#x0", "#x1", "#x2"]);
        assert_eq!(storage.selectors_for_host("b.test").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_last_record_removes_host() {
        let storage = service();
        let AddSelectorOutcome::Added(record) = storage
            .add_selector_for_host("a.test", LocatorPair::new("/x", "#x"))
            .await
            .unwrap()
        else {
            panic!("expected a new record");
        };

        let remaining = storage.delete_selector("a.test", &record.id).await.unwrap();
        assert!(remaining.is_empty());
        assert!(!storage.get_site_selectors().await.unwrap().contains_key("a.test"));
    }

    #[tokio::test]
    async fn test_clear_and_empty_host_noop() {
        let storage = service();
        storage
            .add_selector_for_host("a.test", LocatorPair::new("/x", "#x"))
            .await
            .unwrap();
        storage.clear_all_selectors("").await.unwrap();
        assert_eq!(storage.get_site_selectors().await.unwrap().len(), 1);
        storage.clear_all_selectors("a.test").await.unwrap();
        assert!(storage.get_site_selectors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_candidate_rejected() {
        let err = service()
            .add_selector_for_host("a.test", LocatorPair::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InserterError::Storage(StorageError::EmptyLocator)));
    }

    #[tokio::test]
    async fn test_text_crud() {
        let storage = service();
        let texts = storage.save_text("Hello", None).await.unwrap();
        let id = texts[0].id.clone();

        let texts = storage.save_text("Hello again", Some(&id)).await.unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].content, "Hello again");

        assert!(storage.save_text("   ", None).await.is_err());
        assert!(storage.delete_text(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_record_without_id_can_be_deleted() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                SITE_SELECTORS_KEY,
                serde_json::json!({"a.test": {"xpath": "/html/body/input", "css": "#x"}}),
            )
            .await
            .unwrap();
        let storage = StorageService::new(store);

        let listed = storage.selectors_for_host("a.test").await.unwrap();
        let id = listed.records()[0].id.clone();
        assert!(!id.is_empty());
        // the assigned id is stable across loads
        assert_eq!(storage.selectors_for_host("a.test").await.unwrap().records()[0].id, id);

        let remaining = storage.delete_selector("a.test", &id).await.unwrap();
        assert_eq!(remaining.len(), 0);
        assert!(!storage.get_site_selectors().await.unwrap().contains_key("a.test"));
    }

    #[tokio::test]
    async fn test_legacy_text_without_id_can_be_deleted() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(TEXTS_KEY, serde_json::json!([{"content": "old"}, {"id": "t2", "content": "new"}]))
            .await
            .unwrap();
        let storage = StorageService::new(store);

        let id = storage.get_texts().await.unwrap()[0].id.clone();
        let texts = storage.delete_text(&id).await.unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].id, "t2");
    }

    #[tokio::test]
    async fn test_backend_failure_propagates_without_write() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(StorageError::Backend("disk unplugged".into()).into()));
        store.expect_set().never();

        let storage = StorageService::new(Arc::new(store));
        let err = storage
            .add_selector_for_host("a.test", LocatorPair::new("/x", "#x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Storage error: backend failure: disk unplugged");
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .withf(|key| key.to_string() == TEXTS_KEY)
            .returning(|_| Ok(Some(serde_json::json!({"not": "a list"}))));

        let err = StorageService::new(Arc::new(store)).get_texts().await.unwrap_err();
        assert!(matches!(err, InserterError::Storage(StorageError::Corrupt { .. })));
    }
}
