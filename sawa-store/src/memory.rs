use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use sawa_core::store::{
    matches_all, merge_patch, prepare_new, sort_documents, stamp_patch, Collection, Document, DocumentStore, Filter,
    StoreError, StoreResult,
};

/// Process-local document store. Every write takes the collection map's
/// write lock, which is what makes `update_document_if` atomic.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn query_documents(&self, collection: Collection, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.values().filter(|d| matches_all(filters, d)).cloned().collect())
            .unwrap_or_default();
        sort_documents(&mut found);
        Ok(found)
    }

    async fn add_document(&self, collection: Collection, mut data: Document) -> StoreResult<Document> {
        let id = prepare_new(&mut data)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::already_exists(collection, &id));
        }
        docs.insert(id, data.clone());
        Ok(data)
    }

    async fn update_document(&self, collection: Collection, id: &str, mut patch: Document) -> StoreResult<Document> {
        stamp_patch(&mut patch)?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        merge_patch(doc, &patch)?;
        Ok(doc.clone())
    }

    async fn update_document_if(
        &self,
        collection: Collection,
        id: &str,
        filters: &[Filter],
        mut patch: Document,
    ) -> StoreResult<Option<Document>> {
        stamp_patch(&mut patch)?;
        let mut collections = self.collections.write().await;
        let Some(doc) = collections.get_mut(&collection).and_then(|docs| docs.get_mut(id)) else {
            return Ok(None);
        };
        if !matches_all(filters, doc) {
            return Ok(None);
        }
        merge_patch(doc, &patch)?;
        Ok(Some(doc.clone()))
    }

    async fn set_document(&self, collection: Collection, id: &str, mut data: Document) -> StoreResult<Document> {
        if let Some(obj) = data.as_object_mut() {
            obj.insert("id".into(), serde_json::Value::String(id.to_string()));
        }
        prepare_new(&mut data)?;
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().insert(id.to_string(), data.clone());
        Ok(data)
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }
}
