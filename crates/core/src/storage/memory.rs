use crate::domain::template::{NewTemplate, StoredEntry, TemplateRow};
use crate::storage::templates::TemplateStore;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Process-local store used by tests. Ids are assigned in insertion order.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    entries: BTreeMap<i64, StoredEntry>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw row as-is, bypassing validation. Useful for reproducing rows written by
    /// older clients.
    pub async fn insert_raw(&self, owner_id: i64, row: TemplateRow) -> i64 {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.insert(id, StoredEntry { id, owner_id, row });
        id
    }
}

#[async_trait::async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn fetch_templates(&self, owner_id: i64) -> anyhow::Result<Vec<TemplateRow>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .values()
            .filter(|e| e.owner_id == owner_id)
            .map(|e| e.row.clone())
            .collect())
    }

    async fn fetch_entries(&self, owner_id: i64) -> anyhow::Result<Vec<StoredEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn insert_template(&self, owner_id: i64, template: &NewTemplate) -> anyhow::Result<i64> {
        Ok(self.insert_raw(owner_id, template.to_row()).await)
    }

    async fn update_template(&self, id: i64, template: &NewTemplate) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.entries.get_mut(&id) else {
            return Ok(false);
        };
        entry.row = template.to_row();
        Ok(true)
    }

    async fn delete_template(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.entries.remove(&id).is_some())
    }
}
