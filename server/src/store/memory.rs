use async_trait::async_trait;
use tokio::sync::RwLock;
use todo_core::{Result, TodoChanges, TodoError, TodoId, TodoRecord};

use super::TodoStore;

/// In-process store. Records keep their insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<TodoRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert(&self, record: &TodoRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(TodoError::Storage(format!("duplicate key: {}", record.id)));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TodoRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn update_by_id(&self, id: TodoId, changes: &TodoChanges) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_hex()))?;
        changes.apply(record);
        Ok(())
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<()> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_hex()))?;
        records.remove(index);
        Ok(())
    }
}
