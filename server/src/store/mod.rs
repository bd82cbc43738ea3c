//! Persistence gateway over the todo collection.
//!
//! # Design
//! Handlers only see `Arc<dyn TodoStore>`. `MongoStore` talks to the document
//! database; `MemoryStore` keeps records in process and backs the tests. Both
//! report a missing id as `TodoError::NotFound` and everything else the
//! backend rejects as `TodoError::Storage`.

use async_trait::async_trait;
use todo_core::{Result, TodoChanges, TodoId, TodoRecord};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    async fn insert(&self, record: &TodoRecord) -> Result<()>;

    /// Every record in the collection, in whatever order the backend yields.
    async fn find_all(&self) -> Result<Vec<TodoRecord>>;

    /// Apply `changes` to the record with `id`. An empty change set only
    /// checks that the record exists.
    async fn update_by_id(&self, id: TodoId, changes: &TodoChanges) -> Result<()>;

    async fn delete_by_id(&self, id: TodoId) -> Result<()>;
}
