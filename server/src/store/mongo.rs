use std::fmt;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use todo_core::{Result, TodoChanges, TodoError, TodoId, TodoRecord};
use tracing::{debug, info};

use super::TodoStore;
use crate::config::DatabaseConfig;

const APP_NAME: &str = "todo-server";

/// Store backed by a MongoDB collection. The driver's client pools its
/// connections internally, so one instance serves every request.
#[derive(Clone)]
pub struct MongoStore {
    collection: Collection<TodoRecord>,
}

impl MongoStore {
    /// Connect to the configured deployment and verify it answers a ping.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(TodoError::storage)?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = Client::with_options(options).map_err(TodoError::storage)?;
        let database = client.database(&config.name);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(TodoError::storage)?;
        info!(database = %config.name, collection = %config.collection, "connected to mongodb");

        Ok(Self::from_collection(database.collection(&config.collection)))
    }

    pub fn from_collection(collection: Collection<TodoRecord>) -> Self {
        Self { collection }
    }
}

impl fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStore")
            .field("collection", &self.collection.name())
            .finish()
    }
}

fn by_id(id: TodoId) -> Document {
    doc! { "_id": id.as_object_id() }
}

#[async_trait]
impl TodoStore for MongoStore {
    async fn insert(&self, record: &TodoRecord) -> Result<()> {
        self.collection
            .insert_one(record)
            .await
            .map_err(TodoError::storage)?;
        debug!(id = %record.id, "inserted todo");
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TodoRecord>> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(TodoError::storage)?;
        cursor.try_collect().await.map_err(TodoError::storage)
    }

    async fn update_by_id(&self, id: TodoId, changes: &TodoChanges) -> Result<()> {
        let matched = if changes.is_empty() {
            self.collection
                .count_documents(by_id(id))
                .await
                .map_err(TodoError::storage)?
        } else {
            self.collection
                .update_one(by_id(id), doc! { "$set": changes.to_document() })
                .await
                .map_err(TodoError::storage)?
                .matched_count
        };
        if matched == 0 {
            return Err(TodoError::NotFound(id.to_hex()));
        }
        debug!(%id, "updated todo");
        Ok(())
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<()> {
        let result = self
            .collection
            .delete_one(by_id(id))
            .await
            .map_err(TodoError::storage)?;
        if result.deleted_count == 0 {
            return Err(TodoError::NotFound(id.to_hex()));
        }
        debug!(%id, "deleted todo");
        Ok(())
    }
}
