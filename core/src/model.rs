//! Storage-side model: the document persisted in the todo collection.

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use bson::{DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::error::TodoError;

/// Identifier of a stored todo. Wraps the 12-byte BSON ObjectId; its text
/// form is the 24-character lowercase hex encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(ObjectId);

impl TodoId {
    pub fn generate() -> Self {
        TodoId(ObjectId::new())
    }

    pub fn as_object_id(&self) -> ObjectId {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl From<ObjectId> for TodoId {
    fn from(oid: ObjectId) -> Self {
        TodoId(oid)
    }
}

impl FromStr for TodoId {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(TodoId)
            .map_err(|_| TodoError::MalformedInput(format!("invalid todo id: {s:?}")))
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

/// A todo as stored in the document database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoRecord {
    #[serde(rename = "_id")]
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime,
}

impl TodoRecord {
    /// Builds a fresh, not yet completed record stamped with the current time.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TodoId::generate(),
            title: title.into(),
            completed: false,
            created_at: DateTime::now(),
        }
    }
}

/// A validated partial update. Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }

    pub fn apply(&self, record: &mut TodoRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(completed) = self.completed {
            record.completed = completed;
        }
    }

    /// The body of a `$set` update holding only the changed fields.
    pub fn to_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(title) = &self.title {
            set.insert("title", title.as_str());
        }
        if let Some(completed) = self.completed {
            set.insert("completed", completed);
        }
        set
    }
}
