//! Persistence accessor for todo records.
//!
//! # Design
//! Handlers only see the [`TodoStore`] trait, so any document or relational
//! backend with server-assigned identifiers can sit behind the API.
//! [`DocumentStore`] is the bundled backend: an insertion-ordered collection
//! of JSON documents keyed by UUID, optionally mirrored to a data file.
//!
//! Identifiers arrive as raw path segments and are parsed here, so a
//! malformed id is a storage failure like any other.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{CreateTodo, Todo, UpdateTodo};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Todo validation failed: {0}")]
    Validation(String),

    #[error("Invalid todo id \"{0}\"")]
    InvalidId(String),

    #[error("Failed to access data file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data file {} is not a valid todo collection: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode todo collection for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load/save/update/delete of todo records by identifier.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Insert a new record with a fresh identifier and `completed = false`.
    async fn create(&self, input: CreateTodo) -> Result<Todo, StoreError>;

    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<Todo>, StoreError>;

    /// Merge the present fields of `patch` into the record and return the
    /// full post-merge record. `Ok(None)` when no record has this id.
    async fn update(&self, id: &str, patch: UpdateTodo) -> Result<Option<Todo>, StoreError>;

    /// Remove the record if present. Removing an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// One stored record. Timestamps stay in storage and never reach the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Document {
    #[serde(flatten)]
    todo: Todo,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: RwLock<Vec<Document>>,
    path: Option<PathBuf>,
}

impl DocumentStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store mirrored to `path`. A missing file starts an empty
    /// collection; the file is created on the first mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let docs = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::info!(path = %path.display(), count = docs.len(), "Loaded todo data file");
        Ok(Self {
            docs: RwLock::new(docs),
            path: Some(path),
        })
    }

    /// Rewrite the data file from `docs`. Writes a sibling temp file first so
    /// a crash mid-write never truncates the collection.
    async fn persist(&self, docs: &[Document]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(docs).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;
        let tmp = temp_path(path);
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for DocumentStore {
    async fn create(&self, input: CreateTodo) -> Result<Todo, StoreError> {
        require_title(&input.title)?;
        let now = Utc::now();
        let doc = Document {
            todo: Todo {
                id: Uuid::new_v4(),
                title: input.title,
                description: input.description,
                completed: false,
            },
            created_at: now,
            updated_at: now,
        };

        let mut docs = self.docs.write().await;
        docs.push(doc.clone());
        if let Err(err) = self.persist(&docs).await {
            docs.pop();
            return Err(err);
        }
        tracing::debug!(todo_id = %doc.todo.id, "Created todo");
        Ok(doc.todo)
    }

    async fn list_all(&self) -> Result<Vec<Todo>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().map(|doc| doc.todo.clone()).collect())
    }

    async fn update(&self, id: &str, patch: UpdateTodo) -> Result<Option<Todo>, StoreError> {
        let id = parse_id(id)?;
        if let Some(title) = &patch.title {
            require_title(title)?;
        }

        let mut docs = self.docs.write().await;
        let Some(index) = docs.iter().position(|doc| doc.todo.id == id) else {
            tracing::debug!(todo_id = %id, "Update matched no todo");
            return Ok(None);
        };

        let previous = docs[index].clone();
        let doc = &mut docs[index];
        if let Some(title) = patch.title {
            doc.todo.title = title;
        }
        if let Some(description) = patch.description {
            doc.todo.description = description;
        }
        if let Some(completed) = patch.completed {
            doc.todo.completed = completed;
        }
        doc.updated_at = Utc::now();
        let updated = doc.todo.clone();

        if let Err(err) = self.persist(&docs).await {
            docs[index] = previous;
            return Err(err);
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let mut docs = self.docs.write().await;
        let Some(index) = docs.iter().position(|doc| doc.todo.id == id) else {
            return Ok(());
        };

        let removed = docs.remove(index);
        if let Err(err) = self.persist(&docs).await {
            docs.insert(index, removed);
            return Err(err);
        }
        tracing::debug!(todo_id = %id, "Deleted todo");
        Ok(())
    }
}

fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

fn require_title(title: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("title is required".to_string()));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
