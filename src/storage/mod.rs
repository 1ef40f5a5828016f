//! File-backed conversation storage
//!
//! Each conversation is one pretty-printed JSON document under
//! `<data_dir>/conversations/<id>.json`. A summary index of every
//! conversation lives in `<data_dir>/conversations.json`.
//!
//! The two artifacts are written independently. `save` always writes the
//! document before the index, so a crash in between leaves an index entry
//! pointing at a valid (possibly stale) document, never an entry without
//! one.
//!
//! Read-modify-write sequences are serialized by a per-id lock and a
//! global index lock, always taken in that order. Files are replaced via a
//! temporary sibling and a rename so readers never observe partial writes.
//! Nothing is cached in memory; every call reads from disk.

use crate::error::{GatewayError, Result};
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

mod locks;
pub mod types;

use locks::KeyedLocks;
pub use types::{ConversationDocument, ConversationInput, IndexEntry, DEFAULT_TITLE};

const INDEX_FILE: &str = "conversations.json";
const CONVERSATIONS_DIR: &str = "conversations";
const MAX_ID_LEN: usize = 128;

/// Generate a new conversation id (32 lowercase hex characters)
///
/// # Examples
///
/// ```
/// use chatgate::storage::new_conversation_id;
///
/// let id = new_conversation_id();
/// assert_eq!(id.len(), 32);
/// assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
/// ```
pub fn new_conversation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Current UTC time as ISO-8601 with microseconds and a `+00:00` offset
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Whether `id` can be used as a document file name
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Storage backend for conversation documents and their index
#[derive(Debug)]
pub struct ConversationStore {
    conversations_dir: PathBuf,
    index_path: PathBuf,
    index_lock: Mutex<()>,
    conversation_locks: KeyedLocks,
}

impl ConversationStore {
    /// Open the store rooted at `data_dir`
    ///
    /// Creates the data and conversations directories and an empty index
    /// when they do not exist yet. An existing index is left untouched, even
    /// if it is corrupt.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the directories or the index
    /// cannot be created.
    pub async fn open<P: Into<PathBuf>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.into();
        let conversations_dir = data_dir.join(CONVERSATIONS_DIR);
        let index_path = data_dir.join(INDEX_FILE);

        tokio::fs::create_dir_all(&conversations_dir)
            .await
            .with_context(|| format!("Failed to create {}", conversations_dir.display()))
            .map_err(|e| GatewayError::Storage(format!("{:#}", e)))?;

        if !tokio::fs::try_exists(&index_path).await.unwrap_or(false) {
            write_atomic(&index_path, b"[]")
                .await
                .map_err(|e| GatewayError::Storage(format!("{:#}", e)))?;
            tracing::info!("Created empty conversation index at {}", index_path.display());
        }

        tracing::info!("Conversation store ready at {}", data_dir.display());

        Ok(Self {
            conversations_dir,
            index_path,
            index_lock: Mutex::new(()),
            conversation_locks: KeyedLocks::new(),
        })
    }

    /// Path of the index artifact
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Path of the document artifact for `id`
    pub fn conversation_path(&self, id: &str) -> PathBuf {
        self.conversations_dir.join(format!("{}.json", id))
    }

    /// List the index entries in stored order
    ///
    /// Never fails: a missing, unreadable or unparseable index yields an
    /// empty list and a warning.
    pub async fn list(&self) -> Vec<IndexEntry> {
        let _index = self.index_lock.lock().await;
        self.load_index().await
    }

    /// Fetch the full document for `id`
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` when no document exists for `id`.
    pub async fn get(&self, id: &str) -> Result<ConversationDocument> {
        if !is_valid_id(id) {
            return Err(GatewayError::NotFound.into());
        }

        let _conversation = self.conversation_locks.lock(id).await;
        self.load_document(id)
            .await?
            .ok_or_else(|| GatewayError::NotFound.into())
    }

    /// Create or replace a conversation and upsert its index entry
    ///
    /// Missing or empty `id`, `title` and `created_at` fall back to a new
    /// id, `"Untitled"` and the current time; `updated_at` is always the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidId` for ids that cannot name a file, or
    /// a storage error if writing fails.
    pub async fn save(&self, input: ConversationInput) -> Result<ConversationDocument> {
        let id = non_empty(input.id).unwrap_or_else(new_conversation_id);
        if !is_valid_id(&id) {
            return Err(GatewayError::InvalidId(id).into());
        }

        let now = now_rfc3339();
        let doc = ConversationDocument {
            title: non_empty(input.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            created_at: non_empty(input.created_at).unwrap_or_else(|| now.clone()),
            updated_at: now,
            system: input.system.unwrap_or_default(),
            settings: input.settings.unwrap_or_default(),
            messages: input.messages.unwrap_or_default(),
            id,
        };

        let _conversation = self.conversation_locks.lock(&doc.id).await;

        let bytes = serde_json::to_vec_pretty(&doc)?;
        write_atomic(&self.conversation_path(&doc.id), &bytes)
            .await
            .map_err(|e| GatewayError::Storage(format!("{:#}", e)))?;

        self.upsert_index_entry(IndexEntry::from(&doc)).await?;

        tracing::debug!(
            "Saved conversation {} ({} messages)",
            doc.id,
            doc.messages.len()
        );
        Ok(doc)
    }

    /// Delete a conversation and its index entry
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` when no document exists for `id`; in
    /// that case nothing is modified.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !is_valid_id(id) {
            return Err(GatewayError::NotFound.into());
        }

        let _conversation = self.conversation_locks.lock(id).await;

        let path = self.conversation_path(id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(GatewayError::NotFound.into());
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(GatewayError::Storage(format!(
                    "Failed to remove {}: {}",
                    path.display(),
                    e
                ))
                .into())
            }
        }

        let _index = self.index_lock.lock().await;
        let mut entries = self.load_index().await;
        entries.retain(|entry| entry.id != id);
        self.write_index(&entries).await?;

        tracing::debug!("Deleted conversation {}", id);
        Ok(())
    }

    async fn upsert_index_entry(&self, entry: IndexEntry) -> Result<()> {
        let _index = self.index_lock.lock().await;
        let mut entries = self.load_index().await;

        match entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => {
                existing.title = entry.title;
                existing.updated_at = entry.updated_at;
            }
            None => entries.push(entry),
        }

        self.write_index(&entries).await
    }

    /// Caller must hold `index_lock`.
    async fn load_index(&self) -> Vec<IndexEntry> {
        let bytes = match tokio::fs::read(&self.index_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(
                    "Failed to read conversation index {}: {}",
                    self.index_path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Conversation index {} is malformed, treating it as empty: {}",
                    self.index_path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Caller must hold `index_lock`.
    async fn write_index(&self, entries: &[IndexEntry]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.index_path, &bytes)
            .await
            .map_err(|e| GatewayError::Storage(format!("{:#}", e)).into())
    }

    /// Caller must hold the conversation lock for `id`.
    async fn load_document(&self, id: &str) -> Result<Option<ConversationDocument>> {
        let path = self.conversation_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(GatewayError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
                .into())
            }
        };

        let doc: ConversationDocument = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(doc))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
