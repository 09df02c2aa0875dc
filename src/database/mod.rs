//! Post storage.
//!
//! [`PostStore`] is the seam the views depend on. [`MemoryStore`] is the
//! in-process implementation the binary uses, optionally seeded from a JSON
//! fixture file.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// A persisted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: String,
}

/// A post that has not been assigned an id yet; one row of a fixture file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("post store unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to the post collection.
pub trait PostStore: Send + Sync + 'static {
    /// Every post, in insertion order.
    fn all(&self) -> impl Future<Output = Result<Vec<Post>, StoreError>> + Send;

    /// Stores `post` and returns it with its assigned id.
    fn insert(&self, post: NewPost) -> impl Future<Output = Result<Post, StoreError>> + Send;
}

/// Posts kept in memory behind an async read/write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store holding `posts`, ids assigned from 1 in iteration order.
    pub fn seeded(posts: impl IntoIterator<Item = NewPost>) -> Self {
        let posts = posts
            .into_iter()
            .zip(1..)
            .map(|(p, id)| Post {
                id,
                title: p.title,
                content: p.content,
                author: p.author,
            })
            .collect();
        Self {
            posts: RwLock::new(posts),
        }
    }

    /// Loads a JSON array of [`NewPost`] from `path`.
    pub async fn from_fixture(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|source| StoreError::Io {
            path: path.to_owned(),
            source,
        })?;
        let rows: Vec<NewPost> =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Fixture {
                path: path.to_owned(),
                source,
            })?;

        debug!(path = %path.display(), count = rows.len(), "loaded post fixture");
        Ok(Self::seeded(rows))
    }
}

impl PostStore for MemoryStore {
    async fn all(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.posts.read().await.clone())
    }

    async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut posts = self.posts.write().await;
        let id = posts.last().map_or(1, |p| p.id + 1);
        let post = Post {
            id,
            title: post.title,
            content: post.content,
            author: post.author,
        };
        posts.push(post.clone());
        Ok(post)
    }
}
