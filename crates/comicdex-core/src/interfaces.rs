use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Comic, ComicKeyword, User};
use crate::error::Result;

/// Fetches one comic by its upstream numeric id.
#[async_trait]
pub trait ComicProvider: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Comic>;
}

/// Persists and retrieves comics. Every operation honors `cancel`: an
/// implementation should check it at the next natural I/O boundary and
/// return [`crate::error::Error::Cancelled`] if it has fired.
#[async_trait]
pub trait ComicRepository: Send + Sync {
    async fn all(&self, cancel: &CancellationToken) -> Result<Vec<Comic>>;
    async fn by_ids(&self, nums: &[i64], cancel: &CancellationToken) -> Result<Vec<Comic>>;
    async fn save(&self, comics: &[Comic], cancel: &CancellationToken) -> Result<()>;
}

/// Persists and retrieves the term -> comic-id inverted index.
#[async_trait]
pub trait KeywordRepository: Send + Sync {
    async fn lookup(&self, words: &[String], cancel: &CancellationToken) -> Result<Vec<ComicKeyword>>;
    async fn save(&self, entries: &[ComicKeyword], cancel: &CancellationToken) -> Result<()>;
}

/// Read-only access to provisioned user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn by_username(&self, username: &str) -> Result<User>;
}

/// Mints and verifies bearer tokens. Implemented by `comicdex-token`.
pub trait TokenManager: Send + Sync {
    fn token(&self, username: &str) -> Result<String>;
    fn verify(&self, token: &str) -> Result<String>;
}
