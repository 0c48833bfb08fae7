//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{House, NewReply, NewThread, Thread, ThreadDetail};

/// Data persistence contract for houses, threads, posts and replies.
///
/// Implementations own the mapping from raw rows to the records in
/// [`crate::models`] and must enforce uniqueness and referential integrity
/// through the store itself.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ForumRepo: Send + Sync {
    // House Operations

    /// All houses, newest first.
    async fn list_houses(&self) -> Result<Vec<House>>;
    /// Fails with `AppError::DuplicateName` when the name is taken.
    async fn create_house(&self, name: &str) -> Result<House>;
    async fn get_house(&self, id: i64) -> Result<Option<House>>;

    // Thread Operations

    /// Threads of one house, newest first.
    async fn list_threads(&self, house_id: i64) -> Result<Vec<Thread>>;
    /// Inserts the Thread and its opening Post in one transaction and
    /// returns the new thread id.
    async fn create_thread(&self, thread: NewThread) -> Result<i64>;
    async fn get_thread(&self, id: i64) -> Result<Option<ThreadDetail>>;

    // Reply Operations

    /// Appends a reply and returns the id of the thread owning the post.
    /// Fails with `AppError::NotFound` when the post does not exist.
    async fn create_reply(&self, reply: NewReply) -> Result<i64>;
}

/// Pseudonymous identity contract.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    /// One-way digest of a tripcode secret. The secret itself is never stored.
    fn hash_tripcode(&self, secret: &str) -> String;
}
