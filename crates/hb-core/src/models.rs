//! # Domain Models
//!
//! These structs represent the core entities of Houseboard.
//! Ids are assigned by the store and only ever grow, so id order is creation order.

use serde::{Deserialize, Serialize};

/// Number of hex characters of a tripcode hash shown next to a nickname.
pub const TRIPCODE_DISPLAY_LEN: usize = 10;

/// A top-level board (e.g., "Alpha").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: i64,
    /// Globally unique, trimmed, non-empty
    pub name: String,
}

/// A discussion inside a House, always paired with exactly one opening Post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub house_id: i64,
    pub title: String,
}

/// The opening message of a Thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub thread_id: i64,
    pub nickname: String,
    /// Hex digest of the poster's tripcode secret
    pub tripcode_hash: String,
    pub content: String,
}

/// A follow-up message attached to an opening Post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub post_id: i64,
    pub nickname: String,
    pub tripcode_hash: String,
    pub content: String,
}

impl Post {
    pub fn tripcode(&self) -> &str {
        short_tripcode(&self.tripcode_hash)
    }
}

impl Reply {
    pub fn tripcode(&self) -> &str {
        short_tripcode(&self.tripcode_hash)
    }
}

fn short_tripcode(hash: &str) -> &str {
    hash.get(..TRIPCODE_DISPLAY_LEN).unwrap_or(hash)
}

/// Everything the thread page shows: the Thread, its opening Post and the
/// Replies to that Post in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub post: Post,
    pub replies: Vec<Reply>,
}

/// Validated input for creating a Thread together with its opening Post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThread {
    pub house_id: i64,
    pub title: String,
    pub nickname: String,
    pub tripcode_hash: String,
    pub content: String,
}

/// Validated input for appending a Reply to a Post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReply {
    pub post_id: i64,
    pub nickname: String,
    pub tripcode_hash: String,
    pub content: String,
}
