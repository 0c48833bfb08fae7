//! # hb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `hb-core` domain models.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use hb_core::error::{AppError, Result};
use hb_core::models::{House, NewReply, NewThread, Post, Reply, Thread, ThreadDetail};
use hb_core::traits::ForumRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

/// Idempotent schema, applied every time the repo is opened.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS houses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS threads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        house_id INTEGER NOT NULL REFERENCES houses(id),
        title TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id INTEGER NOT NULL REFERENCES threads(id),
        nickname TEXT NOT NULL,
        tripcode_hash TEXT NOT NULL,
        content TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS replies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL REFERENCES posts(id),
        nickname TEXT NOT NULL,
        tripcode_hash TEXT NOT NULL,
        content TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_threads_house_id ON threads (house_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_thread_id ON posts (thread_id)",
    "CREATE INDEX IF NOT EXISTS idx_replies_post_id ON replies (post_id)",
];

pub struct SqliteForumRepo {
    pool: SqlitePool,
}

impl SqliteForumRepo {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    ///
    /// An in-memory database lives only as long as its connection, so for
    /// `sqlite::memory:` the pool is pinned to one connection that never expires.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(store_err)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(store_err)?;
        let repo = Self { pool };
        repo.init_schema().await?;
        log::info!("SQLite store ready at {url}");
        Ok(repo)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }
}

/// Not logged here: the HTTP layer logs failed requests once.
fn store_err(err: sqlx::Error) -> AppError {
    AppError::store(err)
}

fn house_from_row(row: &SqliteRow) -> std::result::Result<House, sqlx::Error> {
    Ok(House {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

fn thread_from_row(row: &SqliteRow) -> std::result::Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: row.try_get("id")?,
        house_id: row.try_get("house_id")?,
        title: row.try_get("title")?,
    })
}

fn post_from_row(row: &SqliteRow) -> std::result::Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        nickname: row.try_get("nickname")?,
        tripcode_hash: row.try_get("tripcode_hash")?,
        content: row.try_get("content")?,
    })
}

fn reply_from_row(row: &SqliteRow) -> std::result::Result<Reply, sqlx::Error> {
    Ok(Reply {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        nickname: row.try_get("nickname")?,
        tripcode_hash: row.try_get("tripcode_hash")?,
        content: row.try_get("content")?,
    })
}

#[async_trait]
impl ForumRepo for SqliteForumRepo {
    async fn list_houses(&self) -> Result<Vec<House>> {
        sqlx::query("SELECT id, name FROM houses ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?
            .iter()
            .map(house_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(store_err)
    }

    /// The UNIQUE constraint is the only duplicate check; two racing inserts
    /// of the same name leave exactly one row.
    async fn create_house(&self, name: &str) -> Result<House> {
        let inserted = sqlx::query("INSERT INTO houses (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(done) => Ok(House {
                id: done.last_insert_rowid(),
                name: name.to_string(),
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(store_err(e)),
        }
    }

    async fn get_house(&self, id: i64) -> Result<Option<House>> {
        let row = sqlx::query("SELECT id, name FROM houses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.as_ref().map(house_from_row).transpose().map_err(store_err)
    }

    async fn list_threads(&self, house_id: i64) -> Result<Vec<Thread>> {
        sqlx::query("SELECT id, house_id, title FROM threads WHERE house_id = ? ORDER BY id DESC")
            .bind(house_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?
            .iter()
            .map(thread_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(store_err)
    }

    /// Atomic operation to create a thread and its opening post.
    ///
    /// If anything fails before `commit`, dropping `tx` rolls the thread
    /// insert back, so no thread is ever visible without its post.
    async fn create_thread(&self, thread: NewThread) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // 1. Insert Thread
        let thread_id = sqlx::query("INSERT INTO threads (house_id, title) VALUES (?, ?)")
            .bind(thread.house_id)
            .bind(&thread.title)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    AppError::NotFound("House", thread.house_id)
                }
                other => store_err(other),
            })?
            .last_insert_rowid();

        // 2. Insert opening Post
        sqlx::query(
            "INSERT INTO posts (thread_id, nickname, tripcode_hash, content) VALUES (?, ?, ?, ?)",
        )
        .bind(thread_id)
        .bind(&thread.nickname)
        .bind(&thread.tripcode_hash)
        .bind(&thread.content)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(thread_id)
    }

    async fn get_thread(&self, id: i64) -> Result<Option<ThreadDetail>> {
        let thread = match sqlx::query("SELECT id, house_id, title FROM threads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?
        {
            Some(row) => thread_from_row(&row).map_err(store_err)?,
            None => return Ok(None),
        };

        let post = sqlx::query(
            "SELECT id, thread_id, nickname, tripcode_hash, content
             FROM posts WHERE thread_id = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .as_ref()
        .map(post_from_row)
        .transpose()
        .map_err(store_err)?
        .ok_or_else(|| AppError::Store(format!("thread {id} has no opening post")))?;

        let replies = sqlx::query(
            "SELECT id, post_id, nickname, tripcode_hash, content
             FROM replies WHERE post_id = ? ORDER BY id ASC",
        )
        .bind(post.id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?
        .iter()
        .map(reply_from_row)
        .collect::<std::result::Result<_, _>>()
        .map_err(store_err)?;

        Ok(Some(ThreadDetail { thread, post, replies }))
    }

    async fn create_reply(&self, reply: NewReply) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let thread_id: i64 = match sqlx::query("SELECT thread_id FROM posts WHERE id = ?")
            .bind(reply.post_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?
        {
            Some(row) => row.try_get("thread_id").map_err(store_err)?,
            None => return Err(AppError::NotFound("Post", reply.post_id)),
        };

        sqlx::query(
            "INSERT INTO replies (post_id, nickname, tripcode_hash, content) VALUES (?, ?, ?, ?)",
        )
        .bind(reply.post_id)
        .bind(&reply.nickname)
        .bind(&reply.tripcode_hash)
        .bind(&reply.content)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(thread_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    async fn repo() -> SqliteForumRepo {
        SqliteForumRepo::new("sqlite::memory:", 1).await.unwrap()
    }

    fn new_thread(house_id: i64, title: &str) -> NewThread {
        NewThread {
            house_id,
            title: title.into(),
            nickname: "bob".into(),
            tripcode_hash: EMPTY_HASH.into(),
            content: "hi".into(),
        }
    }

    fn new_reply(post_id: i64, content: &str) -> NewReply {
        NewReply {
            post_id,
            nickname: "alice".into(),
            tripcode_hash: EMPTY_HASH.into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let repo = repo().await;
        repo.create_house("Alpha").await.unwrap();
        repo.init_schema().await.unwrap();
        assert_eq!(repo.list_houses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_house_name() {
        let repo = repo().await;
        let alpha = repo.create_house("Alpha").await.unwrap();
        assert_eq!(alpha.name, "Alpha");

        match repo.create_house("Alpha").await {
            Err(AppError::DuplicateName(name)) => assert_eq!(name, "Alpha"),
            other => panic!("expected DuplicateName, got {other:?}"),
        }
        assert_eq!(repo.list_houses().await.unwrap(), vec![alpha]);
    }

    #[tokio::test]
    async fn test_houses_newest_first() {
        let repo = repo().await;
        for name in ["a", "b", "c"] {
            repo.create_house(name).await.unwrap();
        }
        let names: Vec<_> = repo.list_houses().await.unwrap().into_iter().map(|h| h.name).collect();
        assert_eq!(names, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_get_missing_house() {
        assert_eq!(repo().await.get_house(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_and_get_thread() {
        let repo = repo().await;
        let house = repo.create_house("Alpha").await.unwrap();

        let thread_id = repo.create_thread(new_thread(house.id, "Hello")).await.unwrap();
        let detail = repo.get_thread(thread_id).await.unwrap().expect("thread exists");

        assert_eq!(detail.thread.title, "Hello");
        assert_eq!(detail.thread.house_id, house.id);
        assert_eq!(detail.post.thread_id, thread_id);
        assert_eq!(detail.post.nickname, "bob");
        assert!(detail.replies.is_empty());
    }

    #[tokio::test]
    async fn test_threads_newest_first_per_house() {
        let repo = repo().await;
        let alpha = repo.create_house("Alpha").await.unwrap();
        let beta = repo.create_house("Beta").await.unwrap();

        let first = repo.create_thread(new_thread(alpha.id, "first")).await.unwrap();
        repo.create_thread(new_thread(beta.id, "elsewhere")).await.unwrap();
        let second = repo.create_thread(new_thread(alpha.id, "second")).await.unwrap();

        let ids: Vec<_> = repo.list_threads(alpha.id).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, [second, first]);
    }

    #[tokio::test]
    async fn test_thread_in_missing_house_leaves_nothing_behind() {
        let repo = repo().await;
        match repo.create_thread(new_thread(7, "orphan")).await {
            Err(AppError::NotFound("House", 7)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_failed_post_insert_rolls_back_thread() {
        let repo = repo().await;
        let house = repo.create_house("Alpha").await.unwrap();
        // Make the second insert of the transaction fail.
        sqlx::query("DROP TABLE replies").execute(&repo.pool).await.unwrap();
        sqlx::query("DROP TABLE posts").execute(&repo.pool).await.unwrap();

        assert!(matches!(
            repo.create_thread(new_thread(house.id, "Hello")).await,
            Err(AppError::Store(_))
        ));
        assert!(repo.list_threads(house.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replies_in_reading_order() {
        let repo = repo().await;
        let house = repo.create_house("Alpha").await.unwrap();
        let thread_id = repo.create_thread(new_thread(house.id, "Hello")).await.unwrap();
        let post_id = repo.get_thread(thread_id).await.unwrap().unwrap().post.id;

        for content in ["one", "two", "three"] {
            assert_eq!(repo.create_reply(new_reply(post_id, content)).await.unwrap(), thread_id);
        }

        let replies = repo.get_thread(thread_id).await.unwrap().unwrap().replies;
        let contents: Vec<_> = replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert!(replies.windows(2).all(|w| w[0].id < w[1].id));
        assert!(replies.iter().all(|r| r.post_id == post_id));
    }

    #[tokio::test]
    async fn test_reply_to_missing_post() {
        let repo = repo().await;
        match repo.create_reply(new_reply(99, "hey")).await {
            Err(AppError::NotFound("Post", 99)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM replies")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_get_missing_thread() {
        assert_eq!(repo().await.get_thread(999_999).await.unwrap(), None);
    }
}
