//! # hb-db-postgres Implementation
//!
//! PostgreSQL flavour of `ForumRepo`, for deployments that point
//! `DATABASE_URL` at a database server instead of a local file.

use async_trait::async_trait;
use hb_core::error::{AppError, Result};
use hb_core::models::{House, NewReply, NewThread, Post, Reply, Thread, ThreadDetail};
use hb_core::traits::ForumRepo;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

/// Advisory lock id held while the schema is applied.
const SCHEMA_LOCK_KEY: i64 = 0x686f_7573_6562_6f61;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS houses (
        id BIGSERIAL PRIMARY KEY,
        name TEXT UNIQUE NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS threads (
        id BIGSERIAL PRIMARY KEY,
        house_id BIGINT NOT NULL REFERENCES houses(id),
        title TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id BIGSERIAL PRIMARY KEY,
        thread_id BIGINT NOT NULL REFERENCES threads(id),
        nickname TEXT NOT NULL,
        tripcode_hash TEXT NOT NULL,
        content TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS replies (
        id BIGSERIAL PRIMARY KEY,
        post_id BIGINT NOT NULL REFERENCES posts(id),
        nickname TEXT NOT NULL,
        tripcode_hash TEXT NOT NULL,
        content TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_threads_house_id ON threads (house_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_thread_id ON posts (thread_id)",
    "CREATE INDEX IF NOT EXISTS idx_replies_post_id ON replies (post_id)",
];

pub struct PostgresForumRepo {
    pool: PgPool,
}

impl PostgresForumRepo {
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .map_err(store_err)?;

        let repo = Self { pool };
        repo.init_schema().await?;
        log::info!("PostgreSQL store ready");
        Ok(repo)
    }

    async fn init_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        // Concurrent CREATE TABLE IF NOT EXISTS can still collide in the catalog.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)
    }
}

/// Not logged here: the HTTP layer logs failed requests once.
fn store_err(err: sqlx::Error) -> AppError {
    AppError::store(err)
}

fn house_from_row(row: &PgRow) -> std::result::Result<House, sqlx::Error> {
    Ok(House {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

fn thread_from_row(row: &PgRow) -> std::result::Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: row.try_get("id")?,
        house_id: row.try_get("house_id")?,
        title: row.try_get("title")?,
    })
}

fn post_from_row(row: &PgRow) -> std::result::Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        nickname: row.try_get("nickname")?,
        tripcode_hash: row.try_get("tripcode_hash")?,
        content: row.try_get("content")?,
    })
}

fn reply_from_row(row: &PgRow) -> std::result::Result<Reply, sqlx::Error> {
    Ok(Reply {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        nickname: row.try_get("nickname")?,
        tripcode_hash: row.try_get("tripcode_hash")?,
        content: row.try_get("content")?,
    })
}

#[async_trait]
impl ForumRepo for PostgresForumRepo {
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

    async fn create_house(&self, name: &str) -> Result<House> {
        let inserted = sqlx::query("INSERT INTO houses (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await;

        match inserted {
            Ok(row) => house_from_row(&row).map_err(store_err),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(store_err(e)),
        }
    }

    async fn get_house(&self, id: i64) -> Result<Option<House>> {
        let row = sqlx::query("SELECT id, name FROM houses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.as_ref().map(house_from_row).transpose().map_err(store_err)
    }

    async fn list_threads(&self, house_id: i64) -> Result<Vec<Thread>> {
        sqlx::query("SELECT id, house_id, title FROM threads WHERE house_id = $1 ORDER BY id DESC")
            .bind(house_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?
            .iter()
            .map(thread_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(store_err)
    }

    /// Thread and opening post commit together or not at all.
    async fn create_thread(&self, thread: NewThread) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let thread_id: i64 =
            sqlx::query_scalar("INSERT INTO threads (house_id, title) VALUES ($1, $2) RETURNING id")
                .bind(thread.house_id)
                .bind(&thread.title)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| match e {
                    sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                        AppError::NotFound("House", thread.house_id)
                    }
                    other => store_err(other),
                })?;

        sqlx::query(
            "INSERT INTO posts (thread_id, nickname, tripcode_hash, content) VALUES ($1, $2, $3, $4)",
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
        let thread = match sqlx::query("SELECT id, house_id, title FROM threads WHERE id = $1")
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
             FROM posts WHERE thread_id = $1 ORDER BY id ASC LIMIT 1",
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
             FROM replies WHERE post_id = $1 ORDER BY id ASC",
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

        let thread_id: i64 = sqlx::query_scalar("SELECT thread_id FROM posts WHERE id = $1")
            .bind(reply.post_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?
            .ok_or(AppError::NotFound("Post", reply.post_id))?;

        sqlx::query(
            "INSERT INTO replies (post_id, nickname, tripcode_hash, content) VALUES ($1, $2, $3, $4)",
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
