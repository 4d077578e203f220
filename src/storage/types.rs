use chrono::NaiveDateTime;
use std::sync::Arc;
use thiserror::Error;

/// Storage format of `posts.post_date`, identical to WordPress.
pub const POST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The content database is locked by another process. Please try again.")]
    Locked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A report query ran past its deadline
    #[error("Database query timed out after {0} seconds")]
    Timeout(u64),

    /// A stored post date could not be parsed
    #[error("Post {post_id} has an unreadable post_date: {value:?}")]
    InvalidPostDate { post_id: i64, value: String },

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
        {
            return DatabaseError::Locked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Helper Types
// ============================================================================

/// A post to insert through the fixture/seeding API.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub title: String,
    pub published: NaiveDateTime,
    /// `publish`, `draft`, `private`, ...
    pub status: String,
    /// `post`, `page`, ...
    pub post_type: String,
}

impl NewPost {
    /// A published `post`, the only kind the report counts by default.
    pub fn published(author_id: i64, title: &str, published: NaiveDateTime) -> Self {
        Self {
            author_id,
            title: title.to_string(),
            published,
            status: "publish".to_string(),
            post_type: "post".to_string(),
        }
    }
}

/// Internal row type for the author query
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AuthorRow {
    pub id: i64,
    pub display_name: String,
}

impl AuthorRow {
    pub(crate) fn into_author(self) -> Author {
        Author {
            id: self.id,
            display_name: Arc::from(self.display_name),
        }
    }
}

/// Internal row type for the per-author article query
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArticleDbRow {
    pub id: i64,
    pub post_author: i64,
    pub post_title: String,
    pub post_date: String,
}

impl ArticleDbRow {
    pub(crate) fn into_article(self, permalink: String) -> Result<Article, DatabaseError> {
        let published = NaiveDateTime::parse_from_str(&self.post_date, POST_DATE_FORMAT)
            .map_err(|_| DatabaseError::InvalidPostDate {
                post_id: self.id,
                value: self.post_date.clone(),
            })?;
        Ok(Article {
            id: self.id,
            author_id: self.post_author,
            title: Arc::from(self.post_title),
            published,
            permalink,
        })
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Author as seen by the report. Owned by the content system; never written here
/// except through the seeding API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub display_name: Arc<str>,
}

/// A published article that qualified for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: i64,
    pub author_id: i64,
    pub title: Arc<str>,
    pub published: NaiveDateTime,
    pub permalink: String,
}

/// An author paired with the articles that survived category exclusion,
/// newest first. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorReport {
    pub author: Author,
    pub articles: Vec<Article>,
}

impl AuthorReport {
    pub fn article_count(&self) -> usize {
        self.articles.len()
    }
}
