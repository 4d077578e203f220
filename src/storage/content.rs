use anyhow::Result;

use super::schema::Database;
use super::types::{NewPost, POST_DATE_FORMAT};

impl Database {
    // ========================================================================
    // Content Seeding
    // ========================================================================
    //
    // The report never writes content. These exist so a fresh database (and
    // the test suite) can be populated in the layout the content system uses.

    /// Insert an author, returning its ID.
    pub async fn insert_author(&self, display_name: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("INSERT INTO users (display_name) VALUES (?) RETURNING id")
            .bind(display_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Insert a post, returning its ID.
    pub async fn insert_post(&self, post: &NewPost) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO posts (post_author, post_title, post_date, post_status, post_type)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
        "#,
        )
        .bind(post.author_id)
        .bind(&post.title)
        .bind(post.published.format(POST_DATE_FORMAT).to_string())
        .bind(&post.status)
        .bind(&post.post_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Attach a taxonomy term to a post, creating the term_taxonomy row on first use.
    pub async fn assign_term(&self, post_id: i64, term_id: i64, taxonomy: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO term_taxonomy (term_id, taxonomy) VALUES (?, ?)
            ON CONFLICT(term_id, taxonomy) DO UPDATE SET term_id = excluded.term_id
            RETURNING term_taxonomy_id
        "#,
        )
        .bind(term_id)
        .bind(taxonomy)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT OR IGNORE INTO term_relationships (object_id, term_taxonomy_id) VALUES (?, ?)",
        )
        .bind(post_id)
        .bind(row.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Put a post in a category.
    pub async fn assign_category(&self, post_id: i64, category_id: i64) -> Result<()> {
        self.assign_term(post_id, category_id, "category").await
    }
}
