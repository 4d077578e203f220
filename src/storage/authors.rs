use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use url::Url;

use super::schema::Database;
use super::types::{
    Article, ArticleDbRow, Author, AuthorReport, AuthorRow, DatabaseError, POST_DATE_FORMAT,
};

/// Parameters of one author report.
#[derive(Debug, Clone, Copy)]
pub struct ReportQuery<'a> {
    /// Articles published before this instant are ignored.
    pub cutoff: NaiveDateTime,
    /// Category term IDs whose articles are left out of the per-author listings.
    pub excluded_categories: &'a [i64],
    /// Content type that counts as an article (`post` on a stock install).
    pub post_type: &'a str,
    /// Base for permalinks: `{site_url}?p={id}`.
    pub site_url: &'a Url,
}

/// Plain (query-string) permalink for a post.
pub fn permalink(site_url: &Url, post_id: i64) -> String {
    let mut url = site_url.clone();
    url.query_pairs_mut().append_pair("p", &post_id.to_string());
    url.into()
}

impl Database {
    // ========================================================================
    // Author Report Queries
    // ========================================================================

    /// Authors with their qualifying articles, ordered by display name.
    ///
    /// Two phases, run inside one read transaction so both see the same snapshot:
    ///
    /// 1. Every author with at least one published article of `post_type` at or
    ///    after the cutoff, deduplicated and ordered by `display_name` (binary
    ///    collation), ties broken by author ID. Category exclusion is NOT applied
    ///    here.
    /// 2. For each of those authors, the same filter plus category exclusion,
    ///    newest first.
    ///
    /// An author whose every qualifying article sits in an excluded category is
    /// therefore still returned, with an empty article list.
    ///
    /// # Errors
    ///
    /// Any store failure aborts the whole report; nothing partial is returned.
    pub async fn find_authors_with_articles(
        &self,
        query: &ReportQuery<'_>,
    ) -> Result<Vec<AuthorReport>, DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_sqlx)?;

        let authors = authors_since(&mut tx, query).await?;
        tracing::debug!(
            authors = authors.len(),
            cutoff = %query.cutoff,
            "Selected authors with published articles"
        );

        let mut reports = Vec::with_capacity(authors.len());
        for author in authors {
            let articles = articles_for_author(&mut tx, author.id, query).await?;
            reports.push(AuthorReport { author, articles });
        }

        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok(reports)
    }
}

async fn authors_since(
    conn: &mut SqliteConnection,
    query: &ReportQuery<'_>,
) -> Result<Vec<Author>, DatabaseError> {
    let rows = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT DISTINCT u.id, u.display_name
        FROM posts AS p
        JOIN users AS u ON p.post_author = u.id
        WHERE p.post_status = 'publish'
          AND p.post_type = ?
          AND p.post_date >= ?
        ORDER BY u.display_name ASC, u.id ASC
    "#,
    )
    .bind(query.post_type)
    .bind(query.cutoff.format(POST_DATE_FORMAT).to_string())
    .fetch_all(&mut *conn)
    .await
    .map_err(DatabaseError::from_sqlx)?;

    Ok(rows.into_iter().map(AuthorRow::into_author).collect())
}

async fn articles_for_author(
    conn: &mut SqliteConnection,
    author_id: i64,
    query: &ReportQuery<'_>,
) -> Result<Vec<Article>, DatabaseError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"SELECT id, post_author, post_title, post_date
           FROM posts
           WHERE post_status = 'publish' AND post_author = "#,
    );
    builder.push_bind(author_id);
    builder.push(" AND post_type = ");
    builder.push_bind(query.post_type);
    builder.push(" AND post_date >= ");
    builder.push_bind(query.cutoff.format(POST_DATE_FORMAT).to_string());

    if !query.excluded_categories.is_empty() {
        builder.push(
            r#" AND id NOT IN (
                SELECT tr.object_id
                FROM term_relationships AS tr
                INNER JOIN term_taxonomy AS tt ON tr.term_taxonomy_id = tt.term_taxonomy_id
                WHERE tt.taxonomy = 'category' AND tt.term_id IN ("#,
        );
        let mut separated = builder.separated(", ");
        for id in query.excluded_categories {
            separated.push_bind(*id);
        }
        separated.push_unseparated("))");
    }

    builder.push(" ORDER BY post_date DESC, id DESC");

    let rows: Vec<ArticleDbRow> = builder
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::from_sqlx)?;

    rows.into_iter()
        .map(|row| {
            let link = permalink(query.site_url, row.id);
            row.into_article(link)
        })
        .collect()
}
