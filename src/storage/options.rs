use super::schema::Database;
use super::types::DatabaseError;

impl Database {
    // ========================================================================
    // Site Options
    // ========================================================================

    /// Get a single option value by name.
    ///
    /// Names use dotted convention: `author_report.range`.
    ///
    /// # Returns
    ///
    /// The option value if the name exists, or `None` if not set.
    pub async fn get_option(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT option_value FROM options WHERE option_name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set an option value (UPSERT).
    ///
    /// A single statement, so concurrent writers never interleave partially;
    /// whichever commits last wins.
    pub async fn set_option(&self, name: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO options (option_name, option_value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(option_name) DO UPDATE SET
                option_value = excluded.option_value,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
