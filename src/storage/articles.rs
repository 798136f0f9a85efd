use anyhow::Result;

use super::schema::Database;
use super::types::{Article, NewArticle};

/// Maximum number of articles to return from any single query (OOM protection)
const MAX_ARTICLES: i64 = 2000;

impl Database {
    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Whether an article with this URL has already been stored.
    ///
    /// The pipeline checks this before extraction, which is what makes
    /// repeated ingestion runs idempotent.
    pub async fn article_exists(&self, url: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM articles WHERE url = ?)")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 != 0)
    }

    /// Insert a new article and return the stored row.
    ///
    /// Fails on a duplicate URL (UNIQUE constraint); callers are expected
    /// to have checked [`article_exists`](Self::article_exists) first.
    pub async fn create_article(&self, article: &NewArticle) -> Result<Article> {
        let fetched_at = chrono::Utc::now().timestamp();

        let stored = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (url, title, author, content, source, published, summary, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, url, title, author, content, source, published, summary, audio_path, fetched_at
        "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.author)
        .bind(&article.content)
        .bind(&article.source)
        .bind(article.published)
        .bind(&article.summary)
        .bind(fetched_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Attach a synthesized audio reference to an existing article.
    ///
    /// This is the only mutation articles receive after creation.
    pub async fn attach_audio(&self, article_id: i64, audio_path: &str) -> Result<()> {
        sqlx::query("UPDATE articles SET audio_path = ? WHERE id = ?")
            .bind(audio_path)
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Article Queries
    // ========================================================================

    /// Fetch a single article by its URL.
    pub async fn get_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, url, title, author, content, source, published, summary, audio_path, fetched_at
            FROM articles
            WHERE url = ?
        "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Total number of stored articles.
    pub async fn article_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Articles linked to a category, most recently published first.
    pub async fn articles_for_category(&self, category_id: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, Article>(
            r#"
            SELECT a.id, a.url, a.title, a.author, a.content, a.source,
                   a.published, a.summary, a.audio_path, a.fetched_at
            FROM articles a
            JOIN article_categories ac ON ac.article_id = a.id
            WHERE ac.category_id = ?
            ORDER BY a.published DESC, a.fetched_at DESC
            LIMIT ?
        "#,
        )
        .bind(category_id)
        .bind(MAX_ARTICLES)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
