use anyhow::{bail, Result};

use super::schema::Database;
use super::types::Category;

impl Database {
    // ========================================================================
    // Category Operations
    // ========================================================================

    /// Look up a category by name, creating it when absent. Idempotent.
    ///
    /// The name is trimmed before use; empty or whitespace-only names are
    /// rejected.
    pub async fn get_or_create_category(&self, name: &str) -> Result<Category> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            bail!("Category name cannot be empty or whitespace-only");
        }

        // Upsert so the RETURNING clause yields the row in both the
        // fresh-insert and already-exists cases.
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name) VALUES (?)
            ON CONFLICT(name) DO UPDATE SET name = excluded.name
            RETURNING id, name
        "#,
        )
        .bind(trimmed)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Associate an article with a category. Idempotent.
    pub async fn link_category(&self, article_id: i64, category_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO article_categories (article_id, category_id) VALUES (?, ?)",
        )
        .bind(article_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Categories linked to an article, ordered by name.
    pub async fn categories_for_article(&self, article_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name
            FROM categories c
            JOIN article_categories ac ON ac.category_id = c.id
            WHERE ac.article_id = ?
            ORDER BY c.name
        "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, NewArticle};

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn test_article(url: &str) -> NewArticle {
        NewArticle {
            url: url.to_string(),
            title: "Test".to_string(),
            author: "Unknown".to_string(),
            content: "Content".to_string(),
            source: "World".to_string(),
            published: 1704067200,
            summary: "Summary.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_db().await;

        let first = db.get_or_create_category("Technology").await.unwrap();
        let second = db.get_or_create_category("Technology").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "Technology");
    }

    #[tokio::test]
    async fn test_distinct_names_distinct_rows() {
        let db = test_db().await;

        let tech = db.get_or_create_category("Technology").await.unwrap();
        let health = db.get_or_create_category("Health").await.unwrap();
        assert_ne!(tech.id, health.id);
    }

    #[tokio::test]
    async fn test_name_is_trimmed() {
        let db = test_db().await;

        let padded = db.get_or_create_category("  Science  ").await.unwrap();
        let plain = db.get_or_create_category("Science").await.unwrap();
        assert_eq!(padded.id, plain.id);
        assert_eq!(padded.name, "Science");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let db = test_db().await;
        assert!(db.get_or_create_category("").await.is_err());
        assert!(db.get_or_create_category("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_link_category_idempotent() {
        let db = test_db().await;
        let category = db.get_or_create_category("World").await.unwrap();
        let article = db
            .create_article(&test_article("https://example.com/a"))
            .await
            .unwrap();

        db.link_category(article.id, category.id).await.unwrap();
        db.link_category(article.id, category.id).await.unwrap();

        let linked = db.categories_for_article(article.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].name, "World");
    }

    #[tokio::test]
    async fn test_article_in_multiple_categories() {
        let db = test_db().await;
        let world = db.get_or_create_category("World").await.unwrap();
        let business = db.get_or_create_category("Business").await.unwrap();
        let article = db
            .create_article(&test_article("https://example.com/a"))
            .await
            .unwrap();

        db.link_category(article.id, world.id).await.unwrap();
        db.link_category(article.id, business.id).await.unwrap();

        let linked = db.categories_for_article(article.id).await.unwrap();
        assert_eq!(linked.len(), 2);
        // Ordered by name
        assert_eq!(linked[0].name, "Business");
        assert_eq!(linked[1].name, "World");
    }
}
