use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another newsbrief instance appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

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
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Fields for an article that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub author: String,
    pub content: String,
    /// Human-readable source label (the feed's category name).
    pub source: String,
    /// Publication time as epoch seconds (UTC).
    pub published: i64,
    pub summary: String,
}

/// A persisted article.
///
/// Rows are created once per unique URL and mutated only when an audio
/// reference is attached after synthesis.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub source: String,
    pub published: i64,
    pub summary: String,
    /// Public reference to the synthesized summary audio, when present.
    pub audio_path: Option<String>,
    /// Ingestion timestamp as epoch seconds.
    pub fetched_at: i64,
}

/// A named article category (many-to-many with articles).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}
