mod articles;
mod categories;
mod schema;
mod types;

pub use schema::Database;
pub use types::{Article, Category, DatabaseError, NewArticle};
