mod authors;
mod content;
mod options;
mod schema;
mod types;

pub use authors::{permalink, ReportQuery};
pub use schema::Database;
pub use types::{Article, Author, AuthorReport, DatabaseError, NewPost, POST_DATE_FORMAT};
