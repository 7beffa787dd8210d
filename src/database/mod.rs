pub mod manager;
pub mod schema;

pub use manager::{DatabaseError, DatabaseManager};
