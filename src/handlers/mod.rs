pub mod analytics;
pub mod books;
pub mod colleges;
pub mod departments;
pub mod lending;
pub mod scores;
pub mod students;
pub mod users;
