pub mod fines;
pub mod grades;
