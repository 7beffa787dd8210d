use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Entity rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub copies: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IssuedBook {
    pub id: i64,
    pub student_id: i64,
    pub book_id: i64,
    pub issue_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<DateTime<Utc>>,
    pub is_returned: bool,
    pub fine_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamScore {
    pub id: i64,
    pub student_id: i64,
    pub subject: String,
    pub semester: i32,
    pub marks: i32,
    pub credits: i32,
}

/// Tenant user row, without the password digest
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub student_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StudentPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department_id: Option<i64>,
}

impl StudentPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = HashMap::new();
        if self.name.trim().is_empty() {
            errors.insert("name".to_string(), "must not be empty".to_string());
        }
        if !is_plausible_email(&self.email) {
            errors.insert("email".to_string(), "must be a valid email address".to_string());
        }
        if self.phone.len() != 10 || !self.phone.chars().all(|c| c.is_ascii_digit()) {
            errors.insert("phone".to_string(), "must be exactly 10 digits".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid student", Some(errors)))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DepartmentPayload {
    pub name: String,
    pub code: String,
}

impl DepartmentPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = HashMap::new();
        if self.name.trim().is_empty() {
            errors.insert("name".to_string(), "must not be empty".to_string());
        }
        if self.code.trim().is_empty() {
            errors.insert("code".to_string(), "must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid department", Some(errors)))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookPayload {
    pub title: String,
    pub author: Option<String>,
    #[serde(default = "default_copies")]
    pub copies: i32,
}

fn default_copies() -> i32 {
    1
}

impl BookPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = HashMap::new();
        if self.title.trim().is_empty() {
            errors.insert("title".to_string(), "must not be empty".to_string());
        }
        if self.copies < 0 {
            errors.insert("copies".to_string(), "must not be negative".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid book", Some(errors)))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueBookPayload {
    pub student_id: i64,
    pub book_id: i64,
    /// Defaults to today + the configured loan period when omitted
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ExamScorePayload {
    pub student_id: i64,
    pub subject: String,
    pub semester: i32,
    pub marks: i32,
    #[serde(default = "default_credits")]
    pub credits: i32,
}

fn default_credits() -> i32 {
    4
}

impl ExamScorePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = HashMap::new();
        if self.subject.trim().is_empty() {
            errors.insert("subject".to_string(), "must not be empty".to_string());
        }
        if !(1..=12).contains(&self.semester) {
            errors.insert("semester".to_string(), "must be between 1 and 12".to_string());
        }
        if !(0..=100).contains(&self.marks) {
            errors.insert("marks".to_string(), "must be between 0 and 100".to_string());
        }
        if !(1..=10).contains(&self.credits) {
            errors.insert("credits".to_string(), "must be between 1 and 10".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid exam score", Some(errors)))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub student_id: Option<i64>,
}

impl UserPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = HashMap::new();
        if self.name.trim().is_empty() {
            errors.insert("name".to_string(), "must not be empty".to_string());
        }
        if !is_plausible_email(&self.email) {
            errors.insert("email".to_string(), "must be a valid email address".to_string());
        }
        if self.password.len() < 8 {
            errors.insert("password".to_string(), "must be at least 8 characters".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid user", Some(errors)))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCollegePayload {
    pub code: String,
    pub name: String,
    pub admin: CollegeAdminPayload,
}

#[derive(Debug, Deserialize)]
pub struct CollegeAdminPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateCollegePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = HashMap::new();
        if self.name.trim().is_empty() {
            errors.insert("name".to_string(), "must not be empty".to_string());
        }
        if !is_plausible_email(&self.admin.email) {
            errors.insert("admin.email".to_string(), "must be a valid email address".to_string());
        }
        if self.admin.password.len() < 8 {
            errors.insert(
                "admin.password".to_string(),
                "must be at least 8 characters".to_string(),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid college", Some(errors)))
        }
    }
}

/// Loose structural check: one '@', non-empty local part, dotted domain
fn is_plausible_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(email: &str, phone: &str) -> StudentPayload {
        StudentPayload {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            department_id: None,
        }
    }

    #[test]
    fn accepts_valid_student() {
        assert!(student("asha@college.edu", "9876543210").validate().is_ok());
    }

    #[test]
    fn rejects_bad_phone() {
        assert!(student("asha@college.edu", "12345").validate().is_err());
        assert!(student("asha@college.edu", "98765abc10").validate().is_err());
        assert!(student("asha@college.edu", "98765432100").validate().is_err());
    }

    #[test]
    fn rejects_bad_email() {
        assert!(student("not-an-email", "9876543210").validate().is_err());
        assert!(student("a@b", "9876543210").validate().is_err());
        assert!(student("@college.edu", "9876543210").validate().is_err());
        assert!(student("a@.edu", "9876543210").validate().is_err());
    }

    #[test]
    fn score_payload_range_checks() {
        let mut payload = ExamScorePayload {
            student_id: 1,
            subject: "Algorithms".to_string(),
            semester: 3,
            marks: 88,
            credits: 4,
        };
        assert!(payload.validate().is_ok());

        payload.marks = 101;
        assert!(payload.validate().is_err());
        payload.marks = 88;
        payload.semester = 0;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn book_defaults_to_one_copy() {
        let payload: BookPayload =
            serde_json::from_str(r#"{"title": "SICP"}"#).unwrap();
        assert_eq!(payload.copies, 1);
        assert!(payload.validate().is_ok());
    }
}
