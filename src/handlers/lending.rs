use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{Duration, Utc};

use crate::auth::Role;
use crate::config;
use crate::domain::fines;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantPool};
use crate::models::{IssueBookPayload, IssuedBook};

const ISSUE_COLUMNS: &str =
    "id, student_id, book_id, issue_date, due_date, return_date, is_returned, fine_amount";

/// GET /api/lending
pub async fn list(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<IssuedBook>> {
    user.require(&[Role::Admin, Role::Librarian])?;

    let issues = sqlx::query_as::<_, IssuedBook>(&format!(
        "SELECT {} FROM issued_books ORDER BY issue_date DESC LIMIT $1",
        ISSUE_COLUMNS
    ))
    .bind(config::config().api.max_page_size)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(issues))
}

/// GET /api/lending/delayed - un-returned issues past their due date
pub async fn delayed(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<IssuedBook>> {
    user.require(&[Role::Admin, Role::Librarian])?;

    let issues = sqlx::query_as::<_, IssuedBook>(&format!(
        "SELECT {} FROM issued_books \
         WHERE is_returned = FALSE AND due_date < CURRENT_DATE \
         ORDER BY due_date LIMIT $1",
        ISSUE_COLUMNS
    ))
    .bind(config::config().api.max_page_size)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(issues))
}

/// POST /api/lending - issue a book to a student
pub async fn issue(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<IssueBookPayload>,
) -> ApiResult<IssuedBook> {
    user.require(&[Role::Admin, Role::Librarian])?;

    super::students::fetch_student(&pool, payload.student_id).await?;

    let book: Option<(i64,)> = sqlx::query_as("SELECT id FROM books WHERE id = $1")
        .bind(payload.book_id)
        .fetch_optional(&pool)
        .await?;
    if book.is_none() {
        return Err(ApiError::not_found(format!(
            "Book {} not found",
            payload.book_id
        )));
    }

    // One live issue per (student, book) pair
    let existing: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM issued_books \
         WHERE student_id = $1 AND book_id = $2 AND is_returned = FALSE",
    )
    .bind(payload.student_id)
    .bind(payload.book_id)
    .fetch_optional(&pool)
    .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request("Book already issued to this student"));
    }

    let due_date = payload.due_date.unwrap_or_else(|| {
        let loan_days = config::config().lending.default_loan_days;
        Utc::now().date_naive() + Duration::days(loan_days)
    });

    let issue = sqlx::query_as::<_, IssuedBook>(&format!(
        "INSERT INTO issued_books (student_id, book_id, due_date) \
         VALUES ($1, $2, $3) RETURNING {}",
        ISSUE_COLUMNS
    ))
    .bind(payload.student_id)
    .bind(payload.book_id)
    .bind(due_date)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(issue))
}

/// PUT /api/lending/:id/return - return an issued book, charging any fine
pub async fn return_book(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<IssuedBook> {
    user.require(&[Role::Admin, Role::Librarian])?;

    let issue = sqlx::query_as::<_, IssuedBook>(&format!(
        "SELECT {} FROM issued_books WHERE id = $1",
        ISSUE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Issued book {} not found", id)))?;

    if issue.is_returned {
        return Err(ApiError::bad_request("Book already returned"));
    }

    let returned_at = Utc::now();
    let fine_per_day = config::config().lending.fine_per_day;
    let fine = fines::fine_for(issue.due_date, returned_at.date_naive(), fine_per_day);

    // Conditional update so a concurrent second return sees zero rows
    // rather than overwriting the recorded fine.
    let updated = sqlx::query_as::<_, IssuedBook>(&format!(
        "UPDATE issued_books \
         SET is_returned = TRUE, return_date = $1, fine_amount = $2 \
         WHERE id = $3 AND is_returned = FALSE RETURNING {}",
        ISSUE_COLUMNS
    ))
    .bind(returned_at)
    .bind(fine)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::bad_request("Book already returned"))?;

    if fine > 0 {
        tracing::info!("Issue {} returned late, fine {}", id, fine);
    }

    Ok(ApiResponse::success(updated))
}

/// GET /api/students/:id/lending - a student's lending history
pub async fn student_history(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<IssuedBook>> {
    user.require_self_or(id, &[Role::Admin, Role::Librarian])?;

    super::students::fetch_student(&pool, id).await?;

    let issues = sqlx::query_as::<_, IssuedBook>(&format!(
        "SELECT {} FROM issued_books WHERE student_id = $1 ORDER BY issue_date DESC",
        ISSUE_COLUMNS
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(issues))
}
