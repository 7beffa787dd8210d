use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::config;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantPool};
use crate::models::{Book, BookPayload};

/// GET /api/books
pub async fn list(Extension(TenantPool(pool)): Extension<TenantPool>) -> ApiResult<Vec<Book>> {
    let books =
        sqlx::query_as::<_, Book>("SELECT id, title, author, copies FROM books ORDER BY id LIMIT $1")
            .bind(config::config().api.max_page_size)
            .fetch_all(&pool)
            .await?;
    Ok(ApiResponse::success(books))
}

/// GET /api/books/:id
pub async fn get(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
) -> ApiResult<Book> {
    let book =
        sqlx::query_as::<_, Book>("SELECT id, title, author, copies FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Book {} not found", id)))?;
    Ok(ApiResponse::success(book))
}

/// POST /api/books
pub async fn create(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<BookPayload>,
) -> ApiResult<Book> {
    user.require(&[Role::Admin, Role::Librarian])?;
    payload.validate()?;

    let book = sqlx::query_as::<_, Book>(
        "INSERT INTO books (title, author, copies) VALUES ($1, $2, $3) \
         RETURNING id, title, author, copies",
    )
    .bind(&payload.title)
    .bind(&payload.author)
    .bind(payload.copies)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(book))
}

/// PUT /api/books/:id
pub async fn update(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<BookPayload>,
) -> ApiResult<Book> {
    user.require(&[Role::Admin, Role::Librarian])?;
    payload.validate()?;

    let book = sqlx::query_as::<_, Book>(
        "UPDATE books SET title = $1, author = $2, copies = $3 WHERE id = $4 \
         RETURNING id, title, author, copies",
    )
    .bind(&payload.title)
    .bind(&payload.author)
    .bind(payload.copies)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Book {} not found", id)))?;

    Ok(ApiResponse::success(book))
}

/// DELETE /api/books/:id
pub async fn delete(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    user.require(&[Role::Admin, Role::Librarian])?;

    let deleted: Option<(i64,)> = sqlx::query_as("DELETE FROM books WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if deleted.is_none() {
        return Err(ApiError::not_found(format!("Book {} not found", id)));
    }

    Ok(ApiResponse::success(json!({
        "message": "book deleted successfully"
    })))
}
