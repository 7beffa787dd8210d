use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::config;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantPool};
use crate::models::{Student, StudentPayload};

const STUDENT_COLUMNS: &str = "id, name, email, phone, department_id, created_at";

/// GET /api/students
pub async fn list(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Student>> {
    user.require(&[Role::Admin, Role::Librarian])?;

    let students = sqlx::query_as::<_, Student>(&format!(
        "SELECT {} FROM students ORDER BY id LIMIT $1",
        STUDENT_COLUMNS
    ))
    .bind(config::config().api.max_page_size)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(students))
}

/// GET /api/students/:id
pub async fn get(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Student> {
    user.require_self_or(id, &[Role::Admin, Role::Librarian])?;

    let student = fetch_student(&pool, id).await?;
    Ok(ApiResponse::success(student))
}

/// POST /api/students
pub async fn create(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StudentPayload>,
) -> ApiResult<Student> {
    user.require(&[Role::Admin])?;
    payload.validate()?;
    ensure_department(&pool, payload.department_id).await?;

    let student = sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (name, email, phone, department_id) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        STUDENT_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.department_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(student))
}

/// PUT /api/students/:id
pub async fn update(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StudentPayload>,
) -> ApiResult<Student> {
    user.require(&[Role::Admin])?;
    payload.validate()?;
    ensure_department(&pool, payload.department_id).await?;

    let student = sqlx::query_as::<_, Student>(&format!(
        "UPDATE students SET name = $1, email = $2, phone = $3, department_id = $4 \
         WHERE id = $5 RETURNING {}",
        STUDENT_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.department_id)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Student {} not found", id)))?;

    Ok(ApiResponse::success(student))
}

/// DELETE /api/students/:id
///
/// Lending rows and exam scores cascade with the student.
pub async fn delete(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    user.require(&[Role::Admin])?;

    let deleted: Option<(i64,)> =
        sqlx::query_as("DELETE FROM students WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&pool)
            .await?;

    if deleted.is_none() {
        return Err(ApiError::not_found(format!("Student {} not found", id)));
    }

    Ok(ApiResponse::success(json!({
        "message": "student deleted successfully"
    })))
}

pub(crate) async fn fetch_student(pool: &sqlx::PgPool, id: i64) -> Result<Student, ApiError> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {} FROM students WHERE id = $1",
        STUDENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Student {} not found", id)))
}

async fn ensure_department(
    pool: &sqlx::PgPool,
    department_id: Option<i64>,
) -> Result<(), ApiError> {
    let Some(department_id) = department_id else {
        return Ok(());
    };
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM departments WHERE id = $1")
        .bind(department_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(ApiError::bad_request(format!(
            "Department {} does not exist",
            department_id
        )));
    }
    Ok(())
}
