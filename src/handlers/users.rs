use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use crate::auth::{self, Role};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, CollegeContext, TenantPool};
use crate::models::{User, UserPayload};

const USER_COLUMNS: &str = "id, name, email, role, student_id, created_at";

/// GET /api/users
pub async fn list(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<User>> {
    user.require(&[Role::Admin])?;

    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY id LIMIT $1",
        USER_COLUMNS
    ))
    .bind(crate::config::config().api.max_page_size)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(users))
}

/// POST /api/users - create a tenant user account
pub async fn create(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UserPayload>,
) -> ApiResult<User> {
    user.require(&[Role::Admin])?;
    payload.validate()?;

    let role = Role::parse(&payload.role)
        .filter(Role::is_tenant_role)
        .ok_or_else(|| {
            ApiError::bad_request("Role must be one of: admin, librarian, student")
        })?;

    if let Some(student_id) = payload.student_id {
        super::students::fetch_student(&pool, student_id).await?;
    }

    let created = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_digest, role, student_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(auth::password_digest(&payload.password))
    .bind(role.as_str())
    .bind(payload.student_id)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(created))
}

/// GET /api/auth/whoami - the caller's resolved identity and college
pub async fn whoami(
    Extension(college): Extension<CollegeContext>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "student_id": user.student_id,
        "college": college.code,
    })))
}
