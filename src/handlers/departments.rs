use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::{json, Value};

use crate::auth::Role;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantPool};
use crate::models::{Department, DepartmentPayload};

/// GET /api/departments
pub async fn list(
    Extension(TenantPool(pool)): Extension<TenantPool>,
) -> ApiResult<Vec<Department>> {
    let departments =
        sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments ORDER BY code")
            .fetch_all(&pool)
            .await?;
    Ok(ApiResponse::success(departments))
}

/// GET /api/departments/:id
pub async fn get(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
) -> ApiResult<Department> {
    let department =
        sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Department {} not found", id)))?;
    Ok(ApiResponse::success(department))
}

/// POST /api/departments
pub async fn create(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<DepartmentPayload>,
) -> ApiResult<Department> {
    user.require(&[Role::Admin])?;
    payload.validate()?;

    let department = sqlx::query_as::<_, Department>(
        "INSERT INTO departments (name, code) VALUES ($1, $2) RETURNING id, name, code",
    )
    .bind(&payload.name)
    .bind(&payload.code)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(department))
}

/// PUT /api/departments/:id
pub async fn update(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<DepartmentPayload>,
) -> ApiResult<Department> {
    user.require(&[Role::Admin])?;
    payload.validate()?;

    let department = sqlx::query_as::<_, Department>(
        "UPDATE departments SET name = $1, code = $2 WHERE id = $3 RETURNING id, name, code",
    )
    .bind(&payload.name)
    .bind(&payload.code)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Department {} not found", id)))?;

    Ok(ApiResponse::success(department))
}

/// DELETE /api/departments/:id
///
/// A department with enrolled students cannot be deleted.
pub async fn delete(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    user.require(&[Role::Admin])?;

    let enrolled: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM students WHERE department_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await?;
    if enrolled.0 > 0 {
        return Err(ApiError::conflict(format!(
            "Department {} has {} enrolled students",
            id, enrolled.0
        )));
    }

    let deleted: Option<(i64,)> =
        sqlx::query_as("DELETE FROM departments WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
    if deleted.is_none() {
        return Err(ApiError::not_found(format!("Department {} not found", id)));
    }

    Ok(ApiResponse::success(json!({
        "message": "department deleted successfully"
    })))
}
