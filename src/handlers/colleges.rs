use axum::{extract::Path, Json};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::CreateCollegePayload;
use crate::registry::{CollegeInfo, CollegeRegistry};

/// GET /api/colleges
pub async fn list() -> ApiResult<Vec<CollegeInfo>> {
    let registry = CollegeRegistry::new().await?;
    let colleges = registry.list_colleges().await?;
    Ok(ApiResponse::success(colleges))
}

/// POST /api/colleges - provision a new college
///
/// Creates the physical database, applies the tenant schema, registers the
/// college, and seeds its first admin account.
pub async fn create(Json(payload): Json<CreateCollegePayload>) -> ApiResult<CollegeInfo> {
    payload.validate()?;

    let registry = CollegeRegistry::new().await?;
    let college = registry
        .create_college(
            &payload.code,
            &payload.name,
            &payload.admin.name,
            &payload.admin.email,
            &payload.admin.password,
        )
        .await?;

    Ok(ApiResponse::created(college))
}

/// DELETE /api/colleges/:code - soft-delete the registry row and drop the
/// college database
pub async fn delete(Path(code): Path<String>) -> ApiResult<Value> {
    let registry = CollegeRegistry::new().await?;
    registry.drop_college(&code).await?;

    Ok(ApiResponse::success(json!({
        "message": "college deleted successfully"
    })))
}
