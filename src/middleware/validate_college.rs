use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::registry::CollegeRegistry;

/// Tenant database pool for the resolved college, injected by middleware
#[derive(Clone)]
pub struct TenantPool(pub PgPool);

/// Resolved college from campus_main.colleges
#[derive(Clone, Debug)]
pub struct CollegeContext {
    pub id: i64,
    pub code: String,
    pub database: String,
}

pub const COLLEGE_HEADER: &str = "x-college-code";

/// Middleware that resolves the `X-College-Code` header against the master
/// registry and injects the college's database pool into the request.
///
/// This is the tenant-routing core: every request under /api/* carries a
/// college code, which maps through campus_main.colleges to a physical
/// database. Handlers never see a connection that belongs to another tenant.
pub async fn validate_college_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let code = headers
        .get(COLLEGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing X-College-Code header"))?
        .to_string();

    let registry = CollegeRegistry::new().await?;
    let college = registry.resolve(&code).await?.ok_or_else(|| {
        tracing::warn!("College resolution failed: '{}' not registered or inactive", code);
        ApiError::forbidden(format!("College '{}' is not active or does not exist", code))
    })?;

    let pool = DatabaseManager::college_pool(&college.database)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get database pool for college '{}': {}", code, e);
            ApiError::from(e)
        })?;

    tracing::debug!("College resolved: {} -> {}", college.code, college.database);

    request.extensions_mut().insert(CollegeContext {
        id: college.id,
        code: college.code,
        database: college.database,
    });
    request.extensions_mut().insert(TenantPool(pool));

    Ok(next.run(request).await)
}
