use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sqlx::Row;

use crate::auth::{self, Role};
use crate::error::ApiError;
use crate::registry::CollegeRegistry;

use super::validate_college::TenantPool;

/// Authenticated user context, injected by the credential middleware
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Set when the user account is linked to a student row
    pub student_id: Option<i64>,
}

impl AuthUser {
    /// Gate a handler on a set of allowed roles
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role '{}' may not perform this operation",
                self.role
            )))
        }
    }

    /// Gate on a set of roles, additionally letting a student act on their
    /// own student record.
    pub fn require_self_or(&self, student_id: i64, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        if self.role == Role::Student && self.student_id == Some(student_id) {
            return Ok(());
        }
        Err(ApiError::forbidden(
            "Students may only access their own records",
        ))
    }
}

pub const EMAIL_HEADER: &str = "x-user-email";
pub const PASSWORD_HEADER: &str = "x-user-password";

/// Extract the credential pair from request headers
fn extract_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
    let email = headers
        .get(EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing X-User-Email header"))?;

    let password = headers
        .get(PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing X-User-Password header"))?;

    Ok((email.to_string(), password.to_string()))
}

/// Middleware that checks credential headers against the college's users
/// table. Requires the college middleware to have run first so the tenant
/// pool is available.
pub async fn validate_user_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (email, password) = extract_credentials(&headers)?;

    let TenantPool(pool) = request
        .extensions()
        .get::<TenantPool>()
        .ok_or_else(|| {
            ApiError::internal_server_error("Tenant pool required before user validation")
        })?
        .clone();

    let row = sqlx::query(
        "SELECT id, name, email, password_digest, role, student_id FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error validating user '{}': {}", email, e);
        ApiError::internal_server_error("Failed to validate user")
    })?;

    let user_row = row.ok_or_else(|| {
        tracing::warn!("Login failed: no user '{}'", email);
        ApiError::unauthorized("Invalid credentials")
    })?;

    let stored_digest: String = user_row.get("password_digest");
    if !auth::verify_password(&password, &stored_digest) {
        tracing::warn!("Login failed: bad password for '{}'", email);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let role_str: String = user_row.get("role");
    let role = Role::parse(&role_str).ok_or_else(|| {
        tracing::error!("User '{}' has unrecognized role '{}'", email, role_str);
        ApiError::forbidden("User has no recognized role")
    })?;

    let auth_user = AuthUser {
        id: user_row.get("id"),
        name: user_row.get("name"),
        email: user_row.get("email"),
        role,
        student_id: user_row.get("student_id"),
    };

    tracing::debug!("Authenticated {} as {}", auth_user.email, auth_user.role);

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Middleware for registry-level routes: checks credential headers against
/// campus_main.admins. These routes carry no college header.
pub async fn super_admin_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (email, password) = extract_credentials(&headers)?;

    let registry = CollegeRegistry::new().await?;
    let admin = registry
        .find_admin(&email)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Super admin login failed: no admin '{}'", email);
            ApiError::unauthorized("Invalid credentials")
        })?;

    let (id, admin_email, stored_digest) = admin;
    if !auth::verify_password(&password, &stored_digest) {
        tracing::warn!("Super admin login failed: bad password for '{}'", email);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let auth_user = AuthUser {
        id,
        name: admin_email.clone(),
        email: admin_email,
        role: Role::SuperAdmin,
        student_id: None,
    };

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}
