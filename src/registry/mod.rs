use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::auth;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::schema;

/// A registered college: one row in campus_main.colleges, one physical database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CollegeInfo {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub database: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    Database(#[from] DatabaseError),
    #[error("College already exists: {0}")]
    AlreadyExists(String),
    #[error("College not found: {0}")]
    NotFound(String),
    #[error("Invalid college code: {0}")]
    InvalidCode(String),
}

/// Master-registry operations: college provisioning and code-to-database
/// resolution. All queries run against campus_main.
pub struct CollegeRegistry {
    master_pool: PgPool,
}

impl CollegeRegistry {
    pub async fn new() -> Result<Self, RegistryError> {
        let master_pool = DatabaseManager::master_pool().await?;
        Ok(Self { master_pool })
    }

    /// Startup hook: apply the master schema and seed the super admin from
    /// env, when configured. Safe to run repeatedly.
    pub async fn bootstrap() -> Result<(), RegistryError> {
        let registry = Self::new().await?;
        schema::apply_master_schema(&registry.master_pool).await?;

        if let (Ok(email), Ok(password)) = (
            std::env::var("CAMPUS_SUPER_ADMIN_EMAIL"),
            std::env::var("CAMPUS_SUPER_ADMIN_PASSWORD"),
        ) {
            registry.seed_super_admin(&email, &password).await?;
        }

        Ok(())
    }

    /// Insert a super admin credential if that email is not yet registered
    pub async fn seed_super_admin(&self, email: &str, password: &str) -> Result<(), RegistryError> {
        sqlx::query(
            "INSERT INTO admins (email, password_digest) VALUES ($1, $2) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(email)
        .bind(auth::password_digest(password))
        .execute(&self.master_pool)
        .await?;
        Ok(())
    }

    /// Create a new college: physical database, tenant schema, registry row,
    /// and the college's first admin user.
    pub async fn create_college(
        &self,
        code: &str,
        name: &str,
        admin_name: &str,
        admin_email: &str,
        admin_password: &str,
    ) -> Result<CollegeInfo, RegistryError> {
        Self::validate_code(code)?;
        let database = Self::database_name(code);

        if self.college_exists(code).await? {
            return Err(RegistryError::AlreadyExists(code.to_string()));
        }

        DatabaseManager::create_database(&database).await?;

        // Apply the tenant schema and seed the first admin before the college
        // becomes resolvable through the registry.
        let pool = DatabaseManager::college_pool(&database).await?;
        schema::apply_tenant_schema(&pool).await?;
        sqlx::query(
            "INSERT INTO users (name, email, password_digest, role) VALUES ($1, $2, $3, 'admin')",
        )
        .bind(admin_name)
        .bind(admin_email)
        .bind(auth::password_digest(admin_password))
        .execute(&pool)
        .await?;

        let college: CollegeInfo = sqlx::query_as(
            r#"
            INSERT INTO colleges (code, name, database)
            VALUES ($1, $2, $3)
            RETURNING id, code, name, database, is_active, created_at, updated_at, deleted_at
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(&database)
        .fetch_one(&self.master_pool)
        .await?;

        tracing::info!("Registered college '{}' -> {}", code, database);
        Ok(college)
    }

    /// Drop a college: soft-delete the registry row, then drop the physical
    /// database (the cached pool is evicted by the manager).
    pub async fn drop_college(&self, code: &str) -> Result<(), RegistryError> {
        let college = self
            .resolve(code)
            .await?
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))?;

        sqlx::query("UPDATE colleges SET deleted_at = now(), updated_at = now() WHERE id = $1")
            .bind(college.id)
            .execute(&self.master_pool)
            .await?;

        DatabaseManager::drop_database(&college.database).await?;

        tracing::info!("Dropped college '{}' ({})", code, college.database);
        Ok(())
    }

    /// Resolve a college code to its registry row. Soft-deleted and inactive
    /// colleges do not resolve.
    pub async fn resolve(&self, code: &str) -> Result<Option<CollegeInfo>, RegistryError> {
        let college = sqlx::query_as(
            r#"
            SELECT id, code, name, database, is_active, created_at, updated_at, deleted_at
            FROM colleges
            WHERE code = $1 AND is_active = TRUE AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .fetch_optional(&self.master_pool)
        .await?;
        Ok(college)
    }

    /// List all registered colleges that are not soft-deleted
    pub async fn list_colleges(&self) -> Result<Vec<CollegeInfo>, RegistryError> {
        let colleges = sqlx::query_as(
            r#"
            SELECT id, code, name, database, is_active, created_at, updated_at, deleted_at
            FROM colleges
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.master_pool)
        .await?;
        Ok(colleges)
    }

    /// Look up a super admin credential row by email
    pub async fn find_admin(
        &self,
        email: &str,
    ) -> Result<Option<(i64, String, String)>, RegistryError> {
        let row: Option<(i64, String, String)> =
            sqlx::query_as("SELECT id, email, password_digest FROM admins WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.master_pool)
                .await?;
        Ok(row)
    }

    async fn college_exists(&self, code: &str) -> Result<bool, RegistryError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM colleges WHERE code = $1 AND deleted_at IS NULL")
                .bind(code)
                .fetch_one(&self.master_pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Derive the physical database name for a college code
    pub fn database_name(code: &str) -> String {
        format!("college_{}", code)
    }

    /// Validate a college code. Codes become part of the database name, so
    /// the character set is restricted to [a-z0-9_] with a leading letter.
    pub fn validate_code(code: &str) -> Result<(), RegistryError> {
        if code.len() < 2 || code.len() > 32 {
            return Err(RegistryError::InvalidCode(
                "College code must be 2-32 characters".to_string(),
            ));
        }
        if !code.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
            return Err(RegistryError::InvalidCode(
                "College code must start with a lowercase letter".to_string(),
            ));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(RegistryError::InvalidCode(
                "College code can only contain lowercase letters, digits, and underscores"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseManager;

    #[test]
    fn validates_college_codes() {
        assert!(CollegeRegistry::validate_code("springfield").is_ok());
        assert!(CollegeRegistry::validate_code("tech_01").is_ok());
        assert!(CollegeRegistry::validate_code("a").is_err());
        assert!(CollegeRegistry::validate_code("1college").is_err());
        assert!(CollegeRegistry::validate_code("Springfield").is_err());
        assert!(CollegeRegistry::validate_code("spring-field").is_err());
        assert!(CollegeRegistry::validate_code("x; DROP DATABASE").is_err());
    }

    #[test]
    fn database_names_pass_manager_validation() {
        for code in ["springfield", "tech_01", "north_campus"] {
            CollegeRegistry::validate_code(code).unwrap();
            assert!(DatabaseManager::is_valid_db_name(
                &CollegeRegistry::database_name(code)
            ));
        }
    }
}
