use sqlx::PgPool;

use super::manager::DatabaseError;

/// Master registry tables, applied idempotently at startup.
const MASTER_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS colleges (
        id BIGSERIAL PRIMARY KEY,
        code TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        database TEXT UNIQUE NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id BIGSERIAL PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        password_digest TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Per-college tables, applied to a freshly created college database.
const TENANT_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS departments (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        code TEXT UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        phone TEXT NOT NULL,
        department_id BIGINT REFERENCES departments(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password_digest TEXT NOT NULL,
        role TEXT NOT NULL,
        student_id BIGINT REFERENCES students(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT,
        copies INT NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS issued_books (
        id BIGSERIAL PRIMARY KEY,
        student_id BIGINT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        book_id BIGINT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        issue_date TIMESTAMPTZ NOT NULL DEFAULT now(),
        due_date DATE NOT NULL,
        return_date TIMESTAMPTZ,
        is_returned BOOLEAN NOT NULL DEFAULT FALSE,
        fine_amount BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS exam_scores (
        id BIGSERIAL PRIMARY KEY,
        student_id BIGINT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        subject TEXT NOT NULL,
        semester INT NOT NULL,
        marks INT NOT NULL,
        credits INT NOT NULL DEFAULT 4
    )
    "#,
];

/// Apply the master registry schema to the campus_main database
pub async fn apply_master_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    apply(pool, MASTER_TABLES).await
}

/// Apply the per-college schema to a college database
pub async fn apply_tenant_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    apply(pool, TENANT_TABLES).await
}

async fn apply(pool: &PgPool, statements: &[&str]) -> Result<(), DatabaseError> {
    for ddl in statements {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
