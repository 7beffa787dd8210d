use axum::extract::Extension;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::auth::Role;
use crate::domain::grades;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantPool};

#[derive(Debug, Serialize)]
pub struct DepartmentCount {
    pub department: String,
    pub students: i64,
}

#[derive(Debug, Serialize)]
pub struct DepartmentCgpa {
    pub department: String,
    pub average_cgpa: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub students_by_department: Vec<DepartmentCount>,
    pub overdue_issues: i64,
    pub total_fines: i64,
    pub cgpa_by_department: Vec<DepartmentCgpa>,
}

/// GET /api/analytics/summary - per-college rollups
pub async fn summary(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<AnalyticsSummary> {
    user.require(&[Role::Admin])?;

    let counts: Vec<(String, i64)> = sqlx::query_as(
        "SELECT COALESCE(d.name, 'unassigned') AS department, COUNT(s.id) AS students \
         FROM students s LEFT JOIN departments d ON s.department_id = d.id \
         GROUP BY 1 ORDER BY 1",
    )
    .fetch_all(&pool)
    .await?;

    let overdue: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM issued_books \
         WHERE is_returned = FALSE AND due_date < CURRENT_DATE",
    )
    .fetch_one(&pool)
    .await?;

    let fines: (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(fine_amount), 0) FROM issued_books")
            .fetch_one(&pool)
            .await?;

    // Grade points are a domain mapping, so the per-department CGPA average
    // is aggregated here rather than in SQL.
    let score_rows: Vec<(String, i32, i32)> = sqlx::query_as(
        "SELECT COALESCE(d.name, 'unassigned') AS department, e.marks, e.credits \
         FROM exam_scores e \
         JOIN students s ON e.student_id = s.id \
         LEFT JOIN departments d ON s.department_id = d.id",
    )
    .fetch_all(&pool)
    .await?;

    let mut by_department: BTreeMap<String, Vec<(i32, i32)>> = BTreeMap::new();
    for (department, marks, credits) in score_rows {
        by_department
            .entry(department)
            .or_default()
            .push((grades::grade_point(marks), credits));
    }

    let cgpa_by_department = by_department
        .into_iter()
        .map(|(department, entries)| DepartmentCgpa {
            department,
            average_cgpa: grades::cgpa(&entries),
        })
        .collect();

    Ok(ApiResponse::success(AnalyticsSummary {
        students_by_department: counts
            .into_iter()
            .map(|(department, students)| DepartmentCount {
                department,
                students,
            })
            .collect(),
        overdue_issues: overdue.0,
        total_fines: fines.0,
        cgpa_by_department,
    }))
}
