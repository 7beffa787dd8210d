use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Serialize;

use crate::auth::Role;
use crate::domain::grades;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantPool};
use crate::models::{ExamScore, ExamScorePayload};

const SCORE_COLUMNS: &str = "id, student_id, subject, semester, marks, credits";

#[derive(Debug, Serialize)]
pub struct GradeLine {
    pub subject: String,
    pub semester: i32,
    pub marks: i32,
    pub credits: i32,
    pub grade_point: i32,
    pub letter: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GradeReport {
    pub student_id: i64,
    pub student_name: String,
    pub lines: Vec<GradeLine>,
    pub cgpa: f64,
}

/// POST /api/scores
pub async fn create(
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ExamScorePayload>,
) -> ApiResult<ExamScore> {
    user.require(&[Role::Admin])?;
    payload.validate()?;

    super::students::fetch_student(&pool, payload.student_id).await?;

    let score = sqlx::query_as::<_, ExamScore>(&format!(
        "INSERT INTO exam_scores (student_id, subject, semester, marks, credits) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        SCORE_COLUMNS
    ))
    .bind(payload.student_id)
    .bind(&payload.subject)
    .bind(payload.semester)
    .bind(payload.marks)
    .bind(payload.credits)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(score))
}

/// GET /api/students/:id/scores
pub async fn list_for_student(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<ExamScore>> {
    user.require_self_or(id, &[Role::Admin])?;

    super::students::fetch_student(&pool, id).await?;

    let scores = sqlx::query_as::<_, ExamScore>(&format!(
        "SELECT {} FROM exam_scores WHERE student_id = $1 ORDER BY semester, subject",
        SCORE_COLUMNS
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::success(scores))
}

/// GET /api/students/:id/grade-report - all scores with grade points and CGPA
pub async fn grade_report(
    Path(id): Path<i64>,
    Extension(TenantPool(pool)): Extension<TenantPool>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<GradeReport> {
    user.require_self_or(id, &[Role::Admin])?;

    let student = super::students::fetch_student(&pool, id).await?;

    let scores = sqlx::query_as::<_, ExamScore>(&format!(
        "SELECT {} FROM exam_scores WHERE student_id = $1 ORDER BY semester, subject",
        SCORE_COLUMNS
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let lines: Vec<GradeLine> = scores
        .iter()
        .map(|s| {
            let gp = grades::grade_point(s.marks);
            GradeLine {
                subject: s.subject.clone(),
                semester: s.semester,
                marks: s.marks,
                credits: s.credits,
                grade_point: gp,
                letter: grades::letter_grade(gp),
            }
        })
        .collect();

    let entries: Vec<(i32, i32)> = lines.iter().map(|l| (l.grade_point, l.credits)).collect();

    Ok(ApiResponse::success(GradeReport {
        student_id: student.id,
        student_name: student.name,
        cgpa: grades::cgpa(&entries),
        lines,
    }))
}
