mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

const SUPER_EMAIL: &str = "root@campus.test";
const SUPER_PASSWORD: &str = "super-secret-1";

fn super_admin_headers(req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.header("X-User-Email", SUPER_EMAIL)
        .header("X-User-Password", SUPER_PASSWORD)
}

fn tenant_headers(
    req: reqwest::RequestBuilder,
    college: &str,
    email: &str,
    password: &str,
) -> reqwest::RequestBuilder {
    req.header("X-College-Code", college)
        .header("X-User-Email", email)
        .header("X-User-Password", password)
}

/// End-to-end flow against a live Postgres: provision a college, run the
/// student/book/lending/score lifecycle inside it, then drop it.
#[tokio::test]
async fn college_lifecycle() -> Result<()> {
    if !common::server_tests_enabled() {
        return Ok(());
    }

    // Seed the super admin before the server process is spawned
    std::env::set_var("CAMPUS_SUPER_ADMIN_EMAIL", SUPER_EMAIL);
    std::env::set_var("CAMPUS_SUPER_ADMIN_PASSWORD", SUPER_PASSWORD);

    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    // Unique code per run so reruns do not collide
    let code = format!("it_{}", std::process::id());
    let admin_email = "dean@college.test";
    let admin_password = "dean-password";

    // Provision
    let res = super_admin_headers(client.post(format!("{}/api/colleges", base)))
        .json(&json!({
            "code": code,
            "name": "Integration College",
            "admin": { "name": "Dean", "email": admin_email, "password": admin_password }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "{:?}", res.text().await);

    // Unknown college code is rejected before auth
    let res = tenant_headers(
        client.get(format!("{}/api/students", base)),
        "no_such_college",
        admin_email,
        admin_password,
    )
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Wrong password is a 401
    let res = tenant_headers(
        client.get(format!("{}/api/students", base)),
        &code,
        admin_email,
        "wrong-password",
    )
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let as_admin = |req: reqwest::RequestBuilder| {
        tenant_headers(req, &code, admin_email, admin_password)
    };

    // Department + student
    let res = as_admin(client.post(format!("{}/api/departments", base)))
        .json(&json!({ "name": "Computer Science", "code": "CS" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let dept: Value = res.json().await?;
    let dept_id = dept["data"]["id"].as_i64().unwrap();

    let res = as_admin(client.post(format!("{}/api/students", base)))
        .json(&json!({
            "name": "Asha Rao",
            "email": "asha@college.test",
            "phone": "9876543210",
            "department_id": dept_id
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let student: Value = res.json().await?;
    let student_id = student["data"]["id"].as_i64().unwrap();

    // Validation failure carries field errors
    let res = as_admin(client.post(format!("{}/api/students", base)))
        .json(&json!({ "name": "Bad", "email": "nope", "phone": "123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Book, issue, double-issue rejected, return
    let res = as_admin(client.post(format!("{}/api/books", base)))
        .json(&json!({ "title": "The Art of Computer Programming" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let book: Value = res.json().await?;
    let book_id = book["data"]["id"].as_i64().unwrap();

    let res = as_admin(client.post(format!("{}/api/lending", base)))
        .json(&json!({ "student_id": student_id, "book_id": book_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let issue: Value = res.json().await?;
    let issue_id = issue["data"]["id"].as_i64().unwrap();

    let res = as_admin(client.post(format!("{}/api/lending", base)))
        .json(&json!({ "student_id": student_id, "book_id": book_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = as_admin(client.put(format!("{}/api/lending/{}/return", base, issue_id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let returned: Value = res.json().await?;
    assert_eq!(returned["data"]["is_returned"], true);
    // Returned within the loan period, so no fine
    assert_eq!(returned["data"]["fine_amount"], 0);

    // Returning the same issue again is rejected
    let res = as_admin(client.put(format!("{}/api/lending/{}/return", base, issue_id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // An issue past its due date shows up in the delayed list and its
    // return carries a fine
    let res = as_admin(client.post(format!("{}/api/books", base)))
        .json(&json!({ "title": "Overdue Tales" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let overdue_book: Value = res.json().await?;
    let overdue_book_id = overdue_book["data"]["id"].as_i64().unwrap();

    let res = as_admin(client.post(format!("{}/api/lending", base)))
        .json(&json!({
            "student_id": student_id,
            "book_id": overdue_book_id,
            "due_date": "2020-01-01"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let overdue_issue: Value = res.json().await?;
    let overdue_issue_id = overdue_issue["data"]["id"].as_i64().unwrap();

    let res = as_admin(client.get(format!("{}/api/lending/delayed", base)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let delayed: Value = res.json().await?;
    let delayed_ids: Vec<i64> = delayed["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect();
    assert_eq!(delayed_ids, vec![overdue_issue_id]);

    let res = as_admin(client.put(format!(
        "{}/api/lending/{}/return",
        base, overdue_issue_id
    )))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let returned: Value = res.json().await?;
    assert!(returned["data"]["fine_amount"].as_i64().unwrap() > 0);

    // Once returned it drops out of the delayed list
    let res = as_admin(client.get(format!("{}/api/lending/delayed", base)))
        .send()
        .await?;
    let delayed: Value = res.json().await?;
    assert!(delayed["data"].as_array().unwrap().is_empty());

    // Scores and grade report
    for (subject, marks) in [("Algorithms", 91), ("Databases", 74)] {
        let res = as_admin(client.post(format!("{}/api/scores", base)))
            .json(&json!({
                "student_id": student_id,
                "subject": subject,
                "semester": 1,
                "marks": marks,
                "credits": 4
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = as_admin(client.get(format!(
        "{}/api/students/{}/grade-report",
        base, student_id
    )))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await?;
    // (10*4 + 8*4) / 8 = 9.0
    assert_eq!(report["data"]["cgpa"], 9.0);
    assert_eq!(report["data"]["lines"].as_array().unwrap().len(), 2);

    // A student account sees its own records but nobody else's
    let res = as_admin(client.post(format!("{}/api/users", base)))
        .json(&json!({
            "name": "Asha Rao",
            "email": "asha.user@college.test",
            "password": "student-pass-1",
            "role": "student",
            "student_id": student_id
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let as_student = |req: reqwest::RequestBuilder| {
        tenant_headers(req, &code, "asha.user@college.test", "student-pass-1")
    };
    let res = as_student(client.get(format!("{}/api/students/{}", base, student_id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = as_student(client.get(format!("{}/api/students/{}", base, student_id + 1)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = as_student(client.get(format!("{}/api/analytics/summary", base)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Librarians handle books and lending but have no access to exam scores
    let res = as_admin(client.post(format!("{}/api/users", base)))
        .json(&json!({
            "name": "Lee Park",
            "email": "lee@college.test",
            "password": "librarian-pass-1",
            "role": "librarian"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let as_librarian = |req: reqwest::RequestBuilder| {
        tenant_headers(req, &code, "lee@college.test", "librarian-pass-1")
    };
    let res = as_librarian(client.get(format!("{}/api/students", base)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = as_librarian(client.get(format!("{}/api/students/{}/scores", base, student_id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = as_librarian(client.get(format!(
        "{}/api/students/{}/grade-report",
        base, student_id
    )))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // whoami reports the resolved college and student linkage
    let res = as_student(client.get(format!("{}/api/auth/whoami", base)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let identity: Value = res.json().await?;
    assert_eq!(identity["data"]["college"], code.as_str());
    assert_eq!(identity["data"]["student_id"].as_i64(), Some(student_id));

    // Analytics rollup for the admin
    let res = as_admin(client.get(format!("{}/api/analytics/summary", base)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let summary: Value = res.json().await?;
    assert_eq!(
        summary["data"]["students_by_department"][0]["students"],
        1
    );

    // Deleting the student cascades lending and scores and unlinks the
    // user account rather than leaving it pointing at a missing row
    let res = as_admin(client.delete(format!("{}/api/students/{}", base, student_id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = as_student(client.get(format!("{}/api/auth/whoami", base)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let identity: Value = res.json().await?;
    assert_eq!(identity["data"]["student_id"], Value::Null);

    // Drop the college; its code stops resolving
    let res = super_admin_headers(client.delete(format!("{}/api/colleges/{}", base, code)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = as_admin(client.get(format!("{}/api/students", base)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}
