mod support;

use serde_json::json;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use support::{login_faculty, open_section, spawn_sidecar, FakeBackend};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn session_cookie_and_content_types_follow_the_body() {
    let backend = FakeBackend::start();
    let mut sidecar = spawn_sidecar(&backend.base);
    open_section(&mut sidecar, &backend);

    let login = backend.last("POST", "/faculty_login");
    assert!(login
        .header("content-type")
        .is_some_and(|ct| ct.starts_with("application/json")));
    assert_eq!(
        login.json(),
        json!({ "userId": "faculty", "password": "secret", "accountType": "main" })
    );

    let students = backend.last("GET", "/get_students/BSc/1/A");
    assert!(students
        .header("cookie")
        .is_some_and(|c| c.contains("session=fac-1")));

    backend.clear();
    sidecar.request_ok(
        "students.add",
        json!({ "name": "Asha", "rollNumber": "R1", "email": "asha@example.com" }),
    );
    let add = backend.last("POST", "/add_student/BSc/1/A");
    let ct = add.header("content-type").expect("multipart content type");
    assert!(ct.starts_with("multipart/form-data; boundary="), "{}", ct);
    let body = add.body_text();
    assert!(body.contains("name=\"rollNumber\""));
    assert!(body.contains("name=\"createdAt\""));
    assert!(!body.contains("name=\"studentPhoto\""));
    assert_eq!(
        backend.calls(),
        vec![
            "POST /add_student/BSc/1/A".to_string(),
            "GET /get_students/BSc/1/A".to_string()
        ]
    );

    sidecar.request_ok(
        "activities.add",
        json!({ "name": "Debate", "details": "Inter-college" }),
    );
    let activity = backend.last("POST", "/add_activity/BSc/1/A");
    assert!(activity
        .header("content-type")
        .is_some_and(|ct| ct.starts_with("application/json")));
    assert_eq!(activity.json()["name"], json!("Debate"));
    assert!(activity.json()["createdAt"].is_string());

    sidecar.shutdown();
}

#[test]
fn student_photo_goes_out_as_a_file_part() {
    let backend = FakeBackend::start();
    let mut sidecar = spawn_sidecar(&backend.base);
    open_section(&mut sidecar, &backend);

    let dir = temp_dir("trackd-student-photo");
    let photo = dir.join("asha.png");
    std::fs::write(&photo, b"\x89PNG fake image bytes").expect("write photo");

    backend.clear();
    sidecar.request_ok(
        "students.add",
        json!({
            "name": "Asha",
            "rollNumber": "R1",
            "email": "asha@example.com",
            "photoPath": photo.to_string_lossy()
        }),
    );
    let add = backend.last("POST", "/add_student/BSc/1/A");
    let ct = add.header("content-type").expect("multipart content type");
    assert!(ct.starts_with("multipart/form-data; boundary="), "{}", ct);
    let body = add.body_text();
    assert!(body.contains("name=\"studentPhoto\"; filename=\"asha.png\""));
    assert!(body.contains("PNG fake image bytes"));
    assert!(body.contains("name=\"rollNumber\"\r\n\r\nR1"));

    sidecar.shutdown();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unauthorized_response_forces_logout() {
    let backend = FakeBackend::start();
    let mut sidecar = spawn_sidecar(&backend.base);
    open_section(&mut sidecar, &backend);

    backend.json(
        "GET",
        "/get_activities/BSc/1/A",
        401,
        json!({ "error": "Unauthorized" }),
    );
    let error = sidecar.request_err("activities.list", json!({}));
    assert_eq!(error["code"], json!("unauthorized"));
    assert_eq!(
        backend.calls().last().map(String::as_str),
        Some("GET /logout")
    );
    assert_eq!(error["details"]["view"]["page"], json!("landing"));
    assert_eq!(error["details"]["view"]["user"], json!(null));
    assert_eq!(
        error["details"]["history"],
        json!([{ "op": "push", "entry": { "page": "landing" } }])
    );

    let session = sidecar.request_ok("session.get", json!({}));
    assert_eq!(session["data"]["user"], json!(null));
    assert_eq!(session["view"]["selection"]["section"], json!(null));

    let error = sidecar.request_err("students.list", json!({}));
    assert_eq!(error["code"], json!("no_selection"));

    sidecar.shutdown();
}

#[test]
fn html_and_error_payloads_become_structured_errors() {
    let backend = FakeBackend::start();
    let mut sidecar = spawn_sidecar(&backend.base);
    login_faculty(&mut sidecar, &backend);

    // Login-page redirect target served as HTML is not JSON, whatever the status.
    backend.html("GET", "/get_courses", 200);
    let error = sidecar.request_err("courses.list", json!({}));
    assert_eq!(error["code"], json!("api_error"));
    assert_eq!(error["details"]["title"], json!("API Error"));
    assert_eq!(error["details"]["view"]["page"], json!("facultyDashboard"));

    backend.json(
        "POST",
        "/add_course",
        400,
        json!({ "error": "Course already exists" }),
    );
    let error = sidecar.request_err("courses.add", json!({ "name": "BSc" }));
    assert_eq!(error["code"], json!("app_error"));
    assert_eq!(error["message"], json!("Course already exists"));

    // An error status with a clean JSON body is still a success.
    backend.json("GET", "/get_courses", 500, json!(["BSc"]));
    let listed = sidecar.request_ok("courses.list", json!({}));
    assert_eq!(listed["data"]["courses"], json!(["BSc"]));

    // A session still counts as logged in after ordinary failures.
    let session = sidecar.request_ok("session.get", json!({}));
    assert_eq!(session["data"]["user"]["type"], json!("faculty"));

    sidecar.shutdown();
}

#[test]
fn unreachable_backend_is_an_api_error() {
    let mut sidecar = spawn_sidecar("http://127.0.0.1:9/");
    let error = sidecar.request_err(
        "auth.facultyLogin",
        json!({ "userId": "faculty", "password": "secret" }),
    );
    assert_eq!(error["code"], json!("api_error"));
    assert_eq!(error["details"]["title"], json!("API Error"));
    assert_eq!(error["details"]["view"]["page"], json!("landing"));
    sidecar.shutdown();
}

#[test]
fn student_login_failures_target_the_student_form() {
    let backend = FakeBackend::start();
    let mut sidecar = spawn_sidecar(&backend.base);

    backend.json(
        "POST",
        "/student_login",
        200,
        json!({ "success": false, "error": "Invalid credentials" }),
    );
    let error = sidecar.request_err(
        "auth.studentLogin",
        json!({ "rollNumber": "R1", "email": "a@example.com", "password": "x" }),
    );
    assert_eq!(error["code"], json!("app_error"));
    assert_eq!(error["message"], json!("Invalid credentials"));
    assert_eq!(error["details"]["target"], json!("studentLoginError"));

    backend.html("POST", "/student_login", 500);
    let error = sidecar.request_err(
        "auth.studentLogin",
        json!({ "rollNumber": "R1", "email": "a@example.com", "password": "x" }),
    );
    assert_eq!(
        error["message"],
        json!("Login failed. Please check your credentials.")
    );
    assert_eq!(error["details"]["target"], json!("studentLoginError"));

    sidecar.shutdown();
}
