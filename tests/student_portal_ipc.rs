mod support;

use serde_json::{json, Value};
use support::{spawn_sidecar, FakeBackend, Sidecar};

fn student_backend() -> FakeBackend {
    let backend = FakeBackend::start();
    backend.json_with_cookie(
        "POST",
        "/student_login",
        json!({ "success": true }),
        "session=stu-1; Path=/",
    );
    backend.json(
        "GET",
        "/student_data",
        200,
        json!({
            "student": { "id": "s1", "name": "Asha", "rollNumber": "R1", "photo": "asha.png" },
            "activities": [{ "name": "Debate", "remarks": "won" }],
            "course": "BSc",
            "year": "1",
            "section": "A"
        }),
    );
    backend.json(
        "GET",
        "/student_attendance_subjects",
        200,
        json!(["Maths", "Physics"]),
    );
    backend.json(
        "GET",
        "/student_attendance_records?subject=Maths&detailed=1",
        200,
        json!({
            "present": { "2025-03-04": 2, "2025-02-10T00:00:00": "1" },
            "absent": { "2025-03-10": 1 }
        }),
    );
    backend.html(
        "GET",
        "/student_attendance_records?subject=Physics&detailed=1",
        500,
    );
    backend
}

fn login_student(sidecar: &mut Sidecar) -> Value {
    sidecar.request_ok(
        "auth.studentLogin",
        json!({ "rollNumber": "R1", "email": "asha@example.com", "password": "pw" }),
    )
}

fn badges(grid: &Value, day: usize) -> Value {
    grid["days"][day - 1]["badges"].clone()
}

#[test]
fn student_login_loads_profile() {
    let backend = student_backend();
    let mut sidecar = spawn_sidecar(&backend.base);

    let login = login_student(&mut sidecar);
    assert_eq!(login["view"]["page"], json!("studentDashboard"));
    assert_eq!(login["view"]["user"]["type"], json!("student"));
    assert_eq!(login["view"]["permissions"]["isAdmin"], json!(false));
    assert_eq!(login["data"]["photoUrl"], json!("/uploads/asha.png"));
    assert_eq!(login["data"]["course"], json!("BSc"));
    assert_eq!(
        login["history"],
        json!([{ "op": "push", "entry": { "page": "studentDashboard" } }])
    );
    assert!(backend
        .last("GET", "/student_data")
        .header("cookie")
        .is_some_and(|c| c.contains("session=stu-1")));

    let error = sidecar.request_err("courses.add", json!({ "name": "BSc" }));
    assert_eq!(error["code"], json!("forbidden"));

    sidecar.shutdown();
}

#[test]
fn attendance_summary_and_calendar() {
    let backend = student_backend();
    let mut sidecar = spawn_sidecar(&backend.base);
    login_student(&mut sidecar);

    let summary = sidecar.request_ok("studentAttendance.summary", json!({}));
    assert_eq!(
        summary["data"]["rows"],
        json!([
            { "subject": "Maths", "summary": { "present": 3, "absent": 1, "total": 4, "percentage": 75 } },
            { "subject": "Physics", "summary": { "present": 0, "absent": 0, "total": 0, "percentage": 0 } }
        ])
    );

    // Opens on the month of the latest present date.
    let opened = sidecar.request_ok("studentAttendance.open", json!({}));
    let calendar = &opened["data"]["calendar"];
    assert_eq!(calendar["subject"], json!("Maths"));
    assert_eq!(calendar["hasAny"], json!(true));
    let grid = &calendar["grid"];
    assert_eq!(grid["label"], json!("March 2025"));
    assert_eq!(grid["leadingBlanks"], json!(6));
    assert_eq!(grid["days"].as_array().map(Vec::len), Some(31));
    assert_eq!(badges(grid, 4), json!(["P:2"]));
    assert_eq!(badges(grid, 10), json!(["A:1"]));
    assert_eq!(badges(grid, 5), Value::Null);
    assert_eq!(grid["hasAnyForMonth"], json!(true));

    let prev = sidecar.request_ok("studentAttendance.prevMonth", json!({}));
    let grid = &prev["data"]["calendar"]["grid"];
    assert_eq!(grid["label"], json!("February 2025"));
    assert_eq!(grid["days"].as_array().map(Vec::len), Some(28));
    assert_eq!(badges(grid, 10), json!(["P:1"]));

    sidecar.request_ok("studentAttendance.nextMonth", json!({}));
    let next = sidecar.request_ok("studentAttendance.nextMonth", json!({}));
    let grid = &next["data"]["calendar"]["grid"];
    assert_eq!(grid["label"], json!("April 2025"));
    assert_eq!(grid["leadingBlanks"], json!(2));
    assert_eq!(grid["hasAnyForMonth"], json!(false));
    assert_eq!(next["history"], json!([]));

    let physics = sidecar.request_err("studentAttendance.open", json!({ "subject": "Physics" }));
    assert_eq!(physics["code"], json!("api_error"));

    sidecar.shutdown();
}

#[test]
fn dispute_draft_validates_and_submits() {
    let backend = student_backend();
    let mut sidecar = spawn_sidecar(&backend.base);
    login_student(&mut sidecar);

    let error = sidecar.request_err("dispute.toggleDate", json!({ "date": "2025-03-04" }));
    assert_eq!(error["code"], json!("no_selection"));

    let opened = sidecar.request_ok("dispute.open", json!({ "subject": "Maths" }));
    assert_eq!(opened["data"]["subjects"], json!(["Maths", "Physics"]));
    assert_eq!(opened["data"]["dispute"]["subject"], json!("Maths"));

    for date in ["2025-03-04", "2025-03-01T09:30:00", "2025-03-04"] {
        sidecar.request_ok("dispute.toggleDate", json!({ "date": date }));
    }
    let error = sidecar.request_err("dispute.submit", json!({ "description": "   " }));
    assert_eq!(error["code"], json!("bad_params"));

    backend.json(
        "POST",
        "/student_attendance_issue",
        200,
        json!({ "success": true, "issue": { "id": "i1", "status": "open" } }),
    );
    let submitted = sidecar.request_ok(
        "dispute.submit",
        json!({ "description": " Marked absent by mistake " }),
    );
    assert_eq!(submitted["data"]["result"]["issue"]["status"], json!("open"));
    assert_eq!(
        backend.last("POST", "/student_attendance_issue").json(),
        json!({
            "subject": "Maths",
            "dates": ["2025-03-01"],
            "description": "Marked absent by mistake"
        })
    );

    // The draft is gone once submitted.
    let error = sidecar.request_err("dispute.nextMonth", json!({}));
    assert_eq!(error["code"], json!("no_selection"));

    sidecar.request_ok("dispute.list", json!({ "subject": "Maths" }));
    assert!(backend
        .calls()
        .contains(&"GET /student_attendance_issues?subject=Maths".to_string()));

    sidecar.shutdown();
}

#[test]
fn self_update_rules() {
    let backend = student_backend();
    let mut sidecar = spawn_sidecar(&backend.base);
    login_student(&mut sidecar);

    let error = sidecar.request_err("student.selfUpdate", json!({}));
    assert_eq!(error["code"], json!("bad_params"));

    let error = sidecar.request_err("student.selfUpdate", json!({ "newPassword": "n3w" }));
    assert_eq!(error["code"], json!("bad_params"));
    let error = sidecar.request_err(
        "student.selfUpdate",
        json!({ "currentPassword": "   ", "newPassword": "n3w" }),
    );
    assert_eq!(error["code"], json!("bad_params"));
    assert!(!backend
        .calls()
        .iter()
        .any(|c| c.starts_with("POST /student_self_update")));

    backend.json(
        "POST",
        "/student_self_update",
        200,
        json!({ "success": true, "student": { "id": "s1", "photo": "asha2.png" } }),
    );
    let updated = sidecar.request_ok(
        "student.selfUpdate",
        json!({ "currentPassword": "pw", "newPassword": "n3w" }),
    );
    assert_eq!(updated["data"]["photoUrl"], json!("/uploads/asha2.png"));
    let sent = backend.last("POST", "/student_self_update");
    assert!(sent
        .header("content-type")
        .is_some_and(|ct| ct.starts_with("multipart/form-data")));
    let body = sent.body_text();
    assert!(body.contains("name=\"currentPassword\""));
    assert!(body.contains("name=\"newPassword\""));

    sidecar.shutdown();
}

#[test]
fn student_thread_with_main_admin() {
    let backend = student_backend();
    backend.json(
        "GET",
        "/student_teachers",
        200,
        json!([
            { "name": "Main Admin", "userId": "faculty", "photo": null },
            { "name": "R. Iyer", "userId": "t2", "photo": "iyer.png" }
        ]),
    );
    backend.json(
        "GET",
        "/messages/thread/BSc/1/A",
        200,
        json!([
            { "from": "student", "text": "Is the test on Monday?" },
            { "from": "teacher", "text": "Yes" }
        ]),
    );
    let mut sidecar = spawn_sidecar(&backend.base);
    login_student(&mut sidecar);

    let error = sidecar.request_err("chat.openTeacherThread", json!({ "teacherId": "nobody" }));
    assert_eq!(error["code"], json!("bad_params"));

    let opened = sidecar.request_ok("chat.openTeacherThread", json!({ "teacherId": "t2" }));
    let data = &opened["data"];
    assert_eq!(data["chat"]["peerName"], json!("R. Iyer"));
    assert_eq!(data["chat"]["peerPhoto"], json!("/uploads/iyer.png"));
    assert_eq!(data["meta"], json!("BSc > 1 > A"));
    assert_eq!(data["messages"][0]["mine"], json!(true));
    assert_eq!(data["messages"][1]["mine"], json!(false));
    assert!(backend
        .calls()
        .contains(&"GET /messages/thread/BSc/1/A?studentId=s1&teacherId=t2".to_string()));

    backend.json(
        "POST",
        "/messages/send/BSc/1/A",
        200,
        json!({ "success": true, "message": { "from": "student", "text": "Thanks" } }),
    );
    let sent = sidecar.request_ok("chat.send", json!({ "text": "Thanks" }));
    assert_eq!(sent["data"]["message"]["mine"], json!(true));
    let body = backend.last("POST", "/messages/send/BSc/1/A").body_text();
    assert!(body.contains("name=\"teacherId\"\r\n\r\nt2"));
    assert!(body.contains("name=\"studentId\"\r\n\r\ns1"));

    sidecar.shutdown();
}
