//! Groups and chat. Opening a thread or group stores a [`ChatContext`];
//! loading and sending act on it.

use serde_json::{json, Value};
use tracing::info;

use crate::api::{ApiError, ApiRequest, Part};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    optional_str, require_admin, require_main_faculty, require_student, require_user,
    required_str, section_scope, str_list, str_or_empty,
};
use crate::ipc::router::HandlerResult;
use crate::ipc::types::{AppState, ChatContext, ChatMode, Request};
use crate::model::{group_sender_name, upload_url, Group, StudentRef, Teacher};

use super::student_portal::student_data;

fn groups(state: &mut AppState) -> Result<Value, HandlerErr> {
    let (c, y, s) = section_scope(state)?;
    Ok(state
        .api
        .call(ApiRequest::get(["groups", c.as_str(), y.as_str(), s.as_str()]))?)
}

fn handle_groups_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_admin(state)?;
    Ok(json!({ "groups": groups(state)? }))
}

fn handle_groups_auto(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    let result = state.api.call(ApiRequest::post([
        "groups",
        c.as_str(),
        y.as_str(),
        s.as_str(),
        "auto",
    ]))?;
    Ok(json!({ "result": result, "groups": groups(state)? }))
}

fn handle_groups_create(state: &mut AppState, req: &Request) -> HandlerResult {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    let members = str_list(&req.params, "members");
    if members.is_empty() {
        return Err(HandlerErr::bad_params("select at least one member"));
    }
    let mut parts = vec![
        Part::text("name", str_or_empty(&req.params, "name")),
        Part::text("bio", str_or_empty(&req.params, "bio")),
        Part::text("members", Value::from(members).to_string()),
    ];
    if let Some(photo) = optional_str(&req.params, "photoPath") {
        parts.push(Part::file("groupPhoto", photo));
    }
    let result = state.api.call(
        ApiRequest::post(["groups", c.as_str(), y.as_str(), s.as_str(), "custom"])
            .multipart(parts),
    )?;
    Ok(json!({ "result": result, "groups": groups(state)? }))
}

fn handle_groups_update(state: &mut AppState, req: &Request) -> HandlerResult {
    require_main_faculty(state)?;
    let (c, y, s) = section_scope(state)?;
    let id = required_str(&req.params, "id")?;
    let who = optional_str(&req.params, "whoCanChat").unwrap_or_else(|| "all".to_string());
    let permissions = json!({
        "whoCanChat": who,
        "allowedMemberIds": str_list(&req.params, "allowedMemberIds"),
    });
    let mut parts = vec![
        Part::text("name", str_or_empty(&req.params, "name")),
        Part::text("bio", str_or_empty(&req.params, "bio")),
        Part::text("permissions", permissions.to_string()),
    ];
    if let Some(photo) = optional_str(&req.params, "photoPath") {
        parts.push(Part::file("groupPhoto", photo));
    }
    let result = state.api.call(
        ApiRequest::put(["groups", c.as_str(), y.as_str(), s.as_str(), id.as_str()])
            .multipart(parts),
    )?;
    Ok(json!({ "result": result, "groups": groups(state)? }))
}

fn handle_student_groups(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_student(state)?;
    let groups = state.api.call(ApiRequest::get(["student_groups"]))?;
    Ok(json!({ "groups": groups }))
}

/// Teacher opens a thread with a student of the open section.
fn handle_open_student_thread(state: &mut AppState, req: &Request) -> HandlerResult {
    let teacher_id = require_admin(state)?.teacher_id();
    let (c, y, s) = section_scope(state)?;
    let student_id = required_str(&req.params, "studentId")?;
    let students: Vec<StudentRef> = state.api.call_as(ApiRequest::get([
        "get_students",
        c.as_str(),
        y.as_str(),
        s.as_str(),
    ]))?;
    let student = students
        .into_iter()
        .find(|st| st.id == student_id)
        .ok_or_else(|| HandlerErr::bad_params("Student not found"))?;
    state.chat = Some(ChatContext {
        mode: ChatMode::Teacher,
        course: c,
        year: y,
        section: s,
        student_id: Some(student.id),
        teacher_id: Some(teacher_id),
        group_id: None,
        peer_name: student.name,
        peer_photo: upload_url(student.photo.as_deref()),
        group_members: Vec::new(),
    });
    load_chat(state)
}

/// Student opens a thread with one of their section's teachers.
fn handle_open_teacher_thread(state: &mut AppState, req: &Request) -> HandlerResult {
    require_student(state)?;
    let teacher_id = required_str(&req.params, "teacherId")?;
    let teachers: Vec<Teacher> = state.api.call_as(ApiRequest::get(["student_teachers"]))?;
    let teacher = teachers
        .into_iter()
        .find(|t| t.user_id.as_deref() == Some(teacher_id.as_str()))
        .ok_or_else(|| HandlerErr::bad_params("Teacher not found"))?;
    let data = student_data(state)?;
    let (Some(student_id), Some(c), Some(y), Some(s)) = (
        data.student_id().map(str::to_string),
        data.course.clone(),
        data.year.clone(),
        data.section.clone(),
    ) else {
        return Err(HandlerErr::no_selection("Student context not found"));
    };
    state.chat = Some(ChatContext {
        mode: ChatMode::Student,
        course: c,
        year: y,
        section: s,
        student_id: Some(student_id),
        teacher_id: Some(teacher_id),
        group_id: None,
        peer_name: teacher.name,
        peer_photo: upload_url(teacher.photo.as_deref()),
        group_members: Vec::new(),
    });
    load_chat(state)
}

fn handle_open_group(state: &mut AppState, req: &Request) -> HandlerResult {
    let user = require_user(state)?.clone();
    let group_id = required_str(&req.params, "groupId")?;
    let (list, scope) = if user.is_admin() {
        let scope = section_scope(state)?;
        let list: Vec<Group> = serde_json::from_value(groups(state)?)
            .map_err(|e| HandlerErr::from(ApiError::Parse(e)))?;
        (list, scope)
    } else {
        let list: Vec<Group> = state.api.call_as(ApiRequest::get(["student_groups"]))?;
        let data = student_data(state)?;
        let (Some(c), Some(y), Some(s)) = (data.course, data.year, data.section) else {
            return Err(HandlerErr::no_selection("Student context not found"));
        };
        (list, (c, y, s))
    };
    let group = list
        .into_iter()
        .find(|g| g.id == group_id)
        .ok_or_else(|| HandlerErr::bad_params("Group not found"))?;
    let (c, y, s) = scope;
    state.chat = Some(ChatContext {
        mode: ChatMode::Group,
        course: c,
        year: y,
        section: s,
        student_id: None,
        teacher_id: None,
        group_id: Some(group.id),
        peer_name: group.name,
        peer_photo: upload_url(group.photo.as_deref()),
        group_members: group.members,
    });
    load_chat(state)
}

fn chat(state: &AppState) -> Result<&ChatContext, HandlerErr> {
    state
        .chat
        .as_ref()
        .ok_or_else(|| HandlerErr::no_selection("no chat open"))
}

/// Adds `mine` (and `senderName` in groups) so the host can lay out bubbles.
fn annotate(state: &AppState, ctx: &ChatContext, mut msg: Value) -> Value {
    let admin = state.user.as_ref().is_some_and(|u| u.is_admin());
    let Some(obj) = msg.as_object_mut() else {
        return msg;
    };
    match ctx.mode {
        ChatMode::Group => {
            let from = obj.get("from");
            let kind = from
                .and_then(|f| f.get("type"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let id = from
                .and_then(|f| f.get("id"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let mine = if admin { kind == "teacher" } else { kind == "student" };
            let name = if kind.is_empty() {
                String::new()
            } else {
                group_sender_name(&kind, &id, &ctx.group_members)
            };
            obj.insert("mine".into(), json!(mine));
            obj.insert("senderName".into(), json!(name));
        }
        ChatMode::Teacher | ChatMode::Student => {
            let from = obj.get("from").and_then(Value::as_str).unwrap_or_default();
            let mine = matches!(
                (ctx.mode, from),
                (ChatMode::Student, "student") | (ChatMode::Teacher, "teacher")
            );
            obj.insert("mine".into(), json!(mine));
        }
    }
    msg
}

fn load_chat(state: &mut AppState) -> HandlerResult {
    let ctx = chat(state)?.clone();
    let call = match ctx.mode {
        ChatMode::Group => ApiRequest::get([
            "groups",
            "messages",
            ctx.course.as_str(),
            ctx.year.as_str(),
            ctx.section.as_str(),
            ctx.group_id.as_deref().unwrap_or_default(),
        ]),
        ChatMode::Teacher | ChatMode::Student => ApiRequest::get([
            "messages",
            "thread",
            ctx.course.as_str(),
            ctx.year.as_str(),
            ctx.section.as_str(),
        ])
        .query("studentId", ctx.student_id.clone().unwrap_or_default())
        .query("teacherId", ctx.teacher_id.clone().unwrap_or_default()),
    };
    let raw = state.api.call(call)?;
    let messages: Vec<Value> = match raw {
        Value::Array(items) => items
            .into_iter()
            .map(|m| annotate(state, &ctx, m))
            .collect(),
        _ => Vec::new(),
    };
    Ok(json!({
        "chat": ctx,
        "meta": ctx.meta(),
        "messages": messages,
    }))
}

fn handle_send(state: &mut AppState, req: &Request) -> HandlerResult {
    let ctx = chat(state)?.clone();
    let text = str_or_empty(&req.params, "text");
    let files = str_list(&req.params, "files");
    if text.is_empty() && files.is_empty() {
        return Err(HandlerErr::bad_params("message is empty"));
    }

    let mut parts = Vec::with_capacity(files.len() + 3);
    let segments: Vec<&str> = match ctx.mode {
        ChatMode::Group => vec![
            "groups",
            "messages",
            ctx.course.as_str(),
            ctx.year.as_str(),
            ctx.section.as_str(),
            ctx.group_id.as_deref().unwrap_or_default(),
        ],
        ChatMode::Teacher | ChatMode::Student => {
            parts.push(Part::text(
                "studentId",
                ctx.student_id.clone().unwrap_or_default(),
            ));
            parts.push(Part::text(
                "teacherId",
                ctx.teacher_id.clone().unwrap_or_default(),
            ));
            vec![
                "messages",
                "send",
                ctx.course.as_str(),
                ctx.year.as_str(),
                ctx.section.as_str(),
            ]
        }
    };
    parts.push(Part::text("text", text));
    parts.extend(files.into_iter().map(|f| Part::file("files", f)));

    let result = state
        .api
        .call(ApiRequest::post(segments).multipart(parts))?;
    info!(mode = ?ctx.mode, "message sent");
    let message = result
        .get("message")
        .cloned()
        .map(|m| annotate(state, &ctx, m));
    Ok(json!({ "result": result, "message": message }))
}

fn handle_close(state: &mut AppState, _req: &Request) -> HandlerResult {
    state.chat = None;
    Ok(Value::Null)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<HandlerResult> {
    match req.method.as_str() {
        "groups.list" => Some(handle_groups_list(state, req)),
        "groups.auto" => Some(handle_groups_auto(state, req)),
        "groups.createCustom" => Some(handle_groups_create(state, req)),
        "groups.update" => Some(handle_groups_update(state, req)),
        "studentGroups.list" => Some(handle_student_groups(state, req)),
        "chat.openStudentThread" => Some(handle_open_student_thread(state, req)),
        "chat.openTeacherThread" => Some(handle_open_teacher_thread(state, req)),
        "chat.openGroup" => Some(handle_open_group(state, req)),
        "chat.load" => Some(load_chat(state)),
        "chat.send" => Some(handle_send(state, req)),
        "chat.close" => Some(handle_close(state, req)),
        _ => None,
    }
}
