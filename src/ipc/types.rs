use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::ApiClient;
use crate::calendar::{AttendanceView, DisputeDraft};
use crate::model::GroupMember;
use crate::nav::{self, Event, HistoryOp, NavError, Transition, View};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Faculty,
    Secondary,
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "type")]
    pub role: Role,
    pub user_id: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Faculty | Role::Secondary)
    }

    pub fn is_main_faculty(&self) -> bool {
        self.role == Role::Faculty
    }

    /// Identity used as `teacherId` in message threads.
    pub fn teacher_id(&self) -> String {
        match self.role {
            Role::Faculty => "faculty".to_string(),
            _ => self.user_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Teacher,
    Student,
    Group,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub mode: ChatMode,
    pub course: String,
    pub year: String,
    pub section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub peer_name: String,
    pub peer_photo: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_members: Vec<GroupMember>,
}

impl ChatContext {
    pub fn meta(&self) -> String {
        format!("{} > {} > {}", self.course, self.year, self.section)
    }
}

/// Everything the controller knows about the session. Owned by `main` and
/// lent to each handler.
pub struct AppState {
    pub api: ApiClient,
    pub view: View,
    pub user: Option<User>,
    pub chat: Option<ChatContext>,
    pub attendance: Option<AttendanceView>,
    pub dispute: Option<DisputeDraft>,
    /// History operations produced while handling the current request.
    pub history: Vec<HistoryOp>,
}

impl AppState {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            view: View::landing(),
            user: None,
            chat: None,
            attendance: None,
            dispute: None,
            history: Vec::new(),
        }
    }

    pub fn apply(&mut self, t: Transition) {
        self.view = t.view;
        if let Some(op) = t.history {
            self.history.push(op);
        }
    }

    pub fn fire(&mut self, event: Event) -> Result<(), NavError> {
        let t = nav::transition(&self.view, event)?;
        self.apply(t);
        Ok(())
    }

    /// Drops the user and every open panel.
    pub fn clear_session(&mut self) {
        self.user = None;
        self.chat = None;
        self.attendance = None;
        self.dispute = None;
    }

    /// Forced logout after the backend rejected the session.
    pub fn reset_session(&mut self) {
        self.clear_session();
        self.apply(nav::logout());
    }

    pub fn take_history(&mut self) -> Vec<HistoryOp> {
        std::mem::take(&mut self.history)
    }

    pub fn view_json(&self) -> Value {
        let main = self.user.as_ref().is_some_and(User::is_main_faculty);
        json!({
            "page": self.view.page,
            "step": self.view.step,
            "tab": self.view.tab,
            "title": self.view.title(),
            "selection": self.view.selection,
            "containers": self.view.containers(),
            "user": self.user,
            "permissions": {
                "isAdmin": self.user.as_ref().is_some_and(User::is_admin),
                "manageSecondaryAdmins": main,
                "manageGroups": main,
                "deleteSubjects": main,
            },
        })
    }
}
