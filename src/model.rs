//! Backend payloads the controller needs to look inside. Everything else is
//! passed through to the host as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub fn upload_url(file: Option<&str>) -> Option<String> {
    file.filter(|f| !f.is_empty()).map(|f| format!("/uploads/{f}"))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Whoami {
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
}

/// `/student_data`: the logged-in student and the section they belong to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentData {
    #[serde(default)]
    pub student: Value,
    #[serde(default)]
    pub activities: Vec<Value>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

impl StudentData {
    pub fn student_id(&self) -> Option<&str> {
        self.student.get("id").and_then(Value::as_str)
    }

    pub fn photo(&self) -> Option<&str> {
        self.student.get("photo").and_then(Value::as_str)
    }
}

/// Entry of `/student_teachers`. The main account is listed with user id `faculty`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupMember {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

/// Display name of a group message sender.
pub fn group_sender_name(kind: &str, id: &str, members: &[GroupMember]) -> String {
    if kind == "teacher" && id == "faculty" {
        return "Main Admin".to_string();
    }
    members
        .iter()
        .find(|m| m.kind == kind && m.id == id)
        .and_then(|m| m.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{kind}:{id}"))
}
