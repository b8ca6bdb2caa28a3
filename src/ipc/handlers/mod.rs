pub mod activities;
pub mod attendance;
pub mod auth;
pub mod certificates;
pub mod core;
pub mod hierarchy;
pub mod messaging;
pub mod navigation;
pub mod scrutiny;
pub mod secondary_admins;
pub mod student_portal;
pub mod students;
