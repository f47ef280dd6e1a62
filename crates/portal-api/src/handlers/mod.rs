pub mod admin;
pub mod auth;
pub mod checklist;
pub mod documents;
pub mod files;
pub mod health;
pub mod maintenance;
