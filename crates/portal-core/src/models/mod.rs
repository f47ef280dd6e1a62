//! Data models for the portal
//!
//! Each sub-module covers one feature area; everything is re-exported here.

mod auth;
mod checklist;
mod company;
mod document;
mod document_type;

pub use auth::*;
pub use checklist::*;
pub use company::*;
pub use document::*;
pub use document_type::*;
